//! Model I/O utilities using safetensors format
//!
//! Portable weight serialization that survives libtorch upgrades, with
//! run settings (masking flag, layer dimensions) embedded in the
//! safetensors metadata map.

use safetensors::tensor::{Dtype, SafeTensors, TensorView};
use safetensors::serialize_to_file;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tch::{nn, Kind, Tensor};

use crate::{QuartoRlError, Result};

fn io_error(context: &str, err: impl std::fmt::Display) -> QuartoRlError {
    QuartoRlError::Model(format!("{context}: {err}"))
}

/// Save a VarStore to a safetensors file, with string metadata attached.
pub fn save_varstore(
    vs: &nn::VarStore,
    path: impl AsRef<Path>,
    metadata: HashMap<String, String>,
) -> Result<()> {
    let mut tensors: HashMap<String, (Vec<usize>, Vec<u8>)> = HashMap::new();

    for (name, tensor) in vs.variables() {
        let size: Vec<usize> = tensor.size().iter().map(|&x| x as usize).collect();
        let data = tensor_to_bytes(&tensor)?;
        tensors.insert(name, (size, data));
    }

    let tensor_views: HashMap<String, TensorView<'_>> = tensors
        .iter()
        .map(|(name, (shape, data))| {
            let view = TensorView::new(Dtype::F32, shape.clone(), data)
                .map_err(|e| io_error("building tensor view", format!("{e:?}")))?;
            Ok((name.clone(), view))
        })
        .collect::<Result<_>>()?;

    serialize_to_file(tensor_views, &Some(metadata), path.as_ref())
        .map_err(|e| io_error("serializing safetensors", e))?;

    Ok(())
}

/// Read only the metadata map of a safetensors file.
pub fn read_metadata(path: impl AsRef<Path>) -> Result<HashMap<String, String>> {
    let mut file = File::open(path.as_ref())?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    let (_, header) = SafeTensors::read_metadata(&buffer)
        .map_err(|e| io_error("reading safetensors header", e))?;
    Ok(header.metadata().clone().unwrap_or_default())
}

/// Load a VarStore from a safetensors file, returning the stored metadata.
pub fn load_varstore(
    vs: &mut nn::VarStore,
    path: impl AsRef<Path>,
) -> Result<HashMap<String, String>> {
    let mut file = File::open(path.as_ref())?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;

    let (_, header) = SafeTensors::read_metadata(&buffer)
        .map_err(|e| io_error("reading safetensors header", e))?;
    let metadata = header.metadata().clone().unwrap_or_default();

    let tensors =
        SafeTensors::deserialize(&buffer).map_err(|e| io_error("parsing safetensors", e))?;

    for (name, mut var) in vs.variables() {
        let tensor_view = tensors
            .tensor(&name)
            .map_err(|e| io_error(&format!("tensor '{name}' missing from checkpoint"), e))?;
        let loaded = tensor_view_to_tensor(&tensor_view)?;
        tch::no_grad(|| {
            var.copy_(&loaded);
        });
    }

    Ok(metadata)
}

fn tensor_to_bytes(tensor: &Tensor) -> Result<Vec<u8>> {
    let tensor = tensor
        .to_device(tch::Device::Cpu)
        .to_kind(Kind::Float)
        .flatten(0, -1)
        .contiguous();
    let data: Vec<f32> =
        Vec::<f32>::try_from(&tensor).map_err(|e| io_error("extracting tensor data", e))?;
    Ok(data.iter().flat_map(|x| x.to_le_bytes()).collect())
}

fn tensor_view_to_tensor(view: &TensorView<'_>) -> Result<Tensor> {
    if view.dtype() != Dtype::F32 {
        return Err(QuartoRlError::Model(format!(
            "unsupported tensor dtype {:?}",
            view.dtype()
        )));
    }
    let shape: Vec<i64> = view.shape().iter().map(|&x| x as i64).collect();
    let floats: Vec<f32> = view
        .data()
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok(Tensor::from_slice(&floats).reshape(&shape))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::Device;

    #[test]
    fn varstore_round_trips_weights_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.safetensors");

        let vs_out = nn::VarStore::new(Device::Cpu);
        let _layer = nn::linear(vs_out.root() / "l1", 4, 2, Default::default());
        let mut metadata = HashMap::new();
        metadata.insert("use_masking".to_string(), "true".to_string());
        save_varstore(&vs_out, &path, metadata).unwrap();

        let mut vs_in = nn::VarStore::new(Device::Cpu);
        let _layer = nn::linear(vs_in.root() / "l1", 4, 2, Default::default());
        let loaded = load_varstore(&mut vs_in, &path).unwrap();
        assert_eq!(loaded.get("use_masking").map(String::as_str), Some("true"));

        for (name, tensor) in vs_out.variables() {
            let restored = &vs_in.variables()[&name];
            assert_eq!(tensor.eq_tensor(restored).all().int64_value(&[]), 1);
        }
    }

    #[test]
    fn loading_into_a_mismatched_varstore_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.safetensors");

        let vs_out = nn::VarStore::new(Device::Cpu);
        let _layer = nn::linear(vs_out.root() / "l1", 4, 2, Default::default());
        save_varstore(&vs_out, &path, HashMap::new()).unwrap();

        let mut vs_in = nn::VarStore::new(Device::Cpu);
        let _layer = nn::linear(vs_in.root() / "other", 4, 2, Default::default());
        assert!(load_varstore(&mut vs_in, &path).is_err());
    }
}
