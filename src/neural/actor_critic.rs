use tch::{nn, Kind, Tensor};

use crate::env::ActionMask;

/// MLP actor-critic with separate policy and value towers
/// (net_arch pi=[16, 16], vf=[16, 16]).
pub struct ActorCritic {
    pi_1: nn::Linear,
    pi_2: nn::Linear,
    pi_out: nn::Linear,
    vf_1: nn::Linear,
    vf_2: nn::Linear,
    vf_out: nn::Linear,
}

pub const HIDDEN_DIM: i64 = 16;

impl ActorCritic {
    pub fn new(vs: &nn::VarStore, input_dim: i64, action_dim: i64) -> Self {
        let root = vs.root();
        ActorCritic {
            pi_1: nn::linear(&root / "pi_1", input_dim, HIDDEN_DIM, Default::default()),
            pi_2: nn::linear(&root / "pi_2", HIDDEN_DIM, HIDDEN_DIM, Default::default()),
            pi_out: nn::linear(&root / "pi_out", HIDDEN_DIM, action_dim, Default::default()),
            vf_1: nn::linear(&root / "vf_1", input_dim, HIDDEN_DIM, Default::default()),
            vf_2: nn::linear(&root / "vf_2", HIDDEN_DIM, HIDDEN_DIM, Default::default()),
            vf_out: nn::linear(&root / "vf_out", HIDDEN_DIM, 1, Default::default()),
        }
    }

    /// Unnormalized action preferences, shape [batch, action_dim].
    pub fn policy_logits(&self, input: &Tensor) -> Tensor {
        input
            .apply(&self.pi_1)
            .relu()
            .apply(&self.pi_2)
            .relu()
            .apply(&self.pi_out)
    }

    /// State-value estimates, shape [batch].
    pub fn value(&self, input: &Tensor) -> Tensor {
        input
            .apply(&self.vf_1)
            .relu()
            .apply(&self.vf_2)
            .relu()
            .apply(&self.vf_out)
            .squeeze_dim(-1)
    }
}

/// Drives illegal-action logits to an effective -inf so they carry zero
/// probability mass after softmax.
pub fn apply_action_mask(logits: &Tensor, mask: &ActionMask) -> Tensor {
    let flags: Vec<f32> = mask.iter().map(|&m| if m { 0.0 } else { 1.0 }).collect();
    let blocked = Tensor::from_slice(&flags).view([1, flags.len() as i64]);
    logits - blocked * 1e9
}

/// Log-probabilities of the given actions under the given logits,
/// plus the distribution entropy (both shape [batch]).
pub fn log_prob_and_entropy(logits: &Tensor, actions: &Tensor) -> (Tensor, Tensor) {
    let log_probs = logits.log_softmax(-1, Kind::Float);
    let probs = log_probs.exp();
    let taken = log_probs
        .gather(1, &actions.unsqueeze(-1), false)
        .squeeze_dim(-1);
    let entropy = -(probs * log_probs).sum_dim_intlist(&[-1i64][..], false, Kind::Float);
    (taken, entropy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::Device;

    #[test]
    fn masked_logits_zero_out_illegal_probability() {
        let logits = Tensor::zeros([1, 4], (Kind::Float, Device::Cpu));
        let mask = vec![true, false, true, false];
        let probs = apply_action_mask(&logits, &mask).softmax(-1, Kind::Float);
        let probs: Vec<f32> = Vec::<f32>::try_from(&probs.view([-1])).unwrap();
        assert!(probs[1] < 1e-6 && probs[3] < 1e-6);
        assert!((probs[0] - 0.5).abs() < 1e-4);
    }

    #[test]
    fn towers_produce_expected_shapes() {
        let vs = nn::VarStore::new(Device::Cpu);
        let net = ActorCritic::new(&vs, 101, 256);
        let input = Tensor::zeros([3, 101], (Kind::Float, Device::Cpu));
        assert_eq!(net.policy_logits(&input).size(), vec![3, 256]);
        assert_eq!(net.value(&input).size(), vec![3]);
    }
}
