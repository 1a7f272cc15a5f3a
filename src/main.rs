use std::path::PathBuf;

use clap::{Parser, Subcommand};
use flexi_logger::{Duplicate, FileSpec, Logger};

use quarto_rl::checkpoint::{RunDir, RunMetadata};
use quarto_rl::env::{Environment, OnePlayerWrapper, QuartoEnv};
use quarto_rl::neural::{ModelConfig, ModelManager};
use quarto_rl::players::{NeuralPolicy, RandomPlayer};
use quarto_rl::tournament::{run_tournament, Agent};
use quarto_rl::training::{train_and_evaluate, SessionConfig};

const SEED: u64 = 721;

#[derive(Parser, Debug)]
#[command(name = "quarto_rl", about = "Train and pit Quarto RL agents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train an agent against a random opponent
    Train {
        /// Parent directory for timestamped run outputs
        output_folder: PathBuf,

        /// Resume from a previously saved model
        #[arg(short = 'l', long = "load")]
        load_path: Option<PathBuf>,

        /// Total environment steps to train for
        #[arg(long, default_value_t = 100_000)]
        timesteps: u64,

        /// Supply legal-action masks to the policy
        #[arg(long, default_value_t = false)]
        mask: bool,
    },
    /// Play two trained models head to head and print the tally
    Tournament {
        /// First model checkpoint
        #[arg(value_parser = model_path)]
        model_1_path: PathBuf,

        /// Second model checkpoint
        #[arg(value_parser = model_path)]
        model_2_path: PathBuf,

        /// Number of games to play
        #[arg(long, default_value_t = 100)]
        num_games: usize,

        /// Supply legal-action masks to model 1
        #[arg(long, default_value_t = false)]
        mask_1: bool,

        /// Supply legal-action masks to model 2
        #[arg(long, default_value_t = false)]
        mask_2: bool,
    },
}

/// Checkpoint paths are validated before the program body runs: they
/// must exist, be files, and are resolved to absolute paths.
fn model_path(raw: &str) -> std::result::Result<PathBuf, String> {
    let path = PathBuf::from(raw);
    if !path.exists() {
        return Err(format!("path '{raw}' does not exist"));
    }
    if !path.is_file() {
        return Err(format!("path '{raw}' is not a file"));
    }
    path.canonicalize()
        .map_err(|e| format!("cannot resolve '{raw}': {e}"))
}

fn train(
    output_folder: PathBuf,
    load_path: Option<PathBuf>,
    timesteps: u64,
    use_masking: bool,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let run_dir = RunDir::create(&output_folder)?;
    Logger::try_with_env_or_str("info")?
        .log_to_file(FileSpec::default().directory(run_dir.path()))
        .duplicate_to_stderr(Duplicate::Info)
        .format(flexi_logger::opt_format)
        .start()?;

    log::info!("training run directory: {}", run_dir.path().display());

    let mut env = OnePlayerWrapper::new(QuartoEnv::new(), RandomPlayer::new());
    env.seed(SEED);
    let mut eval_env = OnePlayerWrapper::new(QuartoEnv::new(), RandomPlayer::new());
    eval_env.seed(SEED);

    // The CLI masking flag overrides whatever a resumed checkpoint stored.
    let mut manager = match &load_path {
        Some(path) => ModelManager::load(path, Some(use_masking))?,
        None => ModelManager::with_config(ModelConfig {
            use_masking,
            ..Default::default()
        })?,
    };

    let config = SessionConfig {
        total_timesteps: timesteps,
        ..Default::default()
    };
    let report = train_and_evaluate(&mut manager, &mut env, &mut eval_env, &run_dir, &config)?;
    log::info!(
        "training finished: {} steps, {} episodes, {} updates",
        report.timesteps,
        report.episodes,
        report.updates
    );

    manager.save(run_dir.path().join("final_model.safetensors"))?;
    run_dir.write_metadata(&RunMetadata::new(SEED, timesteps, use_masking, load_path))?;
    env.close();
    eval_env.close();

    let link = run_dir.repoint_latest()?;
    log::info!("latest -> {}", link.display());
    Ok(())
}

fn tournament(
    model_1_path: PathBuf,
    model_2_path: PathBuf,
    num_games: usize,
    mask_1: bool,
    mask_2: bool,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    Logger::try_with_env_or_str("info")?
        .format(flexi_logger::colored_default_format)
        .start()?;

    let mut agents = [
        Agent::new(
            "model_1",
            Box::new(NeuralPolicy::load(&model_1_path, None)?),
            mask_1,
        ),
        Agent::new(
            "model_2",
            Box::new(NeuralPolicy::load(&model_2_path, None)?),
            mask_2,
        ),
    ];

    let mut env = QuartoEnv::new();
    let tally = run_tournament(&mut env, &mut agents, num_games);
    env.close();

    for (label, count) in tally.iter() {
        println!("{label}: {count}");
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Train {
            output_folder,
            load_path,
            timesteps,
            mask,
        } => train(output_folder, load_path, timesteps, mask),
        Command::Tournament {
            model_1_path,
            model_2_path,
            num_games,
            mask_1,
            mask_2,
        } => tournament(model_1_path, model_2_path, num_games, mask_1, mask_2),
    };

    if let Err(e) = result {
        log::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
