pub mod agent;
pub mod match_loop;

pub use agent::Agent;
pub use match_loop::{play_episode, run_games, run_tournament, Outcome, Tally, STEP_LIMIT};
