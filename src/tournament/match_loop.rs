use rand::seq::SliceRandom;

use crate::env::Environment;
use crate::tournament::agent::Agent;

/// Completed steps (both seats moving) before an episode is forcibly
/// classified as a timeout.
pub const STEP_LIMIT: usize = 20;

pub const TIE_LABEL: &str = "tie";
pub const TIMEOUT_LABEL: &str = "timeout";

/// How one episode ended, classified at the moment `done` fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Win(String),
    Tie,
    Timeout,
}

impl Outcome {
    pub fn label(&self) -> &str {
        match self {
            Outcome::Win(name) => name,
            Outcome::Tie => TIE_LABEL,
            Outcome::Timeout => TIMEOUT_LABEL,
        }
    }
}

/// Per-label outcome counts for a tournament run. Labels keep their
/// insertion order so the printed tally lists agents first, then the
/// tie and timeout buckets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    entries: Vec<(String, u64)>,
}

impl Tally {
    /// Pre-seeds every label with zero so absent outcomes still print.
    pub fn for_agents(agents: &[Agent; 2]) -> Self {
        let entries = agents
            .iter()
            .map(|a| (a.name.clone(), 0))
            .chain([(TIE_LABEL.to_string(), 0), (TIMEOUT_LABEL.to_string(), 0)])
            .collect();
        Tally { entries }
    }

    pub fn record(&mut self, label: &str) {
        match self.entries.iter_mut().find(|(name, _)| name == label) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((label.to_string(), 1)),
        }
    }

    pub fn count(&self, label: &str) -> u64 {
        self.entries
            .iter()
            .find(|(name, _)| name == label)
            .map_or(0, |(_, count)| *count)
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(name, count)| (name.as_str(), *count))
    }
}

/// Plays one episode to completion or to the step cap.
///
/// The two agents move in strict round-robin order inside each step;
/// the inner iteration exits on the first terminal half-move, so a game
/// that ends on the first seat's move never lets the second seat play.
/// Reaching the step cap overrides any winner computed on the capped
/// step.
pub fn play_episode<E: Environment>(env: &mut E, agents: &mut [Agent; 2]) -> Outcome {
    let mut obs = env.reset();
    let mut done = false;
    let mut steps = 0usize;
    let mut outcome = None;

    while !done && steps < STEP_LIMIT {
        for index in 0..agents.len() {
            let masks = if agents[index].mask {
                Some(env.action_masks())
            } else {
                None
            };
            let action = agents[index].policy.predict(&obs, masks.as_ref());
            let step = env.step(action);
            obs = step.observation;
            done = step.done;

            if done {
                outcome = Some(if step.info.invalid {
                    // An illegal move forfeits the game to the other seat.
                    Outcome::Win(agents[1 - index].name.clone())
                } else if step.info.draw {
                    Outcome::Tie
                } else {
                    Outcome::Win(agents[index].name.clone())
                });
                break;
            }
        }
        steps += 1;
    }

    if steps >= STEP_LIMIT {
        Outcome::Timeout
    } else {
        outcome.expect("episode left the loop without a terminal step")
    }
}

/// Plays `num_games` episodes with the seats as given, accumulating the
/// tally. Counts always sum to `num_games`.
pub fn run_games<E: Environment>(env: &mut E, agents: &mut [Agent; 2], num_games: usize) -> Tally {
    let mut tally = Tally::for_agents(agents);
    for game in 0..num_games {
        let outcome = play_episode(env, agents);
        log::debug!("game {}/{}: {}", game + 1, num_games, outcome.label());
        tally.record(outcome.label());
    }
    tally
}

/// Full tournament run: randomize the seat order once, then play every
/// game with that order.
pub fn run_tournament<E: Environment>(
    env: &mut E,
    agents: &mut [Agent; 2],
    num_games: usize,
) -> Tally {
    agents.shuffle(&mut rand::rng());
    run_games(env, agents, num_games)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Action, ActionMask, Observation, Step, StepInfo};
    use crate::players::policy::Policy;

    /// Policy stub that always plays the same flat action.
    struct Always(usize);

    impl Policy for Always {
        fn predict(&mut self, _obs: &Observation, _masks: Option<&ActionMask>) -> Action {
            Action(self.0)
        }
    }

    fn blank_observation() -> Observation {
        Observation {
            board: [-1; 16],
            hand: 0,
            pool: [true; 16],
        }
    }

    /// Scripted environment: runs through a fixed list of step results,
    /// then repeats the last one.
    struct Scripted {
        script: Vec<(f32, bool, StepInfo)>,
        cursor: usize,
    }

    impl Scripted {
        fn new(script: Vec<(f32, bool, StepInfo)>) -> Self {
            Scripted { script, cursor: 0 }
        }
    }

    impl crate::env::Environment for Scripted {
        fn reset(&mut self) -> Observation {
            self.cursor = 0;
            blank_observation()
        }

        fn step(&mut self, _action: Action) -> Step {
            let index = self.cursor.min(self.script.len() - 1);
            self.cursor += 1;
            let (reward, done, info) = self.script[index];
            Step {
                observation: blank_observation(),
                reward,
                done,
                info,
            }
        }

        fn action_masks(&self) -> ActionMask {
            vec![true; Action::SPACE]
        }

        fn seed(&mut self, _seed: u64) {}
    }

    fn stub_agents() -> [Agent; 2] {
        [
            Agent::new("model_1", Box::new(Always(0)), false),
            Agent::new("model_2", Box::new(Always(1)), false),
        ]
    }

    const INVALID: StepInfo = StepInfo {
        invalid: true,
        draw: false,
    };
    const DRAW: StepInfo = StepInfo {
        invalid: false,
        draw: true,
    };
    const WIN: StepInfo = StepInfo {
        invalid: false,
        draw: false,
    };
    const ONGOING: StepInfo = StepInfo {
        invalid: false,
        draw: false,
    };

    #[test]
    fn invalid_first_move_credits_the_other_agent() {
        let mut env = Scripted::new(vec![(-1.0, true, INVALID)]);
        let mut agents = stub_agents();
        let tally = run_games(&mut env, &mut agents, 10);
        assert_eq!(tally.count("model_2"), 10);
        assert_eq!(tally.count("model_1"), 0);
        assert_eq!(tally.total(), 10);
    }

    #[test]
    fn invalid_second_move_credits_the_first_agent() {
        let mut env = Scripted::new(vec![(0.0, false, ONGOING), (-1.0, true, INVALID)]);
        let mut agents = stub_agents();
        let tally = run_games(&mut env, &mut agents, 3);
        assert_eq!(tally.count("model_1"), 3);
    }

    #[test]
    fn draw_after_both_agents_move_counts_as_tie() {
        let mut env = Scripted::new(vec![(0.0, false, ONGOING), (0.0, true, DRAW)]);
        let mut agents = stub_agents();
        let tally = run_games(&mut env, &mut agents, 5);
        assert_eq!(tally.count(TIE_LABEL), 5);
        assert_eq!(tally.total(), 5);
    }

    #[test]
    fn natural_terminal_credits_the_agent_who_moved() {
        let mut env = Scripted::new(vec![(0.0, false, ONGOING), (1.0, true, WIN)]);
        let mut agents = stub_agents();
        let tally = run_games(&mut env, &mut agents, 4);
        assert_eq!(tally.count("model_2"), 4);
    }

    #[test]
    fn episode_ending_on_first_half_move_skips_the_second_seat() {
        struct Counting {
            calls: std::rc::Rc<std::cell::Cell<usize>>,
        }
        impl Policy for Counting {
            fn predict(&mut self, _obs: &Observation, _masks: Option<&ActionMask>) -> Action {
                self.calls.set(self.calls.get() + 1);
                Action(0)
            }
        }
        let calls = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut env = Scripted::new(vec![(1.0, true, WIN)]);
        let mut agents = [
            Agent::new("model_1", Box::new(Always(0)), false),
            Agent::new(
                "model_2",
                Box::new(Counting {
                    calls: calls.clone(),
                }),
                false,
            ),
        ];
        let outcome = play_episode(&mut env, &mut agents);
        assert_eq!(outcome, Outcome::Win("model_1".to_string()));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn never_terminal_times_out_at_the_cap() {
        let mut env = Scripted::new(vec![(0.0, false, ONGOING)]);
        let mut agents = stub_agents();
        let outcome = play_episode(&mut env, &mut agents);
        assert_eq!(outcome, Outcome::Timeout);
    }

    #[test]
    fn terminal_on_the_capped_step_is_still_a_timeout() {
        // 39 ongoing half-moves, then a win on the final half-move of
        // step 20: the cap override wins.
        let mut script = vec![(0.0, false, ONGOING); 39];
        script.push((1.0, true, WIN));
        let mut env = Scripted::new(script);
        let mut agents = stub_agents();
        let outcome = play_episode(&mut env, &mut agents);
        assert_eq!(outcome, Outcome::Timeout);
    }

    #[test]
    fn terminal_just_before_the_cap_is_a_win() {
        // Win on the first half-move of step 19.
        let mut script = vec![(0.0, false, ONGOING); 36];
        script.push((1.0, true, WIN));
        let mut env = Scripted::new(script);
        let mut agents = stub_agents();
        let outcome = play_episode(&mut env, &mut agents);
        assert_eq!(outcome, Outcome::Win("model_1".to_string()));
    }

    #[test]
    fn tally_sums_to_requested_games_across_mixed_outcomes() {
        let mut env = Scripted::new(vec![(1.0, true, WIN)]);
        let mut agents = stub_agents();
        let tally = run_tournament(&mut env, &mut agents, 25);
        assert_eq!(tally.total(), 25);
    }
}
