use crate::env::{Action, ActionMask, Environment, Observation, Step};
use crate::players::policy::Policy;

/// Turns the two-player environment into a one-player one by letting a
/// fixed built-in policy take the second seat after every agent move.
///
/// Rewards are reported from the agent's perspective: a terminal caused
/// by the opponent flips sign (opponent win -> -1), and an opponent
/// forfeit by illegal move counts as an agent win.
pub struct OnePlayerWrapper<E: Environment, P: Policy> {
    env: E,
    opponent: P,
}

impl<E: Environment, P: Policy> OnePlayerWrapper<E, P> {
    pub fn new(env: E, opponent: P) -> Self {
        OnePlayerWrapper { env, opponent }
    }
}

impl<E: Environment, P: Policy> Environment for OnePlayerWrapper<E, P> {
    fn reset(&mut self) -> Observation {
        self.env.reset()
    }

    fn step(&mut self, action: Action) -> Step {
        let agent_step = self.env.step(action);
        if agent_step.done {
            return agent_step;
        }

        let masks = self.env.action_masks();
        let opp_action = self.opponent.predict(&agent_step.observation, Some(&masks));
        let mut opp_step = self.env.step(opp_action);
        if opp_step.done {
            opp_step.reward = if opp_step.info.invalid {
                1.0
            } else if opp_step.info.draw {
                0.0
            } else {
                -1.0
            };
        } else {
            opp_step.reward = agent_step.reward;
        }
        opp_step
    }

    fn action_masks(&self) -> ActionMask {
        self.env.action_masks()
    }

    fn seed(&mut self, seed: u64) {
        self.env.seed(seed);
    }

    fn close(&mut self) {
        self.env.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::quarto_env::QuartoEnv;
    use crate::players::random::RandomPlayer;

    #[test]
    fn wrapper_advances_two_half_moves_per_step() {
        let mut env = OnePlayerWrapper::new(QuartoEnv::with_seed(721), RandomPlayer::with_seed(1));
        env.reset();
        let masks = env.action_masks();
        let action = Action(masks.iter().position(|&m| m).unwrap());
        let step = env.step(action);
        if !step.done {
            let placed = step.observation.board.iter().filter(|&&c| c >= 0).count();
            assert_eq!(placed, 2);
        }
    }

    #[test]
    fn agent_invalid_move_terminates_before_the_opponent_plays() {
        let mut env = OnePlayerWrapper::new(QuartoEnv::with_seed(3), RandomPlayer::with_seed(1));
        env.reset();
        let masks = env.action_masks();
        let legal = Action(masks.iter().position(|&m| m).unwrap());
        env.step(legal);
        // Replaying the same cell is now illegal.
        let masks = env.action_masks();
        let give = Action(masks.iter().position(|&m| m).unwrap()).give();
        let step = env.step(Action::from_parts(legal.cell(), give));
        assert!(step.done);
        assert!(step.info.invalid);
        assert_eq!(step.reward, -1.0);
    }

    #[test]
    fn wrapped_episodes_terminate() {
        let mut env = OnePlayerWrapper::new(QuartoEnv::with_seed(17), RandomPlayer::with_seed(2));
        let mut agent = RandomPlayer::with_seed(3);
        for _ in 0..5 {
            let mut obs = env.reset();
            let mut moves = 0;
            loop {
                let masks = env.action_masks();
                let step = env.step(agent.predict(&obs, Some(&masks)));
                moves += 1;
                assert!(moves <= 16, "episode failed to terminate");
                if step.done {
                    break;
                }
                obs = step.observation;
            }
        }
    }
}
