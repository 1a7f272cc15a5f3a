use crate::env::{Action, ActionMask, Observation};

/// Action-selection contract shared by every seat filler: trained
/// models, the random training opponent, and test stubs.
pub trait Policy {
    /// Pick an action for the given observation. Masking-aware policies
    /// restrict themselves to legal actions when a mask is supplied;
    /// others are free to ignore it.
    fn predict(&mut self, observation: &Observation, masks: Option<&ActionMask>) -> Action;
}
