use rand::RngCore;

use super::runner::TurnReport;
use crate::model::World;

/// Context passed to each system at the end of a turn.
///
/// Bundled so we can add fields later without changing the `SimSystem`
/// trait signature.
pub struct TurnContext<'a> {
    pub world: &'a mut World,
    pub rng: &'a mut dyn RngCore,
    /// Systems append their per-city logs here.
    pub report: &'a mut TurnReport,
}
