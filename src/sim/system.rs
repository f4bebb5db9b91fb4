use super::context::TurnContext;

/// A pluggable system that runs once per turn, after every faction acted.
///
/// Object-safe so systems can be stored as `Box<dyn SimSystem>`.
pub trait SimSystem {
    fn name(&self) -> &str;
    fn tick(&mut self, ctx: &mut TurnContext);
}
