/// Configuration for world generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldGenConfig {
    /// RNG seed for deterministic generation.
    pub seed: u64,
    /// JSON dataset to use instead of the embedded reference map.
    pub dataset: Option<String>,
    /// Give generals of mustering factions their starting soldiers.
    pub muster_armies: bool,
}

impl Default for WorldGenConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            dataset: None,
            muster_armies: true,
        }
    }
}
