/// Evaluation limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlueprintConfig {
    /// Consumers run per evaluation before the run is aborted as a cycle.
    pub max_steps: usize,
}

impl Default for BlueprintConfig {
    fn default() -> Self {
        Self { max_steps: 512 }
    }
}
