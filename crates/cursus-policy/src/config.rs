//! Policy-engine configuration.

/// Configuration for sequence orchestration.
#[derive(Debug, Clone)]
pub struct SequenceConfig {
    /// Max additional attempts for an auto-indexed insert when
    /// another writer takes the computed index first (default: 3).
    pub max_insert_retries: u32,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            max_insert_retries: 3,
        }
    }
}
