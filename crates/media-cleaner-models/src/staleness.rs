use serde::{Deserialize, Serialize};

pub const DEFAULT_CUTOFF_DAYS: u32 = 90;

/// Inactivity threshold applied to a single scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StalenessConfig {
    #[serde(default = "default_cutoff_days")]
    pub cutoff_days: u32,
}

fn default_cutoff_days() -> u32 {
    DEFAULT_CUTOFF_DAYS
}

impl StalenessConfig {
    pub fn new(cutoff_days: u32) -> Self {
        Self { cutoff_days }
    }
}

impl Default for StalenessConfig {
    fn default() -> Self {
        Self {
            cutoff_days: DEFAULT_CUTOFF_DAYS,
        }
    }
}
