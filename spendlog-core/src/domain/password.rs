//! Password hashing parameters

use serde::{Deserialize, Serialize};

/// Default Argon2id parameters
pub const DEFAULT_TIME_COST: u32 = 3;
pub const DEFAULT_MEMORY_COST: u32 = 65536; // 64 MiB
pub const DEFAULT_PARALLELISM: u32 = 4;

/// Argon2id cost parameters for credential hashing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Argon2Params {
    pub time_cost: u32,
    /// KiB
    pub memory_cost: u32,
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            time_cost: DEFAULT_TIME_COST,
            memory_cost: DEFAULT_MEMORY_COST,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

impl Argon2Params {
    /// Smallest costs argon2 accepts. Only for tests.
    pub fn insecure_fast() -> Self {
        Self {
            time_cost: 1,
            memory_cost: 8,
            parallelism: 1,
        }
    }
}
