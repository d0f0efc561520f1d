//! Password hashing parameters

use serde::{Deserialize, Serialize};

/// Default Argon2id parameters (the argon2 crate's recommended defaults)
pub const DEFAULT_TIME_COST: u32 = 2;
pub const DEFAULT_MEMORY_COST: u32 = 19 * 1024; // 19 MiB
pub const DEFAULT_PARALLELISM: u32 = 1;

/// Argon2id cost parameters used when hashing account secrets
///
/// Verification always uses the parameters embedded in the stored PHC
/// string, so changing these only affects newly provisioned accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Argon2Params {
    #[serde(default = "default_time_cost")]
    pub time_cost: u32,
    #[serde(default = "default_memory_cost")]
    pub memory_cost: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

fn default_time_cost() -> u32 {
    DEFAULT_TIME_COST
}

fn default_memory_cost() -> u32 {
    DEFAULT_MEMORY_COST
}

fn default_parallelism() -> u32 {
    DEFAULT_PARALLELISM
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
    /// Cheapest parameters argon2 accepts. Tests only.
    pub fn insecure_fast() -> Self {
        Self {
            time_cost: 1,
            memory_cost: 8,
            parallelism: 1,
        }
    }
}
