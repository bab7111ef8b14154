//! engine configuration
//!
//! bounds and policy knobs, fixed at engine construction. verification
//! keys are configured separately through the builder since they are
//! curve points, not plain settings.

use serde::{Deserialize, Serialize};

/// value unit: 10^18 base units, ethereum-style
pub const UNIT: u128 = 1_000_000_000_000_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    /// smallest accepted deposit, in base units
    pub min_deposit: u128,
    /// largest accepted deposit, in base units
    pub max_deposit: u128,
    /// upper bound on batch_withdraw tuples per call
    pub max_batch_size: usize,
    /// recent roots kept valid per pool
    pub root_history_size: usize,
    /// minimum seconds a transfer batch is held before processing
    pub batch_hold: u64,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            min_deposit: UNIT / 100,      // 0.01
            max_deposit: 1_000 * UNIT,    // 1000
            max_batch_size: 16,
            root_history_size: 30,
            batch_hold: 300,
        }
    }
}
