//! Background sweep configuration.

use serde::{Deserialize, Serialize};

/// Expired-session sweep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the periodic sweep runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Six-field cron expression (seconds first) for the sweep.
    #[serde(default = "default_sweep_schedule")]
    pub sweep_schedule: String,
    /// Run one sweep immediately when the scheduler starts.
    #[serde(default = "default_true")]
    pub sweep_on_startup: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_schedule: default_sweep_schedule(),
            sweep_on_startup: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sweep_schedule() -> String {
    "0 */15 * * * *".to_string()
}
