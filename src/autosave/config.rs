//! Configuration for autosave

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the autosave coordinator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AutosaveConfig {
    /// Quiet period after the last change before a save starts
    pub delay_ms: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self { delay_ms: 2000 }
    }
}

impl AutosaveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay_ms: delay.as_millis() as u64,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}
