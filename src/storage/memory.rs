//! In-memory storage backend
//!
//! A process-local key-value store standing in for browser local storage.
//! It can simulate network latency on every operation and random transient
//! failures on writes, so callers exercise their failure handling.

use super::{StorageBackend, StorageError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Message of a simulated write failure
pub const SIMULATED_FAILURE_MESSAGE: &str = "Failed to save form";

/// Latency and failure simulation for [`MemoryStorageBackend`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationConfig {
    /// Delay applied to every write
    pub save_latency_ms: u64,
    /// Delay applied to every read
    pub load_latency_ms: u64,
    /// Probability (0.0 - 1.0) that a write fails
    pub failure_rate: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            save_latency_ms: 1000,
            load_latency_ms: 500,
            failure_rate: 0.1,
        }
    }
}

impl SimulationConfig {
    /// No latency, no failures
    pub fn none() -> Self {
        Self {
            save_latency_ms: 0,
            load_latency_ms: 0,
            failure_rate: 0.0,
        }
    }

    pub fn builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::default()
    }
}

/// Builder for SimulationConfig, starting from [`SimulationConfig::none`]
#[derive(Debug)]
pub struct SimulationConfigBuilder {
    config: SimulationConfig,
}

impl Default for SimulationConfigBuilder {
    fn default() -> Self {
        Self {
            config: SimulationConfig::none(),
        }
    }
}

impl SimulationConfigBuilder {
    pub fn save_latency(mut self, latency: Duration) -> Self {
        self.config.save_latency_ms = latency.as_millis() as u64;
        self
    }

    pub fn load_latency(mut self, latency: Duration) -> Self {
        self.config.load_latency_ms = latency.as_millis() as u64;
        self
    }

    /// Set the write failure probability (clamped to 0.0 - 1.0)
    pub fn failure_rate(mut self, rate: f64) -> Self {
        self.config.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn build(self) -> SimulationConfig {
        self.config
    }
}

/// In-memory storage backend
#[derive(Debug, Default)]
pub struct MemoryStorageBackend {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    simulation: SimulationConfig,
}

impl MemoryStorageBackend {
    /// Create a backend with the given simulation settings
    ///
    /// # Example
    ///
    /// ```rust
    /// use form_builder_sdk::storage::{MemoryStorageBackend, SimulationConfig};
    ///
    /// let backend = MemoryStorageBackend::new(SimulationConfig::none());
    /// ```
    pub fn new(simulation: SimulationConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            simulation,
        }
    }

    pub fn simulation(&self) -> &SimulationConfig {
        &self.simulation
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::BackendError("Storage lock poisoned".to_string()))
    }
}

async fn simulate_latency(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[async_trait]
impl StorageBackend for MemoryStorageBackend {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        simulate_latency(self.simulation.load_latency_ms).await;
        Ok(self.lock()?.get(key).cloned())
    }

    async fn write(&self, key: &str, content: &[u8]) -> Result<(), StorageError> {
        simulate_latency(self.simulation.save_latency_ms).await;

        if self.simulation.failure_rate > 0.0 && rand::random::<f64>() < self.simulation.failure_rate {
            debug!("Simulated write failure for key '{}'", key);
            return Err(StorageError::BackendError(
                SIMULATED_FAILURE_MESSAGE.to_string(),
            ));
        }

        self.lock()?.insert(key.to_string(), content.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }
}
