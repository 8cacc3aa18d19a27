//! Shared test helpers

#![allow(dead_code)]

use async_trait::async_trait;
use form_builder_sdk::{
    FieldDefinition, FieldKind, FormConfiguration, FormStore, StorageError,
};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::runtime::Runtime;

/// Current-thread runtime with paused time, so timers are deterministic
pub fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap()
}

/// A renderable one-field form; `n` makes each version distinct
pub fn form(n: usize) -> FormConfiguration {
    FormConfiguration::new(vec![FieldDefinition::new(
        "name",
        format!("Name {}", n),
        FieldKind::text(),
    )])
}

/// In-memory form store that records every save and can be scripted to fail
#[derive(Default)]
pub struct RecordingStore {
    saved: Mutex<Vec<FormConfiguration>>,
    stored: Mutex<Option<FormConfiguration>>,
    failures: Mutex<VecDeque<String>>,
    load_error: Mutex<Option<StorageError>>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn with_stored(configuration: FormConfiguration) -> Self {
        let store = Self::default();
        *store.stored.lock().unwrap() = Some(configuration);
        store
    }

    /// Make the next save fail with `message`
    pub fn fail_next_save(&self, message: &str) {
        self.failures.lock().unwrap().push_back(message.to_string());
    }

    pub fn fail_loads(&self, error: StorageError) {
        *self.load_error.lock().unwrap() = Some(error);
    }

    pub fn set_stored(&self, configuration: Option<FormConfiguration>) {
        *self.stored.lock().unwrap() = configuration;
    }

    pub fn saves(&self) -> Vec<FormConfiguration> {
        self.saved.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FormStore for RecordingStore {
    async fn save(&self, configuration: &FormConfiguration) -> Result<(), StorageError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let failure = self.failures.lock().unwrap().pop_front();
        if let Some(message) = failure {
            return Err(StorageError::BackendError(message));
        }

        self.saved.lock().unwrap().push(configuration.clone());
        *self.stored.lock().unwrap() = Some(configuration.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<FormConfiguration>, StorageError> {
        let error = self.load_error.lock().unwrap().clone();
        if let Some(error) = error {
            return Err(error);
        }
        Ok(self.stored.lock().unwrap().clone())
    }
}
