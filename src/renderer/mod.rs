//! Renderer session
//!
//! Loads a persisted configuration, derives its validation check and manages
//! the values and errors of one data-entry form.

use crate::model::FormStore;
use crate::models::FormConfiguration;
use crate::storage::StorageError;
use crate::validation::{FormCheck, ValidationErrors, derive_form_check};
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Message shown when the configuration cannot be loaded
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load form configuration";

/// A configuration fetch started by [`FormRenderer::begin_load`]
pub type PendingLoad =
    Pin<Box<dyn Future<Output = Result<Option<FormConfiguration>, StorageError>> + Send>>;

/// Receives validated submissions
pub trait SubmissionHandler: Send {
    fn submit(&mut self, data: Map<String, Value>);
}

impl<F> SubmissionHandler for F
where
    F: FnMut(Map<String, Value>) + Send,
{
    fn submit(&mut self, data: Map<String, Value>) {
        self(data)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RendererError {
    #[error("No form is ready")]
    NotReady,

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
}

/// A loaded form with its derived check, values and errors
#[derive(Debug, Clone)]
pub struct ReadyForm {
    configuration: FormConfiguration,
    check: FormCheck,
    values: Map<String, Value>,
    errors: ValidationErrors,
}

impl ReadyForm {
    fn new(configuration: FormConfiguration) -> Self {
        let check = derive_form_check(&configuration.fields);
        let values = default_values(&configuration);
        Self {
            configuration,
            check,
            values,
            errors: ValidationErrors::default(),
        }
    }

    pub fn configuration(&self) -> &FormConfiguration {
        &self.configuration
    }

    pub fn check(&self) -> &FormCheck {
        &self.check
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }
}

/// Initial values: each field's default, or the empty string
fn default_values(configuration: &FormConfiguration) -> Map<String, Value> {
    configuration
        .fields
        .iter()
        .map(|field| {
            let value = field
                .default_value
                .as_ref()
                .map(|v| v.to_json())
                .unwrap_or_else(|| Value::String(String::new()));
            (field.name.clone(), value)
        })
        .collect()
}

/// Lifecycle of a renderer session
#[derive(Debug, Clone)]
pub enum RendererState {
    Loading,
    /// Loading failed; carries the user-facing message
    Error(String),
    /// Nothing has been persisted yet
    Empty,
    Ready(ReadyForm),
}

/// A data-entry session over one loaded configuration
pub struct FormRenderer<H: SubmissionHandler> {
    store: Arc<dyn FormStore>,
    handler: H,
    state: RendererState,
}

impl<H: SubmissionHandler> FormRenderer<H> {
    /// Create a session in the Loading state without fetching yet
    pub fn new(store: Arc<dyn FormStore>, handler: H) -> Self {
        Self {
            store,
            handler,
            state: RendererState::Loading,
        }
    }

    /// Create a session and load the configuration
    pub async fn open(store: Arc<dyn FormStore>, handler: H) -> Self {
        let mut renderer = Self::new(store, handler);
        renderer.load().await;
        renderer
    }

    /// (Re)load the configuration, replacing the current one and resetting
    /// values to the new defaults.
    pub async fn load(&mut self) {
        let fetch = self.begin_load();
        let result = fetch.await;
        self.finish_load(result);
    }

    /// Enter Loading and return the fetch to await.
    ///
    /// For hosts that render the Loading state while the fetch runs; hand
    /// its result to [`finish_load`](Self::finish_load).
    pub fn begin_load(&mut self) -> PendingLoad {
        self.state = RendererState::Loading;
        let store = Arc::clone(&self.store);
        Box::pin(async move { store.load().await })
    }

    /// Leave Loading with the outcome of a fetch from [`begin_load`](Self::begin_load)
    pub fn finish_load(&mut self, result: Result<Option<FormConfiguration>, StorageError>) {
        self.state = match result {
            Ok(Some(configuration)) => {
                info!(
                    "Rendering form with {} field(s)",
                    configuration.len()
                );
                RendererState::Ready(ReadyForm::new(configuration))
            }
            Ok(None) => RendererState::Empty,
            Err(e) => {
                warn!("Failed to load form configuration: {}", e);
                RendererState::Error(LOAD_FAILED_MESSAGE.to_string())
            }
        };
    }

    /// Manual refresh
    pub async fn reload(&mut self) {
        self.load().await;
    }

    pub fn state(&self) -> &RendererState {
        &self.state
    }

    pub fn ready(&self) -> Option<&ReadyForm> {
        match &self.state {
            RendererState::Ready(form) => Some(form),
            _ => None,
        }
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.ready().and_then(|form| form.values.get(name))
    }

    /// Current error message for a field
    pub fn error(&self, name: &str) -> Option<&str> {
        self.ready().and_then(|form| form.errors.get(name))
    }

    /// Set the value of a declared field, clearing its previous error
    pub fn set_value(&mut self, name: &str, value: Value) -> Result<(), RendererError> {
        let RendererState::Ready(form) = &mut self.state else {
            return Err(RendererError::NotReady);
        };
        if form.configuration.field(name).is_none() {
            return Err(RendererError::UnknownField(name.to_string()));
        }
        form.values.insert(name.to_string(), value);
        form.errors.remove(name);
        Ok(())
    }

    /// Validate the current values.
    ///
    /// On success the validated data is handed to the submission handler.
    /// On failure the per-field errors are kept for display and the handler
    /// is not called.
    pub fn submit(&mut self) -> Result<(), RendererError> {
        let RendererState::Ready(form) = &mut self.state else {
            return Err(RendererError::NotReady);
        };

        match form.check.validate(&form.values) {
            Ok(data) => {
                form.errors = ValidationErrors::default();
                self.handler.submit(data);
                Ok(())
            }
            Err(errors) => {
                info!("Submission rejected: {}", errors);
                form.errors = errors.clone();
                Err(RendererError::Invalid(errors))
            }
        }
    }
}
