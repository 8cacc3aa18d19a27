//! Form Builder SDK - declarative form definitions and their runtime
//!
//! Provides unified interfaces for:
//! - Field definitions and form configurations (pure data)
//! - Deriving validation checks from definitions
//! - Readiness and definition validation
//! - Storage backends and form persistence
//! - Debounced, serialized autosave
//! - Builder (authoring) and renderer (data entry) sessions

pub mod autosave;
pub mod builder;
pub mod model;
pub mod models;
pub mod renderer;
pub mod storage;
pub mod validation;

// Re-export commonly used types
pub use storage::{MemoryStorageBackend, SimulationConfig, StorageBackend, StorageError};
#[cfg(feature = "native-fs")]
pub use storage::filesystem::FileSystemStorageBackend;

pub use model::{DocumentFormStore, FormStore};

pub use models::{
    FieldDefinition, FieldKind, FieldType, FormConfiguration, NumberValidation, NumberVariant,
    ScalarValue, SelectOption, SelectValidation, TextValidation,
};

pub use validation::{
    DefinitionIssue, FieldCheck, FormCheck, ValidationErrors, derive_field_check,
    derive_form_check, is_field_renderable, is_form_renderable, validate_configuration,
};

pub use autosave::{AutosaveConfig, AutosaveCoordinator, AutosaveEvent, AutosaveState};
pub use builder::{BuilderConfig, BuilderError, FieldUpdate, FormBuilder};
pub use renderer::{
    FormRenderer, PendingLoad, ReadyForm, RendererError, RendererState, SubmissionHandler,
};
