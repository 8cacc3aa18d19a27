//! Builder session
//!
//! Owns the configuration being authored. Every edit goes through this
//! session, which forwards the new snapshot to the autosave coordinator and
//! exposes the current configuration to a live preview.

use crate::autosave::{AutosaveConfig, AutosaveCoordinator, AutosaveEvent, AutosaveState};
use crate::model::FormStore;
use crate::models::{
    FieldDefinition, FieldKind, FieldType, FormConfiguration, NumberVariant, ScalarValue,
    SelectOption, parse_options,
};
use crate::storage::StorageError;
use crate::validation::{DefinitionIssue, is_form_renderable, validate_configuration};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

/// Configuration for a builder session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BuilderConfig {
    pub autosave: AutosaveConfig,
    /// Start with one blank field when nothing was loaded
    pub start_with_blank_field: bool,
    /// Load the previously saved configuration when the session opens
    pub load_saved: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            autosave: AutosaveConfig::default(),
            start_with_blank_field: false,
            load_saved: true,
        }
    }
}

/// Refused builder operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuilderError {
    #[error("No field at index {index} (form has {len} field(s))")]
    FieldIndexOutOfRange { index: usize, len: usize },

    #[error("Field '{field}' has no option at index {index}")]
    OptionIndexOutOfRange { field: String, index: usize },

    #[error("Field '{0}' is not a select field")]
    NotASelectField(String),

    #[error("Select field '{field}' must keep at least one option")]
    LastOption { field: String },

    #[error("Please fill in all required fields correctly")]
    InvalidDefinition(Vec<DefinitionIssue>),

    #[error("Please ensure all fields have the required data")]
    NotRenderable,

    #[error("Failed to save form: {0}")]
    Save(#[from] StorageError),
}

/// Partial update of a field's properties
///
/// Unset properties are left unchanged. Changing the type replaces the
/// type-specific validation with an empty one for the new type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdate {
    pub name: Option<String>,
    pub title: Option<String>,
    pub required: Option<bool>,
    pub default_value: Option<Option<ScalarValue>>,
    pub field_type: Option<FieldType>,
    pub variant: Option<Option<NumberVariant>>,
    pub kind: Option<FieldKind>,
}

impl FieldUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn default_value(mut self, value: Option<ScalarValue>) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn field_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    /// Number variant; ignored for other field types
    pub fn variant(mut self, variant: Option<NumberVariant>) -> Self {
        self.variant = Some(variant);
        self
    }

    /// Replace the whole type-specific part (type and validation)
    pub fn kind(mut self, kind: FieldKind) -> Self {
        self.kind = Some(kind);
        self
    }

    fn apply(self, field: &mut FieldDefinition) {
        if let Some(name) = self.name {
            field.name = name;
        }
        if let Some(title) = self.title {
            field.title = title;
        }
        if let Some(required) = self.required {
            field.required = required;
        }
        if let Some(default_value) = self.default_value {
            field.default_value = default_value;
        }
        if let Some(field_type) = self.field_type
            && field.kind.field_type() != Some(field_type)
        {
            field.kind = FieldKind::for_type(field_type);
        }
        if let Some(kind) = self.kind {
            field.kind = kind;
        }
        if let Some(new_variant) = self.variant
            && let FieldKind::Number { variant, .. } = &mut field.kind
        {
            *variant = new_variant;
        }
    }
}

/// An authoring session over one form configuration
pub struct FormBuilder {
    configuration: FormConfiguration,
    autosave: AutosaveCoordinator,
}

impl FormBuilder {
    /// Open a session, loading the previously saved configuration if enabled.
    ///
    /// A missing or unreadable saved form starts the session empty (or with
    /// one blank field). Whatever the session starts with is the autosave
    /// baseline, so opening never triggers a save.
    pub async fn open(store: Arc<dyn FormStore>, config: BuilderConfig) -> Self {
        let mut configuration = if config.load_saved {
            match store.load().await {
                Ok(Some(saved)) => saved,
                Ok(None) => FormConfiguration::default(),
                Err(e) => {
                    warn!("Failed to load saved form: {}", e);
                    FormConfiguration::default()
                }
            }
        } else {
            FormConfiguration::default()
        };

        if configuration.is_empty() && config.start_with_blank_field {
            configuration.fields.push(FieldDefinition::blank());
        }

        Self::with_configuration(store, configuration, config.autosave)
    }

    /// Start a session from a given configuration without loading.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_configuration(
        store: Arc<dyn FormStore>,
        configuration: FormConfiguration,
        autosave: AutosaveConfig,
    ) -> Self {
        let autosave = AutosaveCoordinator::spawn(store, autosave);
        autosave.observe(&configuration);
        Self {
            configuration,
            autosave,
        }
    }

    /// The live configuration, for previews
    pub fn configuration(&self) -> &FormConfiguration {
        &self.configuration
    }

    pub fn is_renderable(&self) -> bool {
        is_form_renderable(&self.configuration.fields)
    }

    /// Current authoring problems (empty when the definition is valid)
    pub fn issues(&self) -> Vec<DefinitionIssue> {
        validate_configuration(&self.configuration).err().unwrap_or_default()
    }

    pub fn autosave_state(&self) -> AutosaveState {
        self.autosave.state()
    }

    pub fn watch_autosave(&self) -> watch::Receiver<AutosaveState> {
        self.autosave.watch()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AutosaveEvent> {
        self.autosave.subscribe()
    }

    /// Append a field, returning its index
    pub fn add_field(&mut self, template: FieldDefinition) -> usize {
        self.configuration.fields.push(template);
        self.changed();
        self.configuration.len() - 1
    }

    pub fn add_blank_field(&mut self) -> usize {
        self.add_field(FieldDefinition::blank())
    }

    pub fn remove_field(&mut self, index: usize) -> Result<FieldDefinition, BuilderError> {
        self.check_index(index)?;
        let removed = self.configuration.fields.remove(index);
        self.changed();
        Ok(removed)
    }

    /// Move the field at `from` so it ends up at position `to`
    pub fn move_field(&mut self, from: usize, to: usize) -> Result<(), BuilderError> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(());
        }
        let field = self.configuration.fields.remove(from);
        self.configuration.fields.insert(to, field);
        self.changed();
        Ok(())
    }

    pub fn update_field(&mut self, index: usize, update: FieldUpdate) -> Result<(), BuilderError> {
        update.apply(self.field_mut(index)?);
        self.changed();
        Ok(())
    }

    /// Append an option to a select field, returning its index
    pub fn add_option(&mut self, index: usize, option: SelectOption) -> Result<usize, BuilderError> {
        let (_, options) = self.options_mut(index)?;
        options.push(option);
        let position = options.len() - 1;
        self.changed();
        Ok(position)
    }

    pub fn update_option(
        &mut self,
        index: usize,
        option_index: usize,
        option: SelectOption,
    ) -> Result<(), BuilderError> {
        let (field, options) = self.options_mut(index)?;
        let slot = options
            .get_mut(option_index)
            .ok_or(BuilderError::OptionIndexOutOfRange {
                field,
                index: option_index,
            })?;
        *slot = option;
        self.changed();
        Ok(())
    }

    /// Remove an option from a select field.
    ///
    /// Refused when it is the field's last option.
    pub fn remove_option(&mut self, index: usize, option_index: usize) -> Result<SelectOption, BuilderError> {
        let (field, options) = self.options_mut(index)?;
        if option_index >= options.len() {
            return Err(BuilderError::OptionIndexOutOfRange {
                field,
                index: option_index,
            });
        }
        if options.len() == 1 {
            warn!("Refusing to remove the last option of select field '{}'", field);
            return Err(BuilderError::LastOption { field });
        }
        let removed = options.remove(option_index);
        self.changed();
        Ok(removed)
    }

    /// Replace a select field's options from comma-separated text.
    ///
    /// Refused when the text yields no options.
    pub fn set_options_from_text(&mut self, index: usize, text: &str) -> Result<(), BuilderError> {
        let parsed = parse_options(text);
        let (field, options) = self.options_mut(index)?;
        if parsed.is_empty() {
            warn!("Refusing to clear all options of select field '{}'", field);
            return Err(BuilderError::LastOption { field });
        }
        *options = parsed;
        self.changed();
        Ok(())
    }

    /// Validate and save immediately ("Save Form").
    ///
    /// Goes through the autosave coordinator so it never overlaps an
    /// automatic save.
    pub async fn save_now(&self) -> Result<(), BuilderError> {
        if let Err(issues) = validate_configuration(&self.configuration) {
            warn!("Manual save refused: {} definition issue(s)", issues.len());
            return Err(BuilderError::InvalidDefinition(issues));
        }
        if !self.is_renderable() {
            return Err(BuilderError::NotRenderable);
        }

        self.autosave.flush(&self.configuration).await?;
        info!("Form saved manually");
        Ok(())
    }

    /// End the session. A pending autosave is cancelled.
    pub async fn close(self) {
        self.autosave.shutdown().await;
    }

    fn changed(&self) {
        self.autosave.observe(&self.configuration);
    }

    fn check_index(&self, index: usize) -> Result<(), BuilderError> {
        let len = self.configuration.len();
        if index < len {
            Ok(())
        } else {
            Err(BuilderError::FieldIndexOutOfRange { index, len })
        }
    }

    fn field_mut(&mut self, index: usize) -> Result<&mut FieldDefinition, BuilderError> {
        let len = self.configuration.len();
        self.configuration
            .fields
            .get_mut(index)
            .ok_or(BuilderError::FieldIndexOutOfRange { index, len })
    }

    fn options_mut(&mut self, index: usize) -> Result<(String, &mut Vec<SelectOption>), BuilderError> {
        let field = self.field_mut(index)?;
        let name = field.name.clone();
        match field.options_mut() {
            Some(options) => Ok((name, options)),
            None => Err(BuilderError::NotASelectField(name)),
        }
    }
}
