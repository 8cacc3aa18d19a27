//! Builder session tests

mod common;

use common::{RecordingStore, form, runtime};
use form_builder_sdk::{
    AutosaveConfig, BuilderConfig, BuilderError, DefinitionIssue, FieldDefinition, FieldKind,
    FieldType, FieldUpdate, FormBuilder, FormConfiguration, NumberVariant, SelectOption,
    StorageError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn country_field() -> FieldDefinition {
    FieldDefinition::new(
        "country",
        "Country",
        FieldKind::select(vec![
            SelectOption::new("USA", "usa"),
            SelectOption::new("Canada", "canada"),
        ]),
    )
}

fn fast_autosave() -> BuilderConfig {
    BuilderConfig {
        autosave: AutosaveConfig::with_delay(Duration::from_millis(100)),
        ..BuilderConfig::default()
    }
}

mod session_tests {
    use super::*;

    #[test]
    fn test_open_loads_saved_form_without_saving() {
        runtime().block_on(async {
            let store = Arc::new(RecordingStore::with_stored(form(7)));
            let builder = FormBuilder::open(store.clone(), BuilderConfig::default()).await;

            assert_eq!(builder.configuration(), &form(7));
            sleep(Duration::from_secs(10)).await;
            assert_eq!(store.save_count(), 0);
        });
    }

    #[test]
    fn test_open_with_nothing_saved() {
        runtime().block_on(async {
            let store = Arc::new(RecordingStore::new());
            let builder = FormBuilder::open(store.clone(), BuilderConfig::default()).await;
            assert!(builder.configuration().is_empty());

            let config = BuilderConfig {
                start_with_blank_field: true,
                ..BuilderConfig::default()
            };
            let builder = FormBuilder::open(store, config).await;
            assert_eq!(builder.configuration().fields, vec![FieldDefinition::blank()]);
        });
    }

    #[test]
    fn test_open_survives_load_failure() {
        runtime().block_on(async {
            let store = Arc::new(RecordingStore::with_stored(form(1)));
            store.fail_loads(StorageError::IoError("unreachable".to_string()));

            let builder = FormBuilder::open(store, BuilderConfig::default()).await;
            assert!(builder.configuration().is_empty());
        });
    }

    #[test]
    fn test_open_can_skip_loading() {
        runtime().block_on(async {
            let store = Arc::new(RecordingStore::with_stored(form(1)));
            let config = BuilderConfig {
                load_saved: false,
                ..BuilderConfig::default()
            };

            let builder = FormBuilder::open(store, config).await;
            assert!(builder.configuration().is_empty());
        });
    }
}

mod editing_tests {
    use super::*;

    #[test]
    fn test_add_and_complete_field_autosaves_once() {
        runtime().block_on(async {
            let store = Arc::new(RecordingStore::new());
            let mut builder = FormBuilder::open(store.clone(), fast_autosave()).await;

            let index = builder.add_blank_field();
            assert!(!builder.is_renderable());

            builder
                .update_field(index, FieldUpdate::new().name("age").title("Age"))
                .unwrap();
            builder
                .update_field(
                    index,
                    FieldUpdate::new()
                        .field_type(FieldType::Number)
                        .variant(Some(NumberVariant::Years))
                        .required(true),
                )
                .unwrap();
            assert!(builder.is_renderable());

            sleep(Duration::from_secs(1)).await;

            let saves = store.saves();
            assert_eq!(saves.len(), 1);
            let field = &saves[0].fields[0];
            assert_eq!(field.name, "age");
            assert!(field.required);
            assert_eq!(field.type_name(), "number");
            assert!(builder.autosave_state().last_saved.is_some());
        });
    }

    #[test]
    fn test_remove_and_move_fields() {
        runtime().block_on(async {
            let store = Arc::new(RecordingStore::new());
            let mut builder = FormBuilder::open(store, BuilderConfig::default()).await;

            builder.add_field(FieldDefinition::new("a", "A", FieldKind::text()));
            builder.add_field(FieldDefinition::new("b", "B", FieldKind::text()));
            builder.add_field(FieldDefinition::new("c", "C", FieldKind::text()));

            builder.move_field(0, 2).unwrap();
            let names: Vec<&str> = builder.configuration().field_names().collect();
            assert_eq!(names, vec!["b", "c", "a"]);

            let removed = builder.remove_field(1).unwrap();
            assert_eq!(removed.name, "c");

            assert_eq!(
                builder.remove_field(5),
                Err(BuilderError::FieldIndexOutOfRange { index: 5, len: 2 })
            );
            assert!(builder.move_field(0, 9).is_err());
        });
    }

    #[test]
    fn test_changing_type_resets_validation() {
        runtime().block_on(async {
            let store = Arc::new(RecordingStore::new());
            let mut builder = FormBuilder::open(store, BuilderConfig::default()).await;
            let index = builder.add_field(country_field());

            builder
                .update_field(index, FieldUpdate::new().field_type(FieldType::Text))
                .unwrap();
            assert_eq!(builder.configuration().fields[0].kind, FieldKind::text());
            assert_eq!(builder.configuration().fields[0].options(), None);
        });
    }

    #[test]
    fn test_option_editing() {
        runtime().block_on(async {
            let store = Arc::new(RecordingStore::new());
            let mut builder = FormBuilder::open(store, BuilderConfig::default()).await;
            let index = builder.add_field(country_field());

            let added = builder
                .add_option(index, SelectOption::new("Mexico", "mexico"))
                .unwrap();
            assert_eq!(added, 2);

            builder
                .update_option(index, 1, SelectOption::new("Canada (CA)", "ca"))
                .unwrap();
            let removed = builder.remove_option(index, 0).unwrap();
            assert_eq!(removed.value, "usa".into());

            let options = builder.configuration().fields[0].options().unwrap();
            assert_eq!(
                options,
                &[
                    SelectOption::new("Canada (CA)", "ca"),
                    SelectOption::new("Mexico", "mexico"),
                ]
            );

            assert_eq!(
                builder.update_option(index, 7, SelectOption::new("X", "x")),
                Err(BuilderError::OptionIndexOutOfRange {
                    field: "country".to_string(),
                    index: 7,
                })
            );
        });
    }

    #[test]
    fn test_last_option_cannot_be_removed() {
        runtime().block_on(async {
            let store = Arc::new(RecordingStore::new());
            let mut builder = FormBuilder::open(store, BuilderConfig::default()).await;
            let index = builder.add_field(country_field());

            builder.remove_option(index, 1).unwrap();
            assert_eq!(
                builder.remove_option(index, 0),
                Err(BuilderError::LastOption {
                    field: "country".to_string()
                })
            );
            assert_eq!(builder.configuration().fields[0].options().unwrap().len(), 1);
        });
    }

    #[test]
    fn test_options_on_non_select_field() {
        runtime().block_on(async {
            let store = Arc::new(RecordingStore::new());
            let mut builder = FormBuilder::open(store, BuilderConfig::default()).await;
            let index = builder.add_field(FieldDefinition::new("name", "Name", FieldKind::text()));

            assert_eq!(
                builder.add_option(index, SelectOption::new("A", "a")),
                Err(BuilderError::NotASelectField("name".to_string()))
            );
        });
    }

    #[test]
    fn test_options_from_text() {
        runtime().block_on(async {
            let store = Arc::new(RecordingStore::new());
            let mut builder = FormBuilder::open(store, BuilderConfig::default()).await;
            let index = builder.add_field(country_field());

            builder
                .set_options_from_text(index, " Red, Green ,, Blue ")
                .unwrap();
            let options = builder.configuration().fields[0].options().unwrap();
            assert_eq!(
                options,
                &[
                    SelectOption::new("Red", "Red"),
                    SelectOption::new("Green", "Green"),
                    SelectOption::new("Blue", "Blue"),
                ]
            );

            assert!(builder.set_options_from_text(index, " , ").is_err());
            assert_eq!(builder.configuration().fields[0].options().unwrap().len(), 3);
        });
    }

    #[test]
    fn test_incomplete_edits_do_not_autosave() {
        runtime().block_on(async {
            let store = Arc::new(RecordingStore::with_stored(form(1)));
            let mut builder = FormBuilder::open(store.clone(), fast_autosave()).await;

            builder.add_blank_field();
            sleep(Duration::from_secs(1)).await;

            assert_eq!(store.save_count(), 0);
            assert_eq!(
                builder.issues(),
                vec![
                    DefinitionIssue::MissingName { index: 1 },
                    DefinitionIssue::MissingTitle { index: 1 },
                    DefinitionIssue::MissingType { index: 1 },
                ]
            );
        });
    }
}

mod save_tests {
    use super::*;

    #[test]
    fn test_save_now_refuses_invalid_definition() {
        runtime().block_on(async {
            let store = Arc::new(RecordingStore::new());
            let mut builder = FormBuilder::open(store.clone(), BuilderConfig::default()).await;
            builder.add_field(FieldDefinition::new("a", "A", FieldKind::text()));
            builder.add_field(FieldDefinition::new("a", "Again", FieldKind::text()));

            let result = builder.save_now().await;
            assert_eq!(
                result,
                Err(BuilderError::InvalidDefinition(vec![
                    DefinitionIssue::DuplicateName {
                        name: "a".to_string()
                    }
                ]))
            );
            assert_eq!(
                result.unwrap_err().to_string(),
                "Please fill in all required fields correctly"
            );
            assert_eq!(store.save_count(), 0);
        });
    }

    #[test]
    fn test_save_now_on_empty_form() {
        runtime().block_on(async {
            let store = Arc::new(RecordingStore::new());
            let builder = FormBuilder::open(store, BuilderConfig::default()).await;

            assert_eq!(
                builder.save_now().await,
                Err(BuilderError::InvalidDefinition(vec![DefinitionIssue::NoFields]))
            );
        });
    }

    #[test]
    fn test_save_now_persists_immediately() {
        runtime().block_on(async {
            let store = Arc::new(RecordingStore::new());
            let mut builder = FormBuilder::open(store.clone(), BuilderConfig::default()).await;
            builder.add_field(country_field());

            builder.save_now().await.unwrap();
            assert_eq!(
                store.saves(),
                vec![FormConfiguration::new(vec![country_field()])]
            );

            // The debounced save for the same edit is superseded
            sleep(Duration::from_secs(10)).await;
            assert_eq!(store.save_count(), 1);
        });
    }

    #[test]
    fn test_save_now_reports_storage_failure() {
        runtime().block_on(async {
            let store = Arc::new(RecordingStore::new());
            let mut builder = FormBuilder::open(store.clone(), BuilderConfig::default()).await;
            builder.add_field(country_field());
            store.fail_next_save("Failed to save form");

            let result = builder.save_now().await;
            assert_eq!(
                result,
                Err(BuilderError::Save(StorageError::BackendError(
                    "Failed to save form".to_string()
                )))
            );
            assert_eq!(
                builder.autosave_state().error.as_deref(),
                Some("Failed to save form")
            );
        });
    }

    #[test]
    fn test_close_cancels_pending_autosave() {
        runtime().block_on(async {
            let store = Arc::new(RecordingStore::new());
            let mut builder = FormBuilder::open(store.clone(), BuilderConfig::default()).await;
            builder.add_field(country_field());

            builder.close().await;
            sleep(Duration::from_secs(10)).await;
            assert_eq!(store.save_count(), 0);
        });
    }
}
