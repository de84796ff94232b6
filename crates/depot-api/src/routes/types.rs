//! Request and response types for the setup API

use depot_core::schema::{self, FieldKind, SetupField};
use depot_core::{ParseError, StoredSettings, SyncPolicy};
use serde::Serialize;

use crate::error::ErrorEntry;

/// Landing page summary
#[derive(Serialize)]
pub struct HomeResponse {
    pub page: &'static str,
    pub dist_sync_mode: SyncPolicy,
    pub packagist_proxy: bool,
    pub git_mirrors: bool,
    pub saved_at: String,
}

/// Option of a choice field
#[derive(Serialize, Clone)]
pub struct SetupOption {
    pub value: String,
    pub label: String,
}

/// Declared setup field
#[derive(Serialize, Clone)]
pub struct SetupSchemaField {
    pub key: String,
    pub label: String,
    pub field_type: FieldKind,
    pub default_value: Option<String>,
    pub required: bool,
    pub placeholder: Option<String>,
    pub paired_with: Option<String>,
    pub options: Option<Vec<SetupOption>>,
}

impl From<&SetupField> for SetupSchemaField {
    fn from(field: &SetupField) -> Self {
        let options = match field.kind {
            FieldKind::Choice => Some(
                schema::choices(field.key)
                    .into_iter()
                    .map(|(value, label)| SetupOption {
                        value: value.to_string(),
                        label: label.to_string(),
                    })
                    .collect(),
            ),
            _ => None,
        };

        Self {
            key: field.key.to_string(),
            label: field.label.to_string(),
            field_type: field.kind,
            default_value: field.default_value.map(str::to_string),
            required: field.required,
            placeholder: field.placeholder.map(str::to_string),
            paired_with: field.paired_with.map(str::to_string),
            options,
        }
    }
}

/// Setup schema response
#[derive(Serialize)]
pub struct SetupSchemaResponse {
    pub fields: Vec<SetupSchemaField>,
}

impl SetupSchemaResponse {
    /// Declared fields; the git prefix placeholder follows `host` when known
    pub fn build(host: Option<&str>) -> Self {
        let mut fields: Vec<SetupSchemaField> =
            schema::SETUP_FIELDS.iter().map(SetupSchemaField::from).collect();

        if let Some(host) = host {
            for field in fields.iter_mut().filter(|f| f.key == schema::GIT_PREFIX) {
                field.placeholder = Some(schema::git_prefix_placeholder(host));
            }
        }

        Self { fields }
    }
}

/// Setup page: schema plus whatever is currently saved
#[derive(Serialize)]
pub struct SetupPageResponse {
    pub configured: bool,
    pub fields: Vec<SetupSchemaField>,
    pub current: Option<StoredSettings>,
}

/// Dry-run validation result
#[derive(Serialize)]
pub struct ValidateSetupResponse {
    pub valid: bool,
    pub errors: Vec<ErrorEntry>,
    pub parse_error: Option<ParseError>,
}
