//! Per-model trash options and their YAML form.
//!
//! Options are usually built in code, but they can also live in the
//! application's YAML configuration:
//!
//! ```yaml
//! trash:
//!   models:
//!     users:
//!       cascade: [notes]
//!     archived_users:
//!       marker_column: trashed_at
//! ```

use crate::error::TrashError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use trashcan_data::Entity;

/// Column used as the trash marker when none is configured.
pub const DEFAULT_MARKER_COLUMN: &str = "deleted_at";

/// Trash options of one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrashOptions {
    /// Column holding the trash timestamp. `NULL` means active.
    pub marker_column: String,
    /// Relations trashed and recovered together with the record, in order.
    pub cascade: Vec<String>,
}

impl Default for TrashOptions {
    fn default() -> Self {
        Self {
            marker_column: DEFAULT_MARKER_COLUMN.to_string(),
            cascade: Vec::new(),
        }
    }
}

impl TrashOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn marker_column(mut self, column: impl Into<String>) -> Self {
        self.marker_column = column.into();
        self
    }

    pub fn cascade<I, N>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.cascade = relations.into_iter().map(Into::into).collect();
        self
    }
}

/// The `trash` section of a configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrashSettings {
    /// Options keyed by model name or table name.
    #[serde(default)]
    pub models: HashMap<String, TrashOptions>,
}

#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    trash: TrashSettings,
}

impl TrashSettings {
    /// Parse the `trash` section of a YAML document. A missing section yields
    /// empty settings.
    pub fn from_yaml(yaml: &str) -> Result<Self, TrashError> {
        let doc: Document = serde_yaml::from_str(yaml).map_err(|e| TrashError::Configuration {
            model: "trash".to_string(),
            message: format!("invalid trash settings: {e}"),
        })?;
        Ok(doc.trash)
    }

    /// Options configured under `key`, or the defaults.
    pub fn options_for(&self, key: &str) -> TrashOptions {
        self.models.get(key).cloned().unwrap_or_default()
    }

    /// Options for `E`, looked up by model name first and then by table name.
    pub fn for_model<E: Entity>(&self) -> TrashOptions {
        self.models
            .get(E::model_name())
            .or_else(|| self.models.get(E::table_name()))
            .cloned()
            .unwrap_or_default()
    }
}
