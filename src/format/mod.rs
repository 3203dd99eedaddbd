//! Output shaping: crosswalks from rows to consumer-facing JSON.

pub mod catalog;
pub mod crosswalk;
pub mod text;

use crate::error::Result;
use crate::model::book::BookRow;
use serde_json::Value;
use std::sync::Arc;

/// How fetched rows are rendered for the caller.
#[derive(Clone)]
pub enum OutputSchema {
    /// Every stored attribute, families joined.
    Full,
    /// Result-list shape: id, title, author, downloads.
    Mini,
    /// The external API document shape.
    ExternalApi,
    /// Catalog-feed publication with acquisition links.
    Catalog,
    /// Caller-supplied projection.
    Custom(Arc<dyn Fn(&BookRow) -> Value + Send + Sync>),
}

impl std::fmt::Debug for OutputSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OutputSchema::Full => "Full",
            OutputSchema::Mini => "Mini",
            OutputSchema::ExternalApi => "ExternalApi",
            OutputSchema::Catalog => "Catalog",
            OutputSchema::Custom(_) => "Custom",
        };
        f.write_str(name)
    }
}

impl OutputSchema {
    pub fn apply(&self, row: &BookRow) -> Result<Value> {
        match self {
            OutputSchema::Full => crosswalk::full(row),
            OutputSchema::Mini => crosswalk::mini(row),
            OutputSchema::ExternalApi => crosswalk::external_api(row),
            OutputSchema::Catalog => catalog::publication(row),
            OutputSchema::Custom(project) => Ok(project(row)),
        }
    }
}
