//! Durable row stores backing the task list.

pub mod json;
pub mod sqlite;

use std::path::Path;

use crate::error::StoreError;
use crate::models::Task;

pub use json::JsonMirror;
pub use sqlite::SqliteMirror;

/// A durable store of task rows, the source of truth for listing.
///
/// `list` returns rows ordered by status, priority, deadline, start time,
/// then id.
pub trait Mirror: Send {
    fn list(&self) -> Result<Vec<Task>, StoreError>;

    fn get(&self, id: u64) -> Result<Option<Task>, StoreError>;

    /// Writes a new row with the id already set on `task`.
    fn insert(&mut self, task: &Task) -> Result<(), StoreError>;

    /// Overwrites the row with `task.id`. `false` if there is no such row.
    fn update(&mut self, task: &Task) -> Result<bool, StoreError>;

    /// `false` if there is no such row.
    fn delete(&mut self, id: u64) -> Result<bool, StoreError>;
}

/// Which backend a database path is served by.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Json,
}

impl Backend {
    /// A `.json` extension selects the JSON file backend.
    pub fn for_path(path: &Path) -> Backend {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Backend::Json,
            _ => Backend::Sqlite,
        }
    }
}

/// Opens the mirror for `path` with the given backend.
pub fn open(backend: Backend, path: &Path) -> Result<Box<dyn Mirror>, StoreError> {
    Ok(match backend {
        Backend::Sqlite => Box::new(SqliteMirror::open(path)?),
        Backend::Json => Box::new(JsonMirror::open(path)?),
    })
}

/// Sorts rows into listing order.
pub fn sort_for_listing(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| t.list_key());
}
