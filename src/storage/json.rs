use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::models::Task;
use crate::storage::{sort_for_listing, Mirror};

/// Task rows kept as a pretty-printed JSON array in a single file.
///
/// Every write rewrites the whole file.
pub struct JsonMirror {
    path: PathBuf,
}

impl JsonMirror {
    /// Uses the file at `path`, creating its parent directory if needed.
    /// A missing file is an empty store.
    pub fn open(path: &Path) -> Result<JsonMirror, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(JsonMirror { path: path.to_owned() })
    }

    /// Loads all rows from the file, in file order.
    fn load(&self) -> Result<Vec<Task>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut f = OpenOptions::new().read(true).open(&self.path)?;
        let mut s = String::new();
        f.read_to_string(&mut s)?;
        if s.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&s)?)
    }

    /// Overwrites the file with `tasks`.
    fn save(&self, tasks: &[Task]) -> Result<(), StoreError> {
        let s = serde_json::to_string_pretty(tasks)?;
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }
}

impl Mirror for JsonMirror {
    fn list(&self) -> Result<Vec<Task>, StoreError> {
        let mut tasks = self.load()?;
        sort_for_listing(&mut tasks);
        Ok(tasks)
    }

    fn get(&self, id: u64) -> Result<Option<Task>, StoreError> {
        Ok(self.load()?.into_iter().find(|t| t.id == id))
    }

    fn insert(&mut self, task: &Task) -> Result<(), StoreError> {
        let mut tasks = self.load()?;
        if tasks.iter().any(|t| t.id == task.id) {
            return Err(StoreError::Database(format!("duplicate id {}", task.id)));
        }
        tasks.push(task.clone());
        self.save(&tasks)
    }

    fn update(&mut self, task: &Task) -> Result<bool, StoreError> {
        let mut tasks = self.load()?;
        match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(t) => *t = task.clone(),
            None => return Ok(false),
        }
        self.save(&tasks)?;
        Ok(true)
    }

    fn delete(&mut self, id: u64) -> Result<bool, StoreError> {
        let mut tasks = self.load()?;
        let len_before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == len_before {
            return Ok(false);
        }
        self.save(&tasks)?;
        Ok(true)
    }
}
