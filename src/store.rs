//! Two-tier task store: the in-memory [`Registry`] issues ids, the
//! [`Mirror`] holds the durable rows and serves every read.
//!
//! The tiers share no transaction. All mutations, and startup
//! reconciliation, run under one mutation lock so no caller can observe the
//! gap between the two writes.

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::{ConsistencyError, StoreError, TaskError};
use crate::models::{Changes, Task, TaskDraft};
use crate::registry::Registry;
use crate::storage::Mirror;
use crate::validate::check_not_past;

struct Tiers {
    registry: Registry,
    mirror: Box<dyn Mirror>,
}

pub struct TaskStore {
    inner: Mutex<Tiers>,
}

impl TaskStore {
    /// Wraps `mirror` and replays its rows into a fresh registry before
    /// returning, so the store never serves with a stale id counter.
    pub fn open(mirror: Box<dyn Mirror>) -> Result<TaskStore, StoreError> {
        let store = TaskStore {
            inner: Mutex::new(Tiers {
                registry: Registry::new(),
                mirror,
            }),
        };
        store.reconcile()?;
        Ok(store)
    }

    /// Rebuilds the registry from the mirror: every row is restored under its
    /// own id and the counter is moved past the largest one.
    ///
    /// Returns the number of rows restored.
    fn reconcile(&self) -> Result<usize, StoreError> {
        let mut tiers = self.inner.lock();
        let rows = tiers.mirror.list()?;
        tiers.registry.reset();
        let mut max_id = 0;
        for task in rows.iter() {
            max_id = max_id.max(task.id);
            if !tiers.registry.insert_with_id(task.clone()) {
                warn!(id = task.id, "skipping row with invalid id during reconciliation");
            }
        }
        if max_id > 0 {
            tiers.registry.advance_to(max_id + 1);
        }
        info!(
            restored = rows.len(),
            next_id = tiers.registry.next_id(),
            "registry reconciled from mirror"
        );
        Ok(rows.len())
    }

    /// Allocates an id from the registry, then writes the row to the mirror.
    ///
    /// If the mirror write fails the id stays consumed; the registry entry is
    /// dropped and the divergence logged.
    pub fn create(&self, draft: TaskDraft) -> Result<Task, TaskError> {
        let mut tiers = self.inner.lock();
        let id = tiers.registry.insert(draft.clone());
        let task = draft.into_task(id);

        if let Err(e) = tiers.mirror.insert(&task) {
            tiers.registry.delete(id);
            let divergence = ConsistencyError::OrphanedId {
                id,
                reason: e.to_string(),
            };
            error!(error = %divergence, "task create failed after id allocation");
            return Err(e.into());
        }

        info!(id, name = %task.name, "task created");
        Ok(task)
    }

    /// Rows in listing order, straight from the mirror.
    pub fn list(&self) -> Result<Vec<Task>, StoreError> {
        self.inner.lock().mirror.list()
    }

    pub fn get(&self, id: u64) -> Result<Task, TaskError> {
        self.inner
            .lock()
            .mirror
            .get(id)?
            .ok_or(TaskError::NotFound(id))
    }

    /// Applies `changes` to the mirror row first, then the same fields to the
    /// registry.
    ///
    /// When the changes touch the deadline or start time, the merged row must
    /// not lie in the past relative to `now`.
    pub fn update(&self, id: u64, changes: &Changes, now: NaiveDateTime) -> Result<Task, TaskError> {
        let mut tiers = self.inner.lock();
        let mut task = tiers.mirror.get(id)?.ok_or(TaskError::NotFound(id))?;
        changes.apply(&mut task);

        if changes.touches_schedule() {
            check_not_past(task.deadline, task.start_time, now)?;
        }

        if !tiers.mirror.update(&task)? {
            return Err(TaskError::NotFound(id));
        }

        if !tiers.registry.update(id, changes) {
            let divergence = ConsistencyError::MissingInRegistry(id);
            warn!(error = %divergence, "update not propagated to registry");
        }

        debug!(id, "task updated");
        Ok(task)
    }

    /// Removes the row from the mirror (unknown id is an error), then from the
    /// registry (unknown id is ignored).
    pub fn delete(&self, id: u64) -> Result<(), TaskError> {
        let mut tiers = self.inner.lock();
        if !tiers.mirror.delete(id)? {
            return Err(TaskError::NotFound(id));
        }
        if !tiers.registry.delete(id) {
            debug!(id, "task was already absent from registry");
        }
        info!(id, "task deleted");
        Ok(())
    }

    /// The id the next create will receive.
    pub fn next_id(&self) -> u64 {
        self.inner.lock().registry.next_id()
    }

    /// Compares both tiers and lists every divergence found.
    pub fn audit(&self) -> Result<Vec<ConsistencyError>, StoreError> {
        let tiers = self.inner.lock();
        let rows = tiers.mirror.list()?;
        let mut issues = Vec::new();

        let mut max_id = 0;
        for row in rows.iter() {
            max_id = max_id.max(row.id);
            match tiers.registry.get(row.id) {
                None => issues.push(ConsistencyError::MissingInRegistry(row.id)),
                Some(held) if held != row => issues.push(ConsistencyError::FieldMismatch(row.id)),
                Some(_) => {}
            }
        }
        for held in tiers.registry.tasks() {
            if !rows.iter().any(|r| r.id == held.id) {
                issues.push(ConsistencyError::MissingInMirror(held.id));
            }
        }
        let next_id = tiers.registry.next_id();
        if max_id > 0 && next_id <= max_id {
            issues.push(ConsistencyError::CounterBehind { next_id, max_id });
        }

        for issue in issues.iter() {
            warn!(error = %issue, "store divergence");
        }
        Ok(issues)
    }
}
