//! In-memory registry that owns id issuance.

use std::collections::BTreeMap;

use crate::models::{Changes, Task, TaskDraft};

/// First id handed out by an empty registry.
pub const FIRST_ID: u64 = 1;

/// Authoritative id oracle plus an in-memory copy of every task.
///
/// The counter only moves forward: deleting a task never frees its id.
#[derive(Debug, Clone)]
pub struct Registry {
    tasks: BTreeMap<u64, Task>,
    next_id: u64,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Registry {
        Registry {
            tasks: BTreeMap::new(),
            next_id: FIRST_ID,
        }
    }

    /// Assigns the next id to `draft` and stores it.
    pub fn insert(&mut self, draft: TaskDraft) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.tasks.insert(id, draft.into_task(id));
        id
    }

    /// Stores a task under its existing id, overwriting any entry with that
    /// id. The counter is bumped past it. Returns `false` for id 0.
    pub fn insert_with_id(&mut self, task: Task) -> bool {
        if task.id == 0 {
            return false;
        }
        if task.id >= self.next_id {
            self.next_id = task.id + 1;
        }
        self.tasks.insert(task.id, task);
        true
    }

    /// Applies only the fields present in `changes`. `false` if `id` is unknown.
    pub fn update(&mut self, id: u64, changes: &Changes) -> bool {
        match self.tasks.get_mut(&id) {
            Some(task) => {
                changes.apply(task);
                true
            }
            None => false,
        }
    }

    /// `false` if `id` was not present.
    pub fn delete(&mut self, id: u64) -> bool {
        self.tasks.remove(&id).is_some()
    }

    /// Drops every task and rewinds the counter.
    pub fn reset(&mut self) {
        self.tasks.clear();
        self.next_id = FIRST_ID;
    }

    /// Moves the counter forward; never backwards.
    pub fn advance_to(&mut self, next_id: u64) {
        self.next_id = self.next_id.max(next_id);
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Status};

    fn draft(name: &str) -> TaskDraft {
        TaskDraft {
            name: name.into(),
            category: Category::General,
            priority: 3,
            deadline: None,
            start_time: None,
            duration: 30,
            status: Status::Active,
        }
    }

    #[test]
    fn test_ids_never_reused() {
        let mut reg = Registry::new();
        let a = reg.insert(draft("a"));
        let b = reg.insert(draft("b"));
        assert!(reg.delete(b));
        let c = reg.insert(draft("c"));
        assert_eq!(a, 1);
        assert_eq!(c, 3);
    }

    #[test]
    fn test_insert_with_id_bumps_counter() {
        let mut reg = Registry::new();
        assert!(reg.insert_with_id(draft("restored").into_task(41)));
        assert_eq!(reg.next_id(), 42);
        assert!(reg.insert_with_id(draft("older").into_task(7)));
        assert_eq!(reg.next_id(), 42);
        assert!(!reg.insert_with_id(draft("zero").into_task(0)));
    }

    #[test]
    fn test_insert_with_existing_id_overwrites() {
        let mut reg = Registry::new();
        reg.insert_with_id(draft("first").into_task(5));
        reg.insert_with_id(draft("second").into_task(5));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(5).unwrap().name, "second");
    }

    #[test]
    fn test_update_only_touches_given_fields() {
        let mut reg = Registry::new();
        let id = reg.insert(draft("a"));
        let changes = Changes { priority: Some(1), ..Default::default() };
        assert!(reg.update(id, &changes));
        let t = reg.get(id).unwrap();
        assert_eq!(t.priority, 1);
        assert_eq!(t.name, "a");
        assert_eq!(t.duration, 30);
        assert!(!reg.update(99, &changes));
    }

    #[test]
    fn test_delete_missing_is_tolerated() {
        let mut reg = Registry::new();
        assert!(!reg.delete(3));
    }

    #[test]
    fn test_reset() {
        let mut reg = Registry::new();
        reg.insert(draft("a"));
        reg.reset();
        assert!(reg.is_empty());
        assert_eq!(reg.next_id(), FIRST_ID);
    }
}
