use std::env;
use std::fs;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use taskslot::clock::FixedClock;
use taskslot::error::{ConsistencyError, StoreError, TaskError, ValidationError};
use taskslot::models::{Category, Status, Task, TaskInput, TaskPatch};
use taskslot::scheduler::SchedulerConfig;
use taskslot::storage::{self, Backend, JsonMirror, Mirror, SqliteMirror};
use taskslot::store::TaskStore;
use taskslot::Planner;

fn clock() -> FixedClock {
    FixedClock::at("2026-03-09", "09:00")
}

fn planner() -> Planner {
    Planner::in_memory(clock()).unwrap()
}

fn input(name: &str) -> TaskInput {
    TaskInput {
        name: name.into(),
        ..Default::default()
    }
}

fn with_test_db<F>(test_name: &str, ext: &str, f: F)
where
    F: FnOnce(PathBuf),
{
    let mut db_path = env::temp_dir();
    db_path.push(format!("taskslot_test_{}_{}.{}", test_name, std::process::id(), ext));
    if db_path.exists() {
        fs::remove_file(&db_path).unwrap();
    }

    f(db_path.clone());

    for suffix in ["", "-wal", "-shm"] {
        let mut p = db_path.clone().into_os_string();
        p.push(suffix);
        let _ = fs::remove_file(PathBuf::from(p));
    }
}

fn reopen(backend: Backend, path: &PathBuf) -> Planner {
    let mirror = storage::open(backend, path).unwrap();
    Planner::new(mirror, SchedulerConfig::default(), Box::new(clock())).unwrap()
}

#[test]
fn test_create_and_list_round_trip() {
    let p = planner();
    let id = p
        .create_task(&TaskInput {
            name: "File taxes".into(),
            category: Some("finance".into()),
            priority: Some(2),
            deadline: Some("2026-04-10".into()),
            start_time: Some("9:15".into()),
            duration: Some(90),
            status: None,
        })
        .unwrap();

    let tasks = p.list_tasks().unwrap();
    let matching: Vec<&Task> = tasks.iter().filter(|t| t.id == id).collect();
    assert_eq!(matching.len(), 1);
    let t = matching[0];
    assert_eq!(t.name, "File taxes");
    assert_eq!(t.category, Category::Finance);
    assert_eq!(t.priority, 2);
    assert_eq!(t.deadline, NaiveDate::from_ymd_opt(2026, 4, 10));
    assert_eq!(t.start_time_str(), "09:15");
    assert_eq!(t.duration, 90);
    assert_eq!(t.status, Status::Active);
}

#[test]
fn test_list_is_idempotent() {
    let p = planner();
    for name in ["b", "a", "c"] {
        p.create_task(&input(name)).unwrap();
    }
    assert_eq!(p.list_tasks().unwrap(), p.list_tasks().unwrap());
}

#[test]
fn test_priority_orders_before_insertion() {
    let p = planner();
    let low = p
        .create_task(&TaskInput { priority: Some(2), ..input("later") })
        .unwrap();
    let high = p
        .create_task(&TaskInput { priority: Some(1), ..input("first") })
        .unwrap();

    let ids: Vec<u64> = p.list_tasks().unwrap().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![high, low]);
}

#[test]
fn test_listing_order_keys() {
    let p = planner();
    let done = p.create_task(&TaskInput { priority: Some(1), ..input("done") }).unwrap();
    p.patch_task(done, &TaskPatch { status: Some("done".into()), ..Default::default() })
        .unwrap();
    let late = p
        .create_task(&TaskInput { deadline: Some("2026-03-12".into()), ..input("late") })
        .unwrap();
    let timed = p
        .create_task(&TaskInput { start_time: Some("15:00".into()), ..input("timed") })
        .unwrap();
    let early = p
        .create_task(&TaskInput { start_time: Some("10:00".into()), ..input("early") })
        .unwrap();
    let ghost = p.create_task(&input("ghost")).unwrap();

    let ids: Vec<u64> = p.list_tasks().unwrap().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![ghost, early, timed, late, done]);
}

#[test]
fn test_deleted_id_is_never_reused() {
    let p = planner();
    let first = p.create_task(&input("one")).unwrap();
    let second = p.create_task(&input("two")).unwrap();
    p.delete_task(second).unwrap();
    let third = p.create_task(&input("three")).unwrap();
    assert!(third > second);
    assert!(second > first);
}

#[test]
fn test_delete_unknown_is_not_found() {
    let p = planner();
    assert!(matches!(p.delete_task(42), Err(TaskError::NotFound(42))));
}

#[test]
fn test_patch_unknown_is_not_found() {
    let p = planner();
    let patch = TaskPatch { name: Some("x".into()), ..Default::default() };
    assert!(matches!(p.patch_task(7, &patch), Err(TaskError::NotFound(7))));
}

#[test]
fn test_patch_changes_only_given_fields() {
    let p = planner();
    let id = p
        .create_task(&TaskInput { start_time: Some("11:00".into()), ..input("standup") })
        .unwrap();
    let updated = p
        .patch_task(id, &TaskPatch { priority: Some(1), ..Default::default() })
        .unwrap();
    assert_eq!(updated.priority, 1);
    assert_eq!(updated.name, "standup");
    assert_eq!(updated.start_time, NaiveTime::from_hms_opt(11, 0, 0));
    assert!(p.audit().unwrap().is_empty());
}

#[test]
fn test_patch_blank_start_time_unschedules() {
    let p = planner();
    let id = p
        .create_task(&TaskInput { start_time: Some("11:00".into()), ..input("standup") })
        .unwrap();
    let updated = p
        .patch_task(id, &TaskPatch { start_time: Some(String::new()), ..Default::default() })
        .unwrap();
    assert_eq!(updated.start_time, None);
    assert!(updated.is_ghost());
}

#[test]
fn test_patch_rejects_past_schedule() {
    let p = planner();
    let id = p.create_task(&input("standup")).unwrap();
    let err = p
        .patch_task(id, &TaskPatch { start_time: Some("08:30".into()), ..Default::default() })
        .unwrap_err();
    assert!(matches!(err, TaskError::Validation(ValidationError::PastTime { .. })));
    assert_eq!(p.get_task(id).unwrap().start_time, None);
}

#[test]
fn test_patch_rejects_bad_values() {
    let p = planner();
    let id = p.create_task(&input("standup")).unwrap();
    let err = p
        .patch_task(id, &TaskPatch { priority: Some(0), ..Default::default() })
        .unwrap_err();
    assert!(matches!(err, TaskError::Validation(ValidationError::PriorityOutOfRange(0))));
    let err = p
        .patch_task(id, &TaskPatch { duration: Some(-5), ..Default::default() })
        .unwrap_err();
    assert!(matches!(err, TaskError::Validation(ValidationError::DurationNotPositive(-5))));
}

#[test]
fn test_create_validation_errors() {
    let p = planner();
    assert!(matches!(
        p.create_task(&input("   ")),
        Err(TaskError::Validation(ValidationError::EmptyName))
    ));
    assert!(matches!(
        p.create_task(&TaskInput { deadline: Some("2026-03-08".into()), ..input("late") }),
        Err(TaskError::Validation(ValidationError::PastDate { .. }))
    ));
    assert!(matches!(
        p.create_task(&TaskInput { deadline: Some("03/10/2026".into()), ..input("x") }),
        Err(TaskError::Validation(ValidationError::BadDate(_)))
    ));
    assert!(p.list_tasks().unwrap().is_empty());
}

#[test]
fn test_create_from_text() {
    let p = planner();
    let id = p.create_from_text("dentist tomorrow 2:30 pm p2 health").unwrap();
    let t = p.get_task(id).unwrap();
    assert_eq!(t.name, "dentist");
    assert_eq!(t.category, Category::Health);
    assert_eq!(t.priority, 2);
    assert_eq!(t.deadline_str(), "2026-03-10");
    assert_eq!(t.start_time_str(), "02:30");
}

#[test]
fn test_create_from_text_rejects_past() {
    let p = planner();
    let err = p.create_from_text("call bank yesterday").unwrap_err();
    assert!(matches!(err, TaskError::Validation(ValidationError::Rejected(_))));
    assert!(p.list_tasks().unwrap().is_empty());
}

#[test]
fn test_reconcile_sqlite_across_reopen() {
    with_test_db("reconcile", "db", |path| {
        let (a, b) = {
            let p = reopen(Backend::Sqlite, &path);
            let a = p.create_task(&input("first")).unwrap();
            let b = p.create_task(&input("second")).unwrap();
            p.delete_task(a).unwrap();
            (a, b)
        };

        let p = reopen(Backend::Sqlite, &path);
        let tasks = p.list_tasks().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, b);
        assert_eq!(p.store().next_id(), b + 1);

        let c = p.create_task(&input("third")).unwrap();
        assert!(c > b && c > a);
        assert!(p.audit().unwrap().is_empty());
    });
}

#[test]
fn test_reconcile_json_across_reopen() {
    with_test_db("reconcile", "json", |path| {
        let b = {
            let p = reopen(Backend::Json, &path);
            p.create_task(&input("first")).unwrap();
            p.create_task(&TaskInput { priority: Some(1), ..input("second") }).unwrap()
        };

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"second\""));

        let p = reopen(Backend::Json, &path);
        let names: Vec<String> = p.list_tasks().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["second", "first"]);
        assert_eq!(p.store().next_id(), b + 1);
    });
}

#[test]
fn test_reconcile_empty_mirror_keeps_first_id() {
    let store = TaskStore::open(Box::new(SqliteMirror::in_memory().unwrap())).unwrap();
    assert_eq!(store.next_id(), 1);
}

#[test]
fn test_reconcile_uses_max_id() {
    with_test_db("max_id", "json", |path| {
        let mut mirror = JsonMirror::open(&path).unwrap();
        let seed = planner();
        let id = seed.create_task(&input("seed")).unwrap();
        let mut task = seed.get_task(id).unwrap();
        task.id = 41;
        mirror.insert(&task).unwrap();

        let store = TaskStore::open(Box::new(mirror)).unwrap();
        assert_eq!(store.next_id(), 42);
        assert_eq!(store.get(41).unwrap().name, "seed");
    });
}

/// Mirror whose inserts always fail.
struct BrokenMirror;

impl Mirror for BrokenMirror {
    fn list(&self) -> Result<Vec<Task>, StoreError> {
        Ok(Vec::new())
    }

    fn get(&self, _id: u64) -> Result<Option<Task>, StoreError> {
        Ok(None)
    }

    fn insert(&mut self, _task: &Task) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk full".into()))
    }

    fn update(&mut self, _task: &Task) -> Result<bool, StoreError> {
        Ok(false)
    }

    fn delete(&mut self, _id: u64) -> Result<bool, StoreError> {
        Ok(false)
    }
}

#[test]
fn test_failed_mirror_write_consumes_id() {
    let p = Planner::new(Box::new(BrokenMirror), SchedulerConfig::default(), Box::new(clock())).unwrap();
    assert_eq!(p.store().next_id(), 1);

    let err = p.create_task(&input("lost")).unwrap_err();
    assert!(matches!(err, TaskError::Store(StoreError::Unavailable(_))));
    assert_eq!(p.store().next_id(), 2);
    assert!(p.list_tasks().unwrap().is_empty());

    // The registry entry was dropped, so the tiers agree again.
    assert!(p.audit().unwrap().is_empty());
}

#[test]
fn test_audit_reports_rows_missing_from_registry() {
    with_test_db("audit", "db", |path| {
        let p = reopen(Backend::Sqlite, &path);
        let id = p.create_task(&input("tracked")).unwrap();

        // A second handle writes behind the first store's back.
        let mut other = SqliteMirror::open(&path).unwrap();
        let mut stray = p.get_task(id).unwrap();
        stray.id = id + 10;
        other.insert(&stray).unwrap();

        let issues = p.audit().unwrap();
        assert!(issues.contains(&ConsistencyError::MissingInRegistry(id + 10)));
        assert!(issues
            .iter()
            .any(|i| matches!(i, ConsistencyError::CounterBehind { .. })));
    });
}
