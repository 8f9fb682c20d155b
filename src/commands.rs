use std::sync::Arc;

use chrono::NaiveDate;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::assistant::{Assistant, ModelService};
use crate::error::{StoreError, TaskError, ValidationError};
use crate::hints;
use crate::models::{Status, Task, TaskInput, TaskPatch, DATE_FORMAT};
use crate::planner::Planner;

/// Creates a task from free-form text, e.g. `"gym tomorrow 7am 1h p2"`.
pub fn cmd_add(planner: &Planner, text: &str) -> Result<(), TaskError> {
    let id = planner.create_from_text(text)?;
    let task = planner.get_task(id)?;
    println!(
        "Task added (id = {}): {} on {}{}",
        id,
        task.name,
        task.deadline_str(),
        task.start_time
            .map(|t| format!(" at {}", t.format("%H:%M")))
            .unwrap_or_default()
    );
    Ok(())
}

/// Creates a task from explicit fields.
pub fn cmd_new(planner: &Planner, input: TaskInput) -> Result<(), TaskError> {
    let id = planner.create_task(&input)?;
    println!("Task added (id = {})", id);
    Ok(())
}

/// Lists tasks in a formatted table, in store order.
///
/// By default, hides completed tasks unless `all` is true.
pub fn cmd_list(planner: &Planner, all: bool) -> Result<(), TaskError> {
    let mut tasks = planner.list_tasks()?;
    if !all {
        tasks.retain(|t| t.status == Status::Active);
    }
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    let today = planner.today();
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Category").add_attribute(Attribute::Bold),
            Cell::new("P").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
            Cell::new("Start").add_attribute(Attribute::Bold),
            Cell::new("Min").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    for t in tasks {
        table.add_row(task_row(&t, today));
    }

    println!("{table}");
    Ok(())
}

fn task_row(t: &Task, today: NaiveDate) -> Vec<Cell> {
    let done = t.status == Status::Done;
    let priority_color = if done {
        Color::Grey
    } else if t.priority <= 1 {
        Color::Red
    } else if t.priority == 2 {
        Color::Yellow
    } else {
        Color::Green
    };
    let overdue = !done && t.deadline.is_some_and(|d| d < today);
    let start = if t.start_time.is_some() {
        t.start_time_str()
    } else {
        "-".to_string()
    };
    let status_color = if done { Color::Green } else { Color::Yellow };

    vec![
        Cell::new(t.id),
        Cell::new(&t.name),
        Cell::new(t.category),
        Cell::new(t.priority).fg(priority_color),
        Cell::new(t.deadline_str()).fg(if overdue { Color::Red } else { Color::Reset }),
        Cell::new(start),
        Cell::new(t.duration),
        Cell::new(t.status).fg(status_color),
    ]
}

/// Edits an existing task's fields. Pass `""` as due or start to clear them.
pub fn cmd_edit(planner: &Planner, id: u64, patch: TaskPatch) -> Result<(), TaskError> {
    if patch.is_empty() {
        println!("Nothing to change for task {}.", id);
        return Ok(());
    }
    planner.patch_task(id, &patch)?;
    println!("Task {} updated.", id);
    Ok(())
}

/// Marks a task as done.
pub fn cmd_done(planner: &Planner, id: u64) -> Result<(), TaskError> {
    let patch = TaskPatch {
        status: Some(Status::Done.to_string()),
        ..Default::default()
    };
    planner.patch_task(id, &patch)?;
    println!("Task {} marked as done.", id);
    Ok(())
}

/// Removes a task by ID.
pub fn cmd_remove(planner: &Planner, id: u64) -> Result<(), TaskError> {
    planner.delete_task(id)?;
    println!("Task {} removed.", id);
    Ok(())
}

/// Prints what the parser makes of `text`, without storing anything.
pub fn cmd_parse(planner: &Planner, text: &str) -> Result<(), TaskError> {
    let parsed = planner.parse_command(text);
    let s = serde_json::to_string_pretty(&parsed).map_err(StoreError::from)?;
    println!("{s}");
    Ok(())
}

/// Shows suggested slots for unscheduled tasks on `date` (default today).
pub fn cmd_plan(planner: &Planner, date: Option<String>) -> Result<(), TaskError> {
    let date = match date {
        Some(d) => Some(
            NaiveDate::parse_from_str(d.trim(), DATE_FORMAT)
                .map_err(|_| ValidationError::BadDate(d.clone()))?,
        ),
        None => None,
    };
    let suggestions = planner.ghost_schedule(date)?;
    if suggestions.is_empty() {
        println!("No unscheduled tasks.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["ID", "Name", "P", "Min", "Suggested", "Date"]);
    for s in suggestions {
        let time = s.suggested_time.format("%H:%M").to_string();
        table.add_row(vec![
            Cell::new(s.task_id),
            Cell::new(s.name),
            Cell::new(s.priority),
            Cell::new(s.duration),
            if s.fallback {
                Cell::new(format!("{time} (no free slot)")).fg(Color::Red)
            } else {
                Cell::new(time)
            },
            Cell::new(s.deadline.format(DATE_FORMAT)),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Commits a suggested time slot to a task.
pub fn cmd_solidify(planner: &Planner, id: u64, time: &str, date: Option<&str>) -> Result<(), TaskError> {
    let task = planner.solidify(id, time, date)?;
    println!(
        "Task {} scheduled for {} at {}.",
        id,
        task.deadline_str(),
        task.start_time_str()
    );
    Ok(())
}

/// Prints category and priority hints for a task title.
pub fn cmd_hint(text: &str) {
    let h = hints::suggest(text);
    println!(
        "Category: {} ({:.0}%)\nPriority: P{} ({:.0}%)",
        h.category,
        h.category_confidence * 100.0,
        h.priority,
        h.priority_confidence * 100.0
    );
}

/// Sends one message to the assistant and prints its reply.
pub fn cmd_chat(planner: &Planner, model: Arc<ModelService>, message: &str) {
    let assistant = Assistant::new(planner, model);
    let response = assistant.respond(message);
    println!("{}", response.response);
}

/// Reports any divergence between the id registry and the database.
pub fn cmd_check(planner: &Planner) -> Result<(), TaskError> {
    let issues = planner.audit()?;
    if issues.is_empty() {
        println!("Store is consistent (next id = {}).", planner.store().next_id());
    } else {
        for issue in issues {
            println!("{issue}");
        }
    }
    Ok(())
}
