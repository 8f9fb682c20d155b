use std::sync::Arc;

use taskslot::assistant::{classify, Action, Assistant, Intent, LanguageModel, ModelService, ModelState};
use taskslot::clock::FixedClock;
use taskslot::models::{Status, TaskInput};
use taskslot::Planner;

struct Echo;

impl LanguageModel for Echo {
    fn reply(&self, message: &str, context: &str) -> Result<String, String> {
        Ok(format!("echo: {message} [{context}]"))
    }
}

struct Failing;

impl LanguageModel for Failing {
    fn reply(&self, _message: &str, _context: &str) -> Result<String, String> {
        Err("model crashed".into())
    }
}

fn planner() -> Planner {
    Planner::in_memory(FixedClock::at("2026-03-09", "09:00")).unwrap()
}

#[test]
fn test_model_state_machine() {
    let service = ModelService::with_loader(Box::new(|| Some(Box::new(Echo) as Box<dyn LanguageModel>)));
    assert_eq!(service.state(), ModelState::Uninitialized);
    assert!(service.model().is_some());
    assert_eq!(service.state(), ModelState::Ready);
    // Second call reuses the loaded model.
    assert!(service.model().is_some());
    assert_eq!(service.state(), ModelState::Ready);
}

#[test]
fn test_unconfigured_model_is_unavailable() {
    let service = ModelService::unconfigured();
    assert_eq!(service.state(), ModelState::Uninitialized);
    assert!(service.model().is_none());
    assert_eq!(service.state(), ModelState::Unavailable);
}

#[test]
fn test_classify_intents() {
    assert_eq!(
        classify("add gym tomorrow 7am 1h"),
        Some((Intent::AddTask, Some("gym tomorrow 7am 1h".to_string())))
    );
    assert_eq!(
        classify("create a task called buy milk"),
        Some((Intent::AddTask, Some("buy milk".to_string())))
    );
    assert_eq!(
        classify("remind me to call mom friday"),
        Some((Intent::AddTask, Some("call mom friday".to_string())))
    );
    assert_eq!(classify("show my tasks").map(|c| c.0), Some(Intent::ListTasks));
    assert_eq!(
        classify("mark task 3 done"),
        Some((Intent::CompleteTask, Some("3".to_string())))
    );
    assert_eq!(
        classify("delete #12"),
        Some((Intent::DeleteTask, Some("12".to_string())))
    );
    assert_eq!(classify("Hello there").map(|c| c.0), Some(Intent::Greeting));
    assert_eq!(classify("tell me a story"), None);
}

#[test]
fn test_add_complete_delete() {
    let p = planner();
    let assistant = Assistant::new(&p, Arc::new(ModelService::unconfigured()));

    let added = assistant.respond("add gym tomorrow 7am 1h");
    let Action::AddTask { id } = added.action else {
        panic!("unexpected {added:?}");
    };
    let task = p.get_task(id).unwrap();
    assert_eq!(task.name, "gym");
    assert_eq!(task.deadline_str(), "2026-03-10");

    let done = assistant.respond(&format!("mark task {id} done"));
    assert_eq!(done.action, Action::CompleteTask { id });
    assert_eq!(p.get_task(id).unwrap().status, Status::Done);

    let deleted = assistant.respond(&format!("delete task {id}"));
    assert_eq!(deleted.action, Action::DeleteTask { id });
    assert!(p.list_tasks().unwrap().is_empty());
}

#[test]
fn test_failed_actions_reply() {
    let p = planner();
    let assistant = Assistant::new(&p, Arc::new(ModelService::unconfigured()));

    let r = assistant.respond("add call bank yesterday");
    assert_eq!(r.action, Action::Reply);
    assert!(r.response.contains("past"));

    let r = assistant.respond("delete task 9");
    assert_eq!(r.action, Action::Reply);
    assert!(r.response.contains("not found"));
}

#[test]
fn test_list_shows_active_tasks() {
    let p = planner();
    p.create_task(&TaskInput { name: "read".into(), priority: Some(2), ..Default::default() })
        .unwrap();
    let assistant = Assistant::new(&p, Arc::new(ModelService::unconfigured()));
    let r = assistant.respond("what's on my schedule today");
    assert_eq!(r.action, Action::ListTasks);
    assert!(r.response.contains("#1: read (P2)"));
}

#[test]
fn test_fallback_uses_model_when_ready() {
    let p = planner();
    p.create_task(&TaskInput { name: "read".into(), ..Default::default() })
        .unwrap();
    let model = Arc::new(ModelService::with_loader(Box::new(|| {
        Some(Box::new(Echo) as Box<dyn LanguageModel>)
    })));
    let assistant = Assistant::new(&p, model.clone());
    let r = assistant.respond("tell me a story");
    assert_eq!(r.response, "echo: tell me a story [#1: read]");
    assert_eq!(model.state(), ModelState::Ready);
}

#[test]
fn test_fallback_canned_when_model_fails() {
    let p = planner();
    let model = Arc::new(ModelService::with_loader(Box::new(|| {
        Some(Box::new(Failing) as Box<dyn LanguageModel>)
    })));
    let assistant = Assistant::new(&p, model);
    let r = assistant.respond("I feel overwhelmed");
    assert_eq!(r.action, Action::Reply);
    assert!(r.response.contains("25 minute timer"));
}

#[test]
fn test_response_json_shape() {
    let p = planner();
    let assistant = Assistant::new(&p, Arc::new(ModelService::unconfigured()));
    let r = assistant.respond("add stretch tomorrow");
    let json = serde_json::to_value(&r).unwrap();
    assert_eq!(json["action"], "add_task");
    assert_eq!(json["id"], 1);
    assert!(json["response"].as_str().unwrap().contains("stretch"));
}
