//! Chat front-end: keyword intents mapped onto planner operations, with an
//! optional language-model backend for messages no intent matches.

use std::sync::{Arc, LazyLock, OnceLock};

use parking_lot::Mutex;
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::models::{Status, TaskPatch};
use crate::planner::Planner;

/// A text-generation backend.
pub trait LanguageModel: Send + Sync {
    fn reply(&self, message: &str, context: &str) -> Result<String, String>;
}

/// Produces the backend on first use, or `None` if it cannot be loaded.
pub type ModelLoader = Box<dyn FnOnce() -> Option<Box<dyn LanguageModel>> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelState {
    Uninitialized,
    Loading,
    Ready,
    Unavailable,
}

/// Process-wide handle to the optional language model.
///
/// Loading happens at most once, on the first [`ModelService::model`] call;
/// concurrent callers wait for it. [`ModelService::state`] never triggers a
/// load.
pub struct ModelService {
    state: Mutex<ModelState>,
    loader: Mutex<Option<ModelLoader>>,
    model: OnceLock<Option<Box<dyn LanguageModel>>>,
}

impl ModelService {
    pub fn with_loader(loader: ModelLoader) -> ModelService {
        ModelService {
            state: Mutex::new(ModelState::Uninitialized),
            loader: Mutex::new(Some(loader)),
            model: OnceLock::new(),
        }
    }

    /// A service with no backend; resolves to `Unavailable` on first use.
    pub fn unconfigured() -> ModelService {
        ModelService::with_loader(Box::new(|| None))
    }

    pub fn state(&self) -> ModelState {
        *self.state.lock()
    }

    pub fn model(&self) -> Option<&dyn LanguageModel> {
        self.model
            .get_or_init(|| {
                *self.state.lock() = ModelState::Loading;
                info!("loading language model");
                let loaded = self.loader.lock().take().and_then(|load| load());
                let state = if loaded.is_some() {
                    ModelState::Ready
                } else {
                    ModelState::Unavailable
                };
                info!(?state, "language model initialised");
                *self.state.lock() = state;
                loaded
            })
            .as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    ListTasks,
    AddTask,
    CompleteTask,
    DeleteTask,
    Greeting,
    HowAreYou,
    Thanks,
    Help,
    Time,
    Date,
}

/// Checked in order; the first matching pattern decides the intent.
static INTENTS: LazyLock<Vec<(Intent, Regex)>> = LazyLock::new(|| {
    let table: &[(Intent, &str)] = &[
        (Intent::ListTasks, r"(?:what(?:'s| is)?|show|list|display)\s+(?:is\s+)?(?:on\s+)?(?:my\s+)?(?:tasks?|schedule|agenda|to.?do)"),
        (Intent::ListTasks, r"what.*(?:on my|do i have|is on).*(?:schedule|today|tomorrow)"),
        (Intent::AddTask, r"^(?:add|create|set|make|put|schedule)\s+(?:a\s+)?(?:new\s+)?task\s+(?:(?:for|to|called|named)\s+)?(.+)"),
        (Intent::AddTask, r"^(?:add|create|set|make|put|schedule)\s+(?:a\s+)?(?:new\s+)?(.+)"),
        (Intent::AddTask, r"(?:remind me to|i need to)\s+(.+)"),
        (Intent::CompleteTask, r"(?:mark|complete|finish)\s+(?:task\s+)?#?(\d+)"),
        (Intent::DeleteTask, r"(?:delete|remove|cancel)\s+(?:task\s+)?#?(\d+)"),
        (Intent::Greeting, r"^(?:hi|hello|hey|good\s+(?:morning|afternoon|evening))\b"),
        (Intent::HowAreYou, r"how\s+are\s+you"),
        (Intent::Thanks, r"thank"),
        (Intent::Help, r"^help$|what can you do"),
        (Intent::Time, r"what(?:'s| is)?\s+(?:the\s+)?time"),
        (Intent::Date, r"what(?:'s| is)?\s+(?:the\s+)?date"),
    ];
    table
        .iter()
        .map(|(intent, p)| (*intent, Regex::new(&format!("(?i){p}")).unwrap()))
        .collect()
});

/// The intent of `message` and its captured argument, if any.
pub fn classify(message: &str) -> Option<(Intent, Option<String>)> {
    let text = message.trim();
    INTENTS.iter().find_map(|(intent, re)| {
        re.captures(text).map(|c| {
            let arg = c.get(1).map(|m| m.as_str().trim().to_string());
            (*intent, arg)
        })
    })
}

/// What the assistant did in response to a message.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Reply,
    AddTask { id: u64 },
    CompleteTask { id: u64 },
    DeleteTask { id: u64 },
    ListTasks,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Response {
    #[serde(flatten)]
    pub action: Action,
    pub response: String,
}

impl Response {
    fn reply(text: impl Into<String>) -> Response {
        Response {
            action: Action::Reply,
            response: text.into(),
        }
    }
}

const SCHEDULE_SIZE: usize = 10;

pub struct Assistant<'a> {
    planner: &'a Planner,
    model: Arc<ModelService>,
}

impl<'a> Assistant<'a> {
    pub fn new(planner: &'a Planner, model: Arc<ModelService>) -> Assistant<'a> {
        Assistant { planner, model }
    }

    pub fn respond(&self, message: &str) -> Response {
        let Some((intent, arg)) = classify(message) else {
            return self.fallback(message);
        };
        let id = arg.as_deref().and_then(|a| a.parse::<u64>().ok());

        match intent {
            Intent::Greeting => Response::reply("Hi! Tell me what you need to get done."),
            Intent::HowAreYou => Response::reply("All good here. What can I plan for you?"),
            Intent::Thanks => Response::reply("You're welcome!"),
            Intent::Help => Response::reply(
                "I can add tasks, show your schedule, mark tasks done and delete them. \
                 Try 'add gym tomorrow 7am 1h' or 'mark task 3 done'.",
            ),
            Intent::Time => Response::reply(format!(
                "It's {} right now.",
                self.planner.now().format("%I:%M %p")
            )),
            Intent::Date => Response::reply(format!(
                "Today is {}.",
                self.planner.now().format("%A, %B %d, %Y")
            )),
            Intent::AddTask => self.add(arg.as_deref().unwrap_or(message)),
            Intent::ListTasks => self.list(),
            Intent::CompleteTask => match id {
                Some(id) => self.complete(id),
                None => Response::reply("Which task number should I mark done?"),
            },
            Intent::DeleteTask => match id {
                Some(id) => self.delete(id),
                None => Response::reply("Which task number should I delete?"),
            },
        }
    }

    fn add(&self, text: &str) -> Response {
        let created = self
            .planner
            .create_from_text(text)
            .and_then(|id| self.planner.get_task(id));
        match created {
            Ok(task) => Response {
                action: Action::AddTask { id: task.id },
                response: format!("Done! Added '{}' for {}.", task.name, task.deadline_str()),
            },
            Err(e) => Response::reply(format!("I couldn't add that: {e}")),
        }
    }

    fn complete(&self, id: u64) -> Response {
        let patch = TaskPatch {
            status: Some(Status::Done.to_string()),
            ..Default::default()
        };
        match self.planner.patch_task(id, &patch) {
            Ok(_) => Response {
                action: Action::CompleteTask { id },
                response: format!("Marked task #{id} as done!"),
            },
            Err(e) => Response::reply(format!("I couldn't complete task #{id}: {e}")),
        }
    }

    fn delete(&self, id: u64) -> Response {
        match self.planner.delete_task(id) {
            Ok(()) => Response {
                action: Action::DeleteTask { id },
                response: format!("Deleted task #{id}."),
            },
            Err(e) => Response::reply(format!("I couldn't delete task #{id}: {e}")),
        }
    }

    fn list(&self) -> Response {
        let tasks = match self.planner.list_tasks() {
            Ok(tasks) => tasks,
            Err(e) => return Response::reply(format!("I couldn't read your tasks: {e}")),
        };
        let lines: Vec<String> = tasks
            .iter()
            .filter(|t| t.status == Status::Active)
            .take(SCHEDULE_SIZE)
            .map(|t| format!("#{}: {} (P{})", t.id, t.name, t.priority))
            .collect();
        let response = if lines.is_empty() {
            "Your schedule is clear! No active tasks.".to_string()
        } else {
            format!("Here's your schedule:\n{}", lines.join("\n"))
        };
        Response {
            action: Action::ListTasks,
            response,
        }
    }

    fn fallback(&self, message: &str) -> Response {
        if let Some(model) = self.model.model() {
            match model.reply(message, &self.context()) {
                Ok(text) if !text.trim().is_empty() => return Response::reply(text.trim()),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "language model reply failed"),
            }
        }
        Response::reply(canned_reply(message))
    }

    /// Short summary of open tasks handed to the language model.
    fn context(&self) -> String {
        self.planner
            .list_tasks()
            .unwrap_or_default()
            .iter()
            .filter(|t| t.status == Status::Active)
            .take(5)
            .map(|t| format!("#{}: {}", t.id, t.name))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Topic answers used when no language model is available.
pub fn canned_reply(message: &str) -> &'static str {
    let t = message.to_lowercase();
    if t.contains("priorit") || t.contains("urgent") {
        "Sort by urgency and importance: do urgent and important work first, \
         schedule what is important but not urgent, hand off the rest."
    } else if t.contains("productiv") || t.contains("focus") {
        "Start with the hardest task, work in 25-50 minute blocks and keep your phone out of reach."
    } else if t.contains("overwhelm") || t.contains("stress") || t.contains("too much") {
        "Write everything down as tasks, pick one, and set a 25 minute timer."
    } else if t.contains("time") && t.contains("manag") {
        "Plan tomorrow tonight, batch similar tasks, and give everything a deadline."
    } else {
        "I can help you manage tasks! Try 'add meeting tomorrow 3pm', 'show my tasks' or 'mark task 1 done'."
    }
}
