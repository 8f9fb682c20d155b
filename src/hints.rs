//! Keyword-count suggestions for category and priority. UI hints only;
//! nothing here feeds the parser or the store.

use serde::Serialize;

use crate::models::Category;

const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Work, &["meeting", "client", "email", "report", "presentation", "project", "office", "call"]),
    (Category::Study, &["assignment", "exam", "study", "lecture", "lab", "homework", "paper", "thesis"]),
    (Category::Personal, &["family", "shopping", "friend", "travel", "birthday"]),
    (Category::Health, &["gym", "doctor", "dentist", "health", "run", "workout", "medicine"]),
    (Category::Finance, &["bill", "payment", "invoice", "tax", "bank", "budget", "salary"]),
    (Category::Home, &["clean", "laundry", "repair", "maintenance", "groceries", "cook"]),
];

/// Most urgent level first; the first level with any hit wins.
const PRIORITY_KEYWORDS: &[(u8, &[&str])] = &[
    (1, &["urgent", "asap", "critical", "emergency", "immediately", "today"]),
    (2, &["important", "soon", "this week", "deadline"]),
    (3, &["normal", "regular", "routine"]),
    (4, &["later", "optional", "whenever"]),
    (5, &["someday", "eventually", "nice to have"]),
];

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Hints {
    pub category: Category,
    pub category_confidence: f64,
    pub priority: u8,
    pub priority_confidence: f64,
}

/// Category with the most keyword hits, with a confidence in `0..=1`.
///
/// Ties go to the category listed first.
pub fn suggest_category(text: &str) -> (Category, f64) {
    let t = text.trim().to_lowercase();
    if t.is_empty() {
        return (Category::General, 0.3);
    }

    let mut best: Option<(Category, usize)> = None;
    for (category, keywords) in CATEGORY_KEYWORDS {
        let hits = keywords.iter().filter(|k| t.contains(*k)).count();
        if hits > 0 && best.map_or(true, |(_, b)| hits > b) {
            best = Some((*category, hits));
        }
    }

    match best {
        Some((category, hits)) => (category, round2((hits as f64 / 3.0).min(1.0))),
        None => (Category::General, 0.35),
    }
}

/// Priority suggested by urgency words in the title, date and time text.
pub fn suggest_priority(text: &str, date: &str, time: &str) -> (u8, f64) {
    let combined = format!("{} {} {}", text, date, time).trim().to_lowercase();
    if combined.is_empty() {
        return (3, 0.5);
    }

    for (level, keywords) in PRIORITY_KEYWORDS {
        let score = 2 * keywords.iter().filter(|k| combined.contains(*k)).count();
        if score > 0 {
            return (*level, round2((score as f64 / 6.0).min(1.0)));
        }
    }
    (3, 0.55)
}

pub fn suggest(text: &str) -> Hints {
    let (category, category_confidence) = suggest_category(text);
    let (priority, priority_confidence) = suggest_priority(text, "", "");
    Hints {
        category,
        category_confidence,
        priority,
        priority_confidence,
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
