//! Natural-language task entry, a two-tier task store, and greedy slot
//! suggestions for unscheduled tasks.
//!
//! [`planner::Planner`] is the entry point; it ties the command
//! [`parser`], the [`store`] and the [`scheduler`] to a [`clock::Clock`].

pub mod assistant;
pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod hints;
pub mod models;
pub mod parser;
pub mod planner;
pub mod registry;
pub mod scheduler;
pub mod storage;
pub mod store;
pub mod validate;

pub use error::{TaskError, ValidationError};
pub use planner::Planner;
