//! Prompt templating
//!
//! Handlebars templates for the two planner modes plus the strict-JSON
//! retry reminder. Embedded defaults, overridable from a directory.

mod embedded;
mod loader;

pub use loader::{
    CLARIFY_CHECKLIST, CLARIFY_CONVERSATION, PLAN_FINAL, PromptLoader, STRICT_JSON_REMINDER,
};
