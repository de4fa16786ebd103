//! Planning pipeline pieces
//!
//! [`normalizer`] turns raw planner output into a strict questions-or-plan
//! result; [`readiness`] decides which prompt mode to run and assembles the
//! context the templater renders.

pub mod normalizer;
pub mod readiness;

pub use normalizer::{NormalizeError, PlanningOutput, extract_json, parse};
pub use readiness::{AnsweredClarification, PromptContext, is_ready, prompt_context};
