//! Plan snapshots
//!
//! A PlanSnapshot is an immutable, content-addressed plan proposed by the
//! planner and adopted (or not) by the user. The id is a hash of the
//! normalized content, so re-normalizing identical planner output always
//! lands on the same snapshot.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::id::derived_id;

/// Roadmap milestone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<String>,
}

/// Product feature the plan delivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<String>,
}

/// Execution task definition inside a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDef {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Open string; the prompt suggests a fixed list but anything is accepted.
    pub role: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// An immutable, content-addressed plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSnapshot {
    pub id: String,
    pub created_at: String,
    pub roadmap: Vec<Milestone>,
    pub features: Vec<Feature>,
    pub tasks: Vec<TaskDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

/// Hashed view of a snapshot: everything except id and createdAt, so that
/// identical content produced at different times deduplicates.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanContent<'a> {
    roadmap: &'a [Milestone],
    features: &'a [Feature],
    tasks: &'a [TaskDef],
    rationale: &'a Option<String>,
}

impl PlanSnapshot {
    /// Normalize a raw `plan` value into a snapshot.
    ///
    /// This is the tolerant path: it runs after the planner output has
    /// already passed strict validation, and hardens against shape drift.
    /// Unknown fields are ignored, missing optionals stay absent, and a
    /// missing mandatory title is filled with an "Untitled …" placeholder.
    pub fn from_value(value: &Value, now: &str) -> Self {
        let roadmap = array_of(value, "roadmap")
            .iter()
            .enumerate()
            .map(|(i, m)| Milestone {
                id: id_or(m, "milestone", i),
                title: title_or(m, "Untitled milestone"),
                description: opt_str(m, "description"),
                target_date: opt_str(m, "targetDate"),
            })
            .collect();

        let features = array_of(value, "features")
            .iter()
            .enumerate()
            .map(|(i, f)| Feature {
                id: id_or(f, "feature", i),
                title: title_or(f, "Untitled feature"),
                description: opt_str(f, "description"),
                dependencies: str_list(f, "dependencies"),
                owners: str_list(f, "owners"),
            })
            .collect();

        let tasks = array_of(value, "tasks")
            .iter()
            .enumerate()
            .map(|(i, t)| TaskDef {
                id: id_or(t, "task", i),
                title: title_or(t, "Untitled task"),
                description: opt_str(t, "description"),
                role: opt_str(t, "role").unwrap_or_else(|| "execution".to_string()),
                depends_on: str_list(t, "dependsOn"),
                payload: t.get("payload").cloned(),
            })
            .collect();

        let rationale = opt_str(value, "rationale");

        let mut snapshot = Self {
            id: String::new(),
            created_at: now.to_string(),
            roadmap,
            features,
            tasks,
            rationale,
        };
        snapshot.id = snapshot.content_id();
        snapshot
    }

    /// Content hash of the normalized plan, independent of creation time.
    pub fn content_id(&self) -> String {
        let content = PlanContent {
            roadmap: &self.roadmap,
            features: &self.features,
            tasks: &self.tasks,
            rationale: &self.rationale,
        };
        derived_id("plan", &serde_json::to_value(&content).unwrap_or(Value::Null))
    }
}

fn array_of<'a>(value: &'a Value, key: &str) -> Vec<&'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().collect())
        .unwrap_or_default()
}

fn opt_str(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn title_or(value: &Value, fallback: &str) -> String {
    opt_str(value, "title").unwrap_or_else(|| fallback.to_string())
}

fn id_or(value: &Value, kind: &str, index: usize) -> String {
    opt_str(value, "id").unwrap_or_else(|| format!("{}-{}", kind, index + 1))
}

fn str_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
