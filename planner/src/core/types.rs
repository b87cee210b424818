//! Plan value types shared by the generators, the orchestrator and storage.
//!
//! These types are the wire contract for plan JSON in both directions: what the
//! LLM must return and what the HTTP API responds with.

use serde::{Deserialize, Serialize};

use crate::core::dependencies::DependencySpec;

/// One actionable step in a plan, as produced by a generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedTask {
    pub task_description: String,
    /// `None` when the generator gave no value (absent or `null`); echoed as `null`.
    #[serde(default)]
    pub dependencies: Option<DependencySpec>,
    pub deadline: String,
}

impl PlannedTask {
    pub fn new(
        description: impl Into<String>,
        dependencies: DependencySpec,
        deadline: impl Into<String>,
    ) -> Self {
        Self {
            task_description: description.into(),
            dependencies: Some(dependencies),
            deadline: deadline.into(),
        }
    }
}

/// Structured plan (`{"tasks": [...]}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub tasks: Vec<PlannedTask>,
}

/// Result of plan orchestration: the tasks plus which generator produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanOutcome {
    pub tasks: Vec<PlannedTask>,
    /// `true` when the local heuristic generator produced `tasks`.
    pub used_fallback: bool,
}
