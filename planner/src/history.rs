//! Saving generated plans and reading goal history back for the API.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::core::dependencies::{DependencySpec, render_stored_dependencies};
use crate::core::types::PlannedTask;
use crate::io::store::{DocumentStore, GoalDocument, NewGoal, NewTask, TaskDocument};

/// Timestamp format used in goal history responses.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A stored goal with its tasks, shaped for API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalSummary {
    pub goal_id: String,
    pub goal_text: String,
    pub created_at: String,
    pub tasks: Vec<TaskSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub task_description: String,
    /// Rendered dependencies; `null` when the task was saved without any.
    pub dependencies: Option<String>,
    pub deadline: String,
}

impl From<TaskDocument> for TaskSummary {
    fn from(doc: TaskDocument) -> Self {
        Self {
            dependencies: doc.dependencies.as_deref().map(render_stored_dependencies),
            task_description: doc.task_description,
            deadline: doc.deadline,
        }
    }
}

/// Persist a goal and its tasks, stamped with the current time.
pub fn save_plan(
    store: &dyn DocumentStore,
    goal_text: &str,
    tasks: &[PlannedTask],
) -> Result<GoalDocument> {
    save_plan_at(store, goal_text, tasks, Utc::now())
}

/// Persist a goal and its tasks with an explicit creation time.
pub fn save_plan_at(
    store: &dyn DocumentStore,
    goal_text: &str,
    tasks: &[PlannedTask],
    created_at: DateTime<Utc>,
) -> Result<GoalDocument> {
    let goal = NewGoal {
        goal_text: goal_text.to_string(),
        created_at,
    };
    let new_tasks = tasks
        .iter()
        .map(|task| NewTask {
            task_description: task.task_description.clone(),
            dependencies: task.dependencies.as_ref().map(DependencySpec::to_stored),
            deadline: task.deadline.clone(),
        })
        .collect();
    let saved = store.insert_plan(goal, new_tasks).context("save plan")?;
    info!(goal_id = %saved.id, tasks = tasks.len(), "saved goal");
    Ok(saved)
}

/// All goals newest first, each with its tasks and rendered dependencies.
pub fn list_goals(store: &dyn DocumentStore) -> Result<Vec<GoalSummary>> {
    let goals = store.goals_newest_first().context("list goals")?;
    let mut summaries = Vec::with_capacity(goals.len());
    for goal in goals {
        let tasks = store
            .tasks_for_goal(&goal.id)
            .with_context(|| format!("list tasks for goal {}", goal.id))?;
        summaries.push(GoalSummary {
            created_at: goal.created_at.format(CREATED_AT_FORMAT).to_string(),
            goal_id: goal.id,
            goal_text: goal.goal_text,
            tasks: tasks.into_iter().map(TaskSummary::from).collect(),
        });
    }
    debug!(goals = summaries.len(), "listed goal history");
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store::MemoryStore;
    use chrono::TimeZone;

    fn task(description: &str, dependencies: DependencySpec) -> PlannedTask {
        PlannedTask::new(description, dependencies, "Today")
    }

    #[test]
    fn list_dependencies_are_rendered_comma_joined() {
        let store = MemoryStore::new();
        let goal = save_plan(
            &store,
            "Launch",
            &[
                task("Build", DependencySpec::None),
                task(
                    "Ship",
                    DependencySpec::List(vec!["Build".to_string(), "Test".to_string()]),
                ),
            ],
        )
        .expect("save");

        let stored = store.tasks_for_goal(&goal.id).expect("tasks");
        assert_eq!(stored[1].dependencies.as_deref(), Some(r#"["Build","Test"]"#));

        let goals = list_goals(&store).expect("list");
        assert_eq!(goals[0].tasks[0].dependencies.as_deref(), Some("None"));
        assert_eq!(goals[0].tasks[1].dependencies.as_deref(), Some("Build, Test"));
    }

    #[test]
    fn unset_dependencies_read_back_as_null() {
        let store = MemoryStore::new();
        let unset = PlannedTask {
            dependencies: None,
            ..task("Wander", DependencySpec::None)
        };
        save_plan(&store, "Explore", &[unset]).expect("save");

        let goals = list_goals(&store).expect("list");
        assert_eq!(goals[0].tasks[0].dependencies, None);
        let value = serde_json::to_value(&goals[0]).expect("serialize");
        assert_eq!(value["tasks"][0]["dependencies"], serde_json::Value::Null);
    }

    #[test]
    fn created_at_uses_history_format() {
        let store = MemoryStore::new();
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        save_plan_at(&store, "g", &[], at).expect("save");

        let goals = list_goals(&store).expect("list");
        assert_eq!(goals[0].created_at, "2024-03-09 14:05:07");
        assert!(goals[0].tasks.is_empty());
    }

    #[test]
    fn history_is_newest_first() {
        let store = MemoryStore::new();
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        save_plan_at(&store, "old", &[], base).expect("save");
        save_plan_at(&store, "new", &[], base + chrono::Duration::hours(1)).expect("save");

        let texts: Vec<String> = list_goals(&store)
            .expect("list")
            .into_iter()
            .map(|g| g.goal_text)
            .collect();
        assert_eq!(texts, vec!["new", "old"]);
    }
}
