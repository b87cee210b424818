//! Keyword-driven plan generator used when the LLM is unavailable.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::dependencies::DependencySpec;
use crate::core::types::{Plan, PlannedTask};

const CLARIFY_TASK: &str = "Clarify and break down the goal into actionable steps.";
const CLARIFY_DEPENDENCY: &str = "Clarify and break down the goal";
const MEAL_KEYWORDS: [&str; 5] = ["eat", "lunch", "food", "dinner", "breakfast"];
const MIN_TASKS: usize = 3;

static HOURS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*hour").expect("hours regex should be valid"));

/// Build a plan from keyword heuristics over the goal text.
///
/// Deterministic and infallible; always returns at least three tasks. Keyword
/// checks are independent, so a goal mentioning both meals and sleep gets both
/// extra tasks, in check order.
pub fn generate_local_plan(goal_text: &str) -> Plan {
    let text = goal_text.to_lowercase();
    let mut tasks = vec![PlannedTask::new(
        CLARIFY_TASK,
        DependencySpec::None,
        "Today",
    )];

    let work = match HOURS_RE.captures(&text) {
        Some(caps) => format!("Work for {} hour(s).", &caps[1]),
        None => "Work on the project (time-boxed session).".to_string(),
    };
    tasks.push(PlannedTask::new(
        work,
        DependencySpec::text(CLARIFY_DEPENDENCY),
        "Today",
    ));

    if MEAL_KEYWORDS.iter().any(|word| text.contains(word)) {
        tasks.push(PlannedTask::new(
            "Take meal breaks.",
            DependencySpec::None,
            "Today",
        ));
    }
    if text.contains("sleep") {
        tasks.push(PlannedTask::new(
            "Sleep adequately.",
            DependencySpec::text("Finish work"),
            "Tonight",
        ));
    }
    if tasks.len() < MIN_TASKS {
        tasks.push(PlannedTask::new(
            "Review and adjust the plan.",
            DependencySpec::text("Complete initial tasks"),
            "Today",
        ));
    }

    Plan { tasks }
}
