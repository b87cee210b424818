//! Plan orchestration: remote generator first, local heuristics as fallback.

use tracing::{info, warn};

use crate::agents::planner::RemotePlanner;
use crate::core::local_plan::generate_local_plan;
use crate::core::types::PlanOutcome;

/// Produce a plan for `goal_text`.
///
/// Never fails. Any remote failure (unconfigured client, transport error,
/// unusable output) switches to [`generate_local_plan`] and sets
/// `used_fallback`. The failure reason is only logged.
pub async fn generate_plan(remote: &RemotePlanner, goal_text: &str) -> PlanOutcome {
    match remote.generate(goal_text).await {
        Ok(plan) => PlanOutcome {
            tasks: plan.tasks,
            used_fallback: false,
        },
        Err(err) => {
            warn!(error = %err, "remote planning failed, using local fallback");
            let plan = generate_local_plan(goal_text);
            info!(tasks = plan.tasks.len(), "local fallback plan generated");
            PlanOutcome {
                tasks: plan.tasks,
                used_fallback: true,
            }
        }
    }
}
