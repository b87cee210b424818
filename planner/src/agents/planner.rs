//! LLM-backed plan generator.

use std::sync::Arc;

use jsonschema::Validator;
use minijinja::{Environment, context};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::core::types::Plan;
use crate::io::llm::{ChatRequest, LlmClient, LlmError};

const SYSTEM_PROMPT: &str = include_str!("prompts/planner_system.md");
const USER_TEMPLATE: &str = include_str!("prompts/planner_user.md");
const PLAN_OUTPUT_SCHEMA: &str = include_str!("../../schemas/plan_output.schema.json");

/// Why the remote generator produced no usable plan.
#[derive(Debug, Error)]
pub enum PlanError {
    /// No LLM client was initialized (e.g. missing API key).
    #[error("LLM client not configured")]
    NotConfigured,

    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("render prompt: {0}")]
    Prompt(#[from] minijinja::Error),

    #[error("LLM returned malformed JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    #[error("LLM response has no tasks")]
    MissingTasks,

    #[error("LLM response does not match plan schema: {0}")]
    SchemaViolation(String),
}

/// Decomposes goals into tasks through one chat completion call.
pub struct RemotePlanner {
    client: Option<Arc<dyn LlmClient>>,
    prompts: Environment<'static>,
    validator: Validator,
}

impl RemotePlanner {
    /// `client` is `None` when no credential was configured; every call then
    /// fails fast with [`PlanError::NotConfigured`].
    pub fn new(client: Option<Arc<dyn LlmClient>>) -> Self {
        let mut prompts = Environment::new();
        prompts
            .add_template("planner_user", USER_TEMPLATE)
            .expect("planner user template should be valid");
        let schema: Value =
            serde_json::from_str(PLAN_OUTPUT_SCHEMA).expect("plan output schema should be JSON");
        let validator =
            jsonschema::validator_for(&schema).expect("plan output schema should compile");
        Self {
            client,
            prompts,
            validator,
        }
    }

    pub fn build_request(&self, goal_text: &str) -> Result<ChatRequest, PlanError> {
        let user_prompt = self
            .prompts
            .get_template("planner_user")?
            .render(context! { goal => goal_text })?;
        Ok(ChatRequest {
            system_prompt: SYSTEM_PROMPT.trim().to_string(),
            user_prompt,
            json_mode: true,
        })
    }

    /// Ask the LLM for a plan. Single attempt, no retries.
    #[instrument(skip_all, fields(goal_len = goal_text.len()))]
    pub async fn generate(&self, goal_text: &str) -> Result<Plan, PlanError> {
        let Some(client) = &self.client else {
            return Err(PlanError::NotConfigured);
        };
        let request = self.build_request(goal_text)?;
        let content = client.complete(&request).await?;
        debug!(content_len = content.len(), "received LLM content");
        let plan = self.parse_plan(&content)?;
        info!(tasks = plan.tasks.len(), "LLM plan accepted");
        Ok(plan)
    }

    /// Parse and validate raw LLM content into a [`Plan`].
    pub fn parse_plan(&self, content: &str) -> Result<Plan, PlanError> {
        let value: Value = serde_json::from_str(content).map_err(PlanError::MalformedJson)?;
        let has_tasks = value
            .get("tasks")
            .is_some_and(|tasks| !tasks.as_array().is_some_and(Vec::is_empty));
        if !has_tasks {
            return Err(PlanError::MissingTasks);
        }
        if !self.validator.is_valid(&value) {
            let messages = self
                .validator
                .iter_errors(&value)
                .map(|err| err.to_string())
                .collect::<Vec<_>>();
            return Err(PlanError::SchemaViolation(messages.join("; ")));
        }
        serde_json::from_value(value).map_err(|err| PlanError::SchemaViolation(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dependencies::DependencySpec;
    use crate::test_support::{ScriptedLlm, ScriptedReply};

    fn planner() -> RemotePlanner {
        RemotePlanner::new(None)
    }

    #[test]
    fn request_carries_fixed_instruction_and_goal() {
        let request = planner().build_request("Ship the release").expect("request");
        assert!(request.system_prompt.contains("3–7 actionable tasks"));
        assert!(request.system_prompt.contains(r#"{"tasks": [...]}"#));
        assert_eq!(request.user_prompt.trim(), r#"My goal: "Ship the release""#);
        assert!(request.json_mode);
    }

    #[test]
    fn parses_mixed_dependency_shapes() {
        let plan = planner()
            .parse_plan(
                r#"{"tasks": [
                    {"task_description": "Outline", "dependencies": "None", "deadline": "Today"},
                    {"task_description": "Draft", "dependencies": ["Outline"], "deadline": "Tomorrow"},
                    {"task_description": "Publish", "deadline": "Friday"}
                ]}"#,
            )
            .expect("plan");
        assert_eq!(plan.tasks.len(), 3);
        assert_eq!(plan.tasks[0].dependencies, Some(DependencySpec::None));
        assert_eq!(
            plan.tasks[1].dependencies,
            Some(DependencySpec::List(vec!["Outline".to_string()]))
        );
        assert_eq!(plan.tasks[2].dependencies, None);
    }

    #[test]
    fn null_and_absent_dependencies_stay_unset() {
        let plan = planner()
            .parse_plan(
                r#"{"tasks": [
                    {"task_description": "A", "dependencies": null, "deadline": "Today"},
                    {"task_description": "B", "deadline": "Today"}
                ]}"#,
            )
            .expect("plan");
        assert!(plan.tasks.iter().all(|t| t.dependencies.is_none()));

        let echoed = serde_json::to_value(&plan).expect("serialize");
        assert_eq!(echoed["tasks"][0]["dependencies"], serde_json::Value::Null);
        assert_eq!(echoed["tasks"][1]["dependencies"], serde_json::Value::Null);
    }

    #[test]
    fn numeric_dependency_items_pass_schema() {
        let plan = planner()
            .parse_plan(
                r#"{"tasks": [
                    {"task_description": "First", "dependencies": "None", "deadline": "Today"},
                    {"task_description": "Second", "dependencies": [1, 2], "deadline": "Today"}
                ]}"#,
            )
            .expect("plan");
        assert_eq!(
            plan.tasks[1].dependencies,
            Some(DependencySpec::List(vec!["1".to_string(), "2".to_string()]))
        );
    }

    #[test]
    fn object_dependency_items_violate_schema() {
        let err = planner()
            .parse_plan(
                r#"{"tasks": [{"task_description": "A", "dependencies": [{"id": 1}], "deadline": "Today"}]}"#,
            )
            .unwrap_err();
        assert!(matches!(err, PlanError::SchemaViolation(_)));
    }

    #[test]
    fn non_json_is_malformed() {
        let err = planner().parse_plan("Sure! Here is your plan:").unwrap_err();
        assert!(matches!(err, PlanError::MalformedJson(_)));
    }

    #[test]
    fn missing_or_empty_tasks_is_missing_tasks() {
        for content in [r#"{"steps": []}"#, r#"{"tasks": []}"#, "[]"] {
            let err = planner().parse_plan(content).unwrap_err();
            assert!(matches!(err, PlanError::MissingTasks), "content {content}");
        }
    }

    #[test]
    fn task_without_deadline_violates_schema() {
        let err = planner()
            .parse_plan(r#"{"tasks": [{"task_description": "Do it"}]}"#)
            .unwrap_err();
        assert!(matches!(err, PlanError::SchemaViolation(_)));
    }

    #[tokio::test]
    async fn unconfigured_planner_fails_fast() {
        let err = planner().generate("goal").await.unwrap_err();
        assert!(matches!(err, PlanError::NotConfigured));
    }

    #[tokio::test]
    async fn generate_sends_one_request_and_parses_reply() {
        let llm = Arc::new(ScriptedLlm::new(vec![ScriptedReply::content(
            r#"{"tasks": [{"task_description": "A", "dependencies": "None", "deadline": "Today"}]}"#,
        )]));
        let planner = RemotePlanner::new(Some(llm.clone()));

        let plan = planner.generate("Learn Rust").await.expect("plan");
        assert_eq!(plan.tasks[0].task_description, "A");
        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].user_prompt.contains("Learn Rust"));
    }

    #[tokio::test]
    async fn client_error_is_reported() {
        let llm = Arc::new(ScriptedLlm::new(vec![ScriptedReply::api_error(503)]));
        let planner = RemotePlanner::new(Some(llm));
        let err = planner.generate("goal").await.unwrap_err();
        assert!(matches!(err, PlanError::Llm(LlmError::Api { status: 503, .. })));
    }
}
