//! Test-only LLM clients and fixtures.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use crate::agents::planner::RemotePlanner;
use crate::io::llm::{ChatRequest, LlmClient, LlmError};
use crate::io::store::SqliteStore;

/// One scripted response for [`ScriptedLlm`].
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Content(String),
    ApiError { status: u16, message: String },
    InvalidResponse(String),
}

impl ScriptedReply {
    pub fn content(text: &str) -> Self {
        ScriptedReply::Content(text.to_string())
    }

    pub fn api_error(status: u16) -> Self {
        ScriptedReply::ApiError {
            status,
            message: format!("scripted status {status}"),
        }
    }
}

/// LLM client that replays queued replies and records every request.
///
/// Once the queue is empty every call fails with an invalid-response error.
#[derive(Debug, Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        let reply = self.replies.lock().expect("replies lock").pop_front();
        match reply {
            Some(ScriptedReply::Content(text)) => Ok(text),
            Some(ScriptedReply::ApiError { status, message }) => {
                Err(LlmError::Api { status, message })
            }
            Some(ScriptedReply::InvalidResponse(reason)) => Err(LlmError::InvalidResponse(reason)),
            None => Err(LlmError::InvalidResponse("no scripted reply".to_string())),
        }
    }
}

/// A remote planner whose LLM replays `replies`.
pub fn scripted_planner(replies: Vec<ScriptedReply>) -> (RemotePlanner, Arc<ScriptedLlm>) {
    let llm = Arc::new(ScriptedLlm::new(replies));
    (RemotePlanner::new(Some(llm.clone())), llm)
}

/// A remote planner that always fails, forcing the local fallback.
pub fn failing_planner() -> RemotePlanner {
    RemotePlanner::new(Some(Arc::new(ScriptedLlm::default())))
}

/// JSON content for a well-formed plan with the given task descriptions.
pub fn plan_json(descriptions: &[&str]) -> String {
    let tasks = descriptions
        .iter()
        .map(|d| {
            serde_json::json!({
                "task_description": d,
                "dependencies": "None",
                "deadline": "Today",
            })
        })
        .collect::<Vec<_>>();
    serde_json::json!({ "tasks": tasks }).to_string()
}

/// A SQLite store in a fresh temp dir. Keep the `TempDir` alive for the test.
pub fn temp_sqlite_store() -> Result<(TempDir, SqliteStore)> {
    let dir = tempfile::tempdir()?;
    let store = SqliteStore::open(&dir.path().join("planner.db"))?;
    Ok((dir, store))
}
