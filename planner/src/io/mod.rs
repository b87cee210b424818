//! I/O helpers for the planner: configuration, LLM access and storage.

pub mod config;
pub mod llm;
pub mod store;
