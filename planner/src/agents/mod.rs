//! Agent abstractions for LLM-backed planning.

pub mod planner;
