//! Goal planning backend library.
//!
//! Turns a free-text goal into a short task list, preferring an LLM and falling
//! back to keyword heuristics, and keeps a history of goals in a document store.
//!
//! - **[`core`]**: Pure, deterministic logic (local plan generation, dependency
//!   normalization). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting collaborators (config files, LLM HTTP client,
//!   document store) behind traits so tests can substitute them.
//!
//! Orchestration modules ([`plan`], [`history`]) combine the two, and
//! [`agents`] holds the LLM-backed plan generator.

pub mod agents;
pub mod core;
pub mod history;
pub mod io;
pub mod logging;
pub mod plan;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
