//! Core error types for depdump-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering graph
//! construction and snapshot loading.

use thiserror::Error;

/// Errors produced by the depdump-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A graph node index was not found.
    #[error("node not found: {graph} node {id}")]
    NodeNotFound { graph: &'static str, id: u32 },

    /// Two instructions or two blocks of one function share an id.
    #[error("duplicate {kind} id {id} in function '{function}'")]
    DuplicateId {
        kind: &'static str,
        id: u32,
        function: String,
    },

    /// A snapshot document could not be parsed.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}
