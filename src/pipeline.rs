// src/pipeline.rs
//! Capability traits for collaborators the mirror consumes but does not own.

use crate::error::AppError;
use serde_json::Value;

/// Converts markdown into Notion block objects ready to append.
///
/// Implementations decide which markdown constructs they support and cap
/// the number of blocks they emit.
pub trait BlockRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> Result<Vec<Value>, AppError>;
}
