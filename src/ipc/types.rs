/*!
 * Pipe Types
 * Common types, constants, and errors for pipes
 */

use crate::core::types::{Pid, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipe identifier
pub type PipeId = u32;

/// Pipe operation result
pub type PipeResult<T> = Result<T, PipeError>;

/// Pipe error types
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum PipeError {
    #[error("Pipe not found: {0}")]
    NotFound(PipeId),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Pipe closed")]
    Closed,

    #[error("Pipe limit reached: {current}/{limit}")]
    LimitReached { current: usize, limit: usize },
}

/// Pipe statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipeStats {
    pub id: PipeId,
    pub reader_pid: Pid,
    pub writer_pid: Pid,
    pub capacity: Size,
    pub buffered: Size,
    pub read_closed: bool,
    pub write_closed: bool,
}
