/*!
 * Process Types
 * Common types for the process model
 */

use crate::core::types::{ExitCode, Pid};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Process operation result
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Process errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ProcessError {
    #[error("Process {0} not found")]
    NotFound(Pid),

    #[error("Process limit reached: {current}/{limit}")]
    LimitReached { current: usize, limit: usize },

    #[error("Pid {pid} is not an active child of {parent}")]
    NoSuchChild { parent: Pid, pid: Pid },

    #[error("Process {0} has no children to wait for")]
    NoChildren(Pid),

    #[error("Spawn failed: {0}")]
    SpawnFailed(String),
}

/// Which side of a spawn split the shared continuation is running on.
///
/// The duplication "returns twice": the same continuation is entered once
/// per side, with this tag telling each side which one it is. The parent
/// side carries the child's pid, the way fork returns it; the child side
/// is the zero-equivalent marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fork {
    /// Calling side of the split
    Parent(Pid),
    /// Duplicated side
    Child,
}

/// Process state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Process is runnable or running
    Running,
    /// Process is blocked in a wait operation
    Waiting,
    /// Process has terminated; the record stays until a wait consumes it
    Terminated,
}

/// Terminal status of a process, as consumed by wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExitStatus {
    code: ExitCode,
}

impl ExitStatus {
    pub fn exited(code: ExitCode) -> Self {
        Self { code }
    }

    pub fn code(&self) -> ExitCode {
        self.code
    }

    pub fn success(&self) -> bool {
        self.code == 0
    }
}

impl std::fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "exited {}", self.code)
    }
}

/// The program a process is running: path, arguments, environment.
/// Replaced wholesale by exec; carried unchanged across spawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessImage {
    pub program: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

impl ProcessImage {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: HashMap::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }
}

/// Process metadata snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessInfo {
    pub pid: Pid,
    pub parent_pid: Pid,
    pub program: String,
    pub state: ProcessState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_status: Option<ExitStatus>,
}
