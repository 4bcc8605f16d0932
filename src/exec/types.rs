/*!
 * Exec Types
 * Requests, modes, and errors for image replacement
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Exec operation result
pub type ExecResult<T> = Result<T, ExecError>;

/// Exec errors. A failed replacement leaves the calling process fully
/// intact; these are ordinary returned outcomes, never a crash.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ExecError {
    #[error("Program not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not a valid program image: {0}")]
    ExecFormat(String),
}

/// Uninhabited success type for `exec`: a successful replacement transfers
/// control one-way into the new image, so the Ok arm can never be
/// constructed and callers can only write the error path.
#[derive(Debug, Clone, Copy)]
pub enum Never {}

/// How the program operand is turned into a registered image path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// The operand is the exact path (execv-family)
    Direct,
    /// Walk the ordered search path, first match wins (execvp-family).
    /// An operand containing '/' is taken as a path, search skipped.
    PathSearch,
}

/// Where the new image's environment comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvMode {
    /// Reuse the calling process's environment
    Inherit,
    /// Replace it wholly with the supplied mapping (execve-family)
    Explicit(HashMap<String, String>),
}

/// An image-replacement request: program, arguments, and the resolution
/// and environment modes that distinguish the exec variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    pub program: String,
    pub args: Vec<String>,
    pub resolution: ResolutionMode,
    pub env: EnvMode,
}

impl ExecRequest {
    /// execv-style: exact path, inherited environment
    pub fn direct(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            resolution: ResolutionMode::Direct,
            env: EnvMode::Inherit,
        }
    }

    /// execvp-style: search-path resolution, inherited environment
    pub fn path_search(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            resolution: ResolutionMode::PathSearch,
            env: EnvMode::Inherit,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// execve-style: replace the environment wholly
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = EnvMode::Explicit(env);
        self
    }
}
