/*!
 * File Types
 * Open-mode flags, metadata, and errors for the file layer
 */

use crate::core::types::{Fd, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File operation result
pub type FileResult<T> = Result<T, FileError>;

/// File layer errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum FileError {
    #[error("No such file: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Bad file descriptor: {0}")]
    BadDescriptor(Fd),
}

/// Open-mode flags, the subset the duplication semantics exercise
///
/// `append` is the one flag with concurrency meaning: it makes each write's
/// offset positioning atomic relative to every sharer of the description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OpenFlags {
    pub read: bool,
    pub write: bool,
    pub create: bool,
    pub truncate: bool,
    pub append: bool,
}

impl OpenFlags {
    pub fn read_only() -> Self {
        Self {
            read: true,
            ..Self::default()
        }
    }

    pub fn write_only() -> Self {
        Self {
            write: true,
            ..Self::default()
        }
    }

    pub fn read_write() -> Self {
        Self {
            read: true,
            write: true,
            ..Self::default()
        }
    }

    pub fn with_create(mut self) -> Self {
        self.create = true;
        self
    }

    pub fn with_truncate(mut self) -> Self {
        self.truncate = true;
        self
    }

    pub fn with_append(mut self) -> Self {
        self.append = true;
        self
    }
}

/// File metadata snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FileStat {
    pub path: String,
    pub len: Size,
}
