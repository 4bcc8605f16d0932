/*!
 * Core Types
 * Common types used across the simulator
 */

use serde::{Deserialize, Serialize};

/// Process ID type
pub type Pid = u32;

/// File descriptor type
pub type Fd = u32;

/// Size type for byte counts and offsets
pub type Size = usize;

/// Process exit code (0-127 conventionally)
pub type ExitCode = i32;

/// Conventional exit code reported by a process whose image replacement failed
pub const EXEC_FAILURE_CODE: ExitCode = 127;

/// Simulator-wide limits and defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SimConfig {
    /// Maximum live process records, zombies included
    pub max_processes: usize,
    /// Pipe buffer size when the caller does not specify one
    pub default_pipe_capacity: Size,
    /// Hard cap on a single pipe buffer
    pub max_pipe_capacity: Size,
    /// Maximum live pipes across the simulator
    pub max_pipes: usize,
    /// First handle given out by a descriptor table (0-2 are the stdio convention)
    pub first_user_fd: Fd,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_processes: 64,
            default_pipe_capacity: 4096,
            max_pipe_capacity: 64 * 1024,
            max_pipes: 128,
            first_user_fd: 3,
        }
    }
}

impl SimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_processes(mut self, max: usize) -> Self {
        self.max_processes = max;
        self
    }

    pub fn with_default_pipe_capacity(mut self, capacity: Size) -> Self {
        self.default_pipe_capacity = capacity;
        self
    }

    pub fn with_max_pipes(mut self, max: usize) -> Self {
        self.max_pipes = max;
        self
    }
}
