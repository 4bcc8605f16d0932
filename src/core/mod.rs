/*!
 * Core Module
 * Shared types, errors, and blocking primitives
 */

pub mod errors;
pub mod sync;
pub mod types;

// Re-export for convenience
pub use errors::{SimError, SimResult};
pub use sync::WaitQueue;
pub use types::{ExitCode, Fd, Pid, SimConfig, Size, EXEC_FAILURE_CODE};
