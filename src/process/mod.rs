/*!
 * Process Module
 * Process records, duplication, wait lifecycle, and per-process contexts
 */

pub mod address_space;
pub mod context;
pub mod table;
pub mod types;

// Re-export public API
pub use address_space::AddressSpace;
pub use context::ProcessContext;
pub use table::ProcessTable;
pub use types::{
    ExitStatus, Fork, ProcessError, ProcessImage, ProcessInfo, ProcessResult, ProcessState,
};
