/*!
 * File Module
 * Flat in-memory files, shared open file descriptions, per-process
 * descriptor tables
 */

pub mod file;
pub mod store;
pub mod table;
pub mod types;

// Re-export public API
pub use file::{FileNode, OpenFileDescription, StagedWrite};
pub use store::FileStore;
pub use table::{DescriptorTable, STDERR_FD, STDIN_FD, STDOUT_FD};
pub use types::{FileError, FileResult, FileStat, OpenFlags};
