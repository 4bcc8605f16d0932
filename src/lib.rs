/*!
 * procsim
 * Userspace simulator for POSIX process-control semantics: descriptor
 * sharing across duplication, image replacement, wait, and pipes
 */

pub mod core;
pub mod exec;
pub mod fs;
pub mod ipc;
pub mod process;
pub mod sim;

// Re-exports
pub use crate::core::{ExitCode, Fd, Pid, SimConfig, SimError, SimResult, Size, EXEC_FAILURE_CODE};
pub use exec::{EnvMode, ExecError, ExecRequest, Never, ProgramRegistry, ResolutionMode};
pub use fs::{
    DescriptorTable, FileError, FileStore, OpenFileDescription, OpenFlags, StagedWrite, STDERR_FD,
    STDIN_FD, STDOUT_FD,
};
pub use ipc::{PipeError, PipeManager, PipeStats, SignalPipe};
pub use process::{
    AddressSpace, ExitStatus, Fork, ProcessContext, ProcessError, ProcessImage, ProcessInfo,
    ProcessState, ProcessTable,
};
pub use sim::Simulator;
