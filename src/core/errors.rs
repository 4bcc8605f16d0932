/*!
 * Error Types
 * Unified error handling with thiserror and serde support
 */

use thiserror::Error;

// Re-export subsystem errors so callers have one place to import from
pub use crate::exec::ExecError;
pub use crate::fs::FileError;
pub use crate::ipc::PipeError;
pub use crate::process::ProcessError;

/// Unified simulator error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    #[error("Exec error: {0}")]
    Exec(#[from] ExecError),

    #[error("File error: {0}")]
    File(#[from] FileError),

    #[error("Pipe error: {0}")]
    Pipe(#[from] PipeError),
}

/// Result type for operations that cross subsystem boundaries
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_error_serialization() {
        let error = ProcessError::NotFound(123);
        let json = serde_json::to_string(&error).unwrap();
        let deserialized: ProcessError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, deserialized);
    }

    #[test]
    fn test_exec_error_serialization() {
        let error = ExecError::NotFound("/bin/missing".to_string());
        let json = serde_json::to_string(&error).unwrap();
        let deserialized: ExecError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, deserialized);
    }

    #[test]
    fn test_sim_error_from_subsystem_errors() {
        let error: SimError = ProcessError::NotFound(7).into();
        assert!(matches!(error, SimError::Process(_)));

        let error: SimError = FileError::BadDescriptor(42).into();
        assert!(matches!(error, SimError::File(_)));
    }

    #[test]
    fn test_sim_error_display() {
        let error: SimError = ExecError::NotFound("/bin/ls".to_string()).into();
        assert_eq!(error.to_string(), "Exec error: Program not found: /bin/ls");
    }
}
