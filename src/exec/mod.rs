/*!
 * Exec Module
 * Program images, resolution, and the image-replacement contract
 */

pub mod registry;
pub mod types;

// Re-export public API
pub use registry::{ProgramBody, ProgramRegistry};
pub use types::{EnvMode, ExecError, ExecRequest, ExecResult, Never, ResolutionMode};
