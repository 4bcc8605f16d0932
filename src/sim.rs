/*!
 * Simulator
 * Composition root wiring the file store, program registry, pipe manager,
 * and process table together
 */

use crate::core::errors::SimResult;
use crate::core::types::{ExitCode, SimConfig};
use crate::exec::ProgramRegistry;
use crate::fs::{DescriptorTable, FileStore};
use crate::ipc::PipeManager;
use crate::process::context::run_process;
use crate::process::{ExitStatus, ProcessContext, ProcessImage, ProcessTable};
use log::info;

/// The assembled simulator
///
/// Roots are processes with no parent: `spawn_root` hands back a context
/// driven by the caller's own thread, `run_root` drives a whole process
/// body and returns its recorded exit status.
pub struct Simulator {
    config: SimConfig,
    store: FileStore,
    registry: ProgramRegistry,
    pipes: PipeManager,
    processes: ProcessTable,
}

impl Simulator {
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    pub fn with_config(config: SimConfig) -> Self {
        info!("Simulator starting");
        Self {
            store: FileStore::new(),
            registry: ProgramRegistry::new(),
            pipes: PipeManager::new(config.clone()),
            processes: ProcessTable::new(config.clone()),
            config,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub fn registry(&self) -> &ProgramRegistry {
        &self.registry
    }

    pub fn pipes(&self) -> &PipeManager {
        &self.pipes
    }

    pub fn processes(&self) -> &ProcessTable {
        &self.processes
    }

    /// Create a root process whose logical thread of control is the
    /// calling thread
    pub fn spawn_root(&self) -> SimResult<ProcessContext> {
        let descriptors = DescriptorTable::with_stdio(&self.store, self.config.first_user_fd)?;
        let pid = self
            .processes
            .create_root(ProcessImage::new("init"), descriptors)?;
        Ok(ProcessContext::new(
            pid,
            self.processes.clone(),
            self.store.clone(),
            self.registry.clone(),
            self.pipes.clone(),
        ))
    }

    /// Run a whole root process body on the calling thread and return its
    /// recorded exit status. `exit` and successful `exec` inside the body
    /// are handled the same as in spawned children.
    pub fn run_root<F>(&self, body: F) -> SimResult<ExitStatus>
    where
        F: FnOnce(&ProcessContext) -> ExitCode,
    {
        let ctx = self.spawn_root()?;
        Ok(run_process(ctx, body))
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}
