/*!
 * Process Table
 * Process records, spawn bookkeeping, and wait/reap lifecycle
 */

use super::address_space::AddressSpace;
use super::types::{
    ExitStatus, ProcessError, ProcessImage, ProcessInfo, ProcessResult, ProcessState,
};
use crate::core::sync::WaitQueue;
use crate::core::types::{ExitCode, Pid, SimConfig};
use crate::fs::DescriptorTable;
use dashmap::DashMap;
use log::{info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// A live process record
///
/// The address space and descriptor table sit behind their own locks so
/// callers can operate on them without holding the table's shard lock.
pub(crate) struct Process {
    pub pid: Pid,
    pub parent_pid: Pid,
    pub state: ProcessState,
    pub exit_status: Option<ExitStatus>,
    pub image: ProcessImage,
    pub address_space: Arc<Mutex<AddressSpace>>,
    pub descriptors: Arc<Mutex<DescriptorTable>>,
}

/// Process table: the one place process identity, parentage, and pending
/// exit statuses live.
///
/// A terminated child's record is retained (a zombie) until a wait
/// consumes its status, which is what lets `wait_for` on an
/// already-finished child return immediately instead of hanging.
pub struct ProcessTable {
    processes: Arc<DashMap<Pid, Process>>,
    next_pid: Arc<AtomicU32>,
    config: SimConfig,
    // Keyed by parent pid; woken whenever one of its children terminates
    exit_waits: Arc<WaitQueue<Pid>>,
}

impl ProcessTable {
    pub fn new(config: SimConfig) -> Self {
        info!(
            "Process table initialized (max processes: {})",
            config.max_processes
        );
        Self {
            processes: Arc::new(DashMap::new()),
            next_pid: Arc::new(AtomicU32::new(1)),
            config,
            exit_waits: Arc::new(WaitQueue::new()),
        }
    }

    /// Create a root process with no parent to wait on it
    pub(crate) fn create_root(
        &self,
        image: ProcessImage,
        descriptors: DescriptorTable,
    ) -> ProcessResult<Pid> {
        self.check_limit()?;
        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        let process = Process {
            pid,
            parent_pid: 0,
            state: ProcessState::Running,
            exit_status: None,
            image,
            address_space: Arc::new(Mutex::new(AddressSpace::new())),
            descriptors: Arc::new(Mutex::new(descriptors)),
        };
        self.processes.insert(pid, process);
        info!("Created root process (pid {})", pid);
        Ok(pid)
    }

    /// Duplicate `parent` into a new child record: deep-copied address
    /// space, shallow-copied descriptor table, same image.
    pub(crate) fn fork_record(&self, parent: Pid) -> ProcessResult<Pid> {
        self.check_limit()?;

        let (address_space, descriptors, image) = {
            let entry = self
                .processes
                .get(&parent)
                .ok_or(ProcessError::NotFound(parent))?;
            let result = (
                entry.address_space.lock().clone(),
                entry.descriptors.lock().duplicate(),
                entry.image.clone(),
            );
            result
        };

        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        let child = Process {
            pid,
            parent_pid: parent,
            state: ProcessState::Running,
            exit_status: None,
            image,
            address_space: Arc::new(Mutex::new(address_space)),
            descriptors: Arc::new(Mutex::new(descriptors)),
        };
        self.processes.insert(pid, child);
        info!("Spawned pid {} from pid {}", pid, parent);
        Ok(pid)
    }

    fn check_limit(&self) -> ProcessResult<()> {
        let current = self.processes.len();
        if current >= self.config.max_processes {
            return Err(ProcessError::LimitReached {
                current,
                limit: self.config.max_processes,
            });
        }
        Ok(())
    }

    /// Drop a record that never ran (its thread failed to start)
    pub(crate) fn discard(&self, pid: Pid) {
        if self.processes.remove(&pid).is_some() {
            warn!("Discarded pid {} before it ran", pid);
        }
    }

    /// Record a process's termination. The status is set exactly once; the
    /// record stays as a zombie until a wait consumes it.
    pub(crate) fn finish(&self, pid: Pid, code: ExitCode) -> ExitStatus {
        let status = ExitStatus::exited(code);
        let parent = {
            let mut entry = match self.processes.get_mut(&pid) {
                Some(entry) => entry,
                None => {
                    warn!("Pid {} finished after its record was removed", pid);
                    return status;
                }
            };
            if entry.exit_status.is_none() {
                entry.exit_status = Some(status);
                entry.state = ProcessState::Terminated;
                info!("Pid {} terminated ({})", pid, status);
            }
            entry.parent_pid
        };
        // Shard lock released above; now wake any parent blocked in wait
        self.exit_waits.wake_all(parent);
        status
    }

    /// Swap in a new image and reinitialize the address space. Descriptor
    /// table and pid are untouched, the exec preservation contract.
    pub(crate) fn replace_image(&self, pid: Pid, image: ProcessImage) {
        match self.processes.get_mut(&pid) {
            Some(mut entry) => {
                info!("Pid {} image replaced with {}", pid, image.program);
                entry.image = image;
                *entry.address_space.lock() = AddressSpace::new();
            }
            None => warn!("Image replacement for unknown pid {}", pid),
        }
    }

    /// Block until any child of `caller` terminates; consume and return its
    /// status. `NoChildren` if the caller has nothing to wait for.
    pub fn wait_any(&self, caller: Pid) -> ProcessResult<(Pid, ExitStatus)> {
        self.set_state(caller, ProcessState::Waiting);
        let outcome = self.exit_waits.wait_until(caller, || {
            let mut has_children = false;
            for entry in self.processes.iter() {
                if entry.parent_pid != caller {
                    continue;
                }
                has_children = true;
                if let Some(status) = entry.exit_status {
                    return Some(Ok((entry.pid, status)));
                }
            }
            if has_children {
                None
            } else {
                Some(Err(ProcessError::NoChildren(caller)))
            }
        });
        self.set_state(caller, ProcessState::Running);

        let (pid, status) = outcome?;
        self.reap(pid);
        Ok((pid, status))
    }

    /// Block until the named child terminates; consume and return its
    /// status. `NoSuchChild` if `pid` was never spawned by `caller` or was
    /// already waited on.
    pub fn wait_for(&self, caller: Pid, pid: Pid) -> ProcessResult<ExitStatus> {
        {
            let entry = self
                .processes
                .get(&pid)
                .ok_or(ProcessError::NoSuchChild { parent: caller, pid })?;
            if entry.parent_pid != caller {
                return Err(ProcessError::NoSuchChild { parent: caller, pid });
            }
        }

        self.set_state(caller, ProcessState::Waiting);
        let status = self.exit_waits.wait_until(caller, || {
            self.processes.get(&pid).and_then(|entry| entry.exit_status)
        });
        self.set_state(caller, ProcessState::Running);

        self.reap(pid);
        Ok(status)
    }

    fn reap(&self, pid: Pid) {
        if self.processes.remove(&pid).is_some() {
            info!("Reaped pid {}", pid);
        }
    }

    fn set_state(&self, pid: Pid, state: ProcessState) {
        if let Some(mut entry) = self.processes.get_mut(&pid) {
            // A terminal record is immutable
            if entry.state != ProcessState::Terminated {
                entry.state = state;
            }
        }
    }

    pub(crate) fn address_space(&self, pid: Pid) -> ProcessResult<Arc<Mutex<AddressSpace>>> {
        self.processes
            .get(&pid)
            .map(|entry| Arc::clone(&entry.address_space))
            .ok_or(ProcessError::NotFound(pid))
    }

    pub(crate) fn descriptors(&self, pid: Pid) -> ProcessResult<Arc<Mutex<DescriptorTable>>> {
        self.processes
            .get(&pid)
            .map(|entry| Arc::clone(&entry.descriptors))
            .ok_or(ProcessError::NotFound(pid))
    }

    pub fn image(&self, pid: Pid) -> ProcessResult<ProcessImage> {
        self.processes
            .get(&pid)
            .map(|entry| entry.image.clone())
            .ok_or(ProcessError::NotFound(pid))
    }

    pub fn parent_of(&self, pid: Pid) -> ProcessResult<Pid> {
        self.processes
            .get(&pid)
            .map(|entry| entry.parent_pid)
            .ok_or(ProcessError::NotFound(pid))
    }

    pub fn info(&self, pid: Pid) -> Option<ProcessInfo> {
        self.processes.get(&pid).map(|entry| ProcessInfo {
            pid: entry.pid,
            parent_pid: entry.parent_pid,
            program: entry.image.program.clone(),
            state: entry.state,
            exit_status: entry.exit_status,
        })
    }

    pub fn list(&self) -> Vec<ProcessInfo> {
        let mut infos: Vec<ProcessInfo> = self
            .processes
            .iter()
            .map(|entry| ProcessInfo {
                pid: entry.pid,
                parent_pid: entry.parent_pid,
                program: entry.image.program.clone(),
                state: entry.state,
                exit_status: entry.exit_status,
            })
            .collect();
        infos.sort_by_key(|info| info.pid);
        infos
    }

    pub fn count(&self) -> usize {
        self.processes.len()
    }
}

impl Clone for ProcessTable {
    fn clone(&self) -> Self {
        Self {
            processes: Arc::clone(&self.processes),
            next_pid: Arc::clone(&self.next_pid), // Share the counter across clones
            config: self.config.clone(),
            exit_waits: Arc::clone(&self.exit_waits),
        }
    }
}
