/*!
 * Process Context
 * The per-process handle through which a logical thread of control acts
 *
 * Each simulated process is an OS thread driving a `ProcessContext`. The
 * context carries the process's pid plus handles to the shared managers,
 * so it is cheap to clone into a child's thread.
 */

use super::table::ProcessTable;
use super::types::{ExitStatus, Fork, ProcessError, ProcessImage, ProcessInfo, ProcessResult};
use crate::core::errors::SimResult;
use crate::core::types::{ExitCode, Fd, Pid, Size};
use crate::exec::{EnvMode, ExecRequest, ExecResult, Never, ProgramRegistry};
use crate::fs::{FileStore, OpenFileDescription, OpenFlags, StagedWrite};
use crate::ipc::PipeManager;
use log::info;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

/// Exit code recorded when a process body panics instead of exiting
const PANIC_EXIT_CODE: ExitCode = 101;

/// Crate-private unwind payload carrying a one-way control transfer:
/// `exit` and a successful `exec` terminate the calling continuation by
/// unwinding to the process runner with this payload.
pub(crate) struct ProcessExit {
    code: ExitCode,
}

pub(crate) fn exit_process(code: ExitCode) -> ! {
    // resume_unwind skips the panic hook: this is control flow, not a fault
    panic::resume_unwind(Box::new(ProcessExit { code }))
}

/// Drive a process body on the current thread and record its termination.
///
/// The runner is the only consumer of `ProcessExit` payloads; any other
/// unwind is a genuine panic and is re-raised after the process is marked
/// terminated so waiters cannot hang on it.
pub(crate) fn run_process<F>(ctx: ProcessContext, body: F) -> ExitStatus
where
    F: FnOnce(&ProcessContext) -> ExitCode,
{
    let pid = ctx.pid;
    let table = ctx.table.clone();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&ctx)));
    let code = match outcome {
        Ok(code) => code,
        Err(payload) => match payload.downcast::<ProcessExit>() {
            Ok(exit) => exit.code,
            Err(other) => {
                table.finish(pid, PANIC_EXIT_CODE);
                panic::resume_unwind(other);
            }
        },
    };
    table.finish(pid, code)
}

/// Per-process capability handle
pub struct ProcessContext {
    pid: Pid,
    table: ProcessTable,
    store: FileStore,
    registry: ProgramRegistry,
    pipes: PipeManager,
}

impl ProcessContext {
    pub(crate) fn new(
        pid: Pid,
        table: ProcessTable,
        store: FileStore,
        registry: ProgramRegistry,
        pipes: PipeManager,
    ) -> Self {
        Self {
            pid,
            table,
            store,
            registry,
            pipes,
        }
    }

    fn for_pid(&self, pid: Pid) -> Self {
        Self {
            pid,
            table: self.table.clone(),
            store: self.store.clone(),
            registry: self.registry.clone(),
            pipes: self.pipes.clone(),
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn parent_pid(&self) -> ProcessResult<Pid> {
        self.table.parent_of(self.pid)
    }

    pub fn info(&self) -> ProcessResult<ProcessInfo> {
        self.table
            .info(self.pid)
            .ok_or(ProcessError::NotFound(self.pid))
    }

    pub fn image(&self) -> ProcessResult<ProcessImage> {
        self.table.image(self.pid)
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

    // ---- address space ----

    pub fn set_var(&self, name: &str, value: i64) -> ProcessResult<()> {
        let space = self.table.address_space(self.pid)?;
        space.lock().set(name, value);
        Ok(())
    }

    pub fn var(&self, name: &str) -> ProcessResult<Option<i64>> {
        let space = self.table.address_space(self.pid)?;
        let value = space.lock().get(name);
        Ok(value)
    }

    // ---- descriptors ----

    pub fn open(&self, path: &str, flags: OpenFlags) -> SimResult<Fd> {
        let description = self.store.open(path, flags)?;
        let table = self.table.descriptors(self.pid)?;
        let fd = table.lock().install(description);
        Ok(fd)
    }

    /// The open file description behind a handle
    pub fn descriptor(&self, fd: Fd) -> SimResult<Arc<OpenFileDescription>> {
        let table = self.table.descriptors(self.pid)?;
        let description = table.lock().get(fd)?;
        Ok(description)
    }

    pub fn write(&self, fd: Fd, bytes: &[u8]) -> SimResult<Size> {
        Ok(self.descriptor(fd)?.write(bytes)?)
    }

    /// Begin a non-append write with its offset read exposed as a separate
    /// step, for deterministic interleaving
    pub fn stage_write(&self, fd: Fd) -> SimResult<StagedWrite> {
        Ok(self.descriptor(fd)?.stage_write()?)
    }

    pub fn read(&self, fd: Fd, max: Size) -> SimResult<Vec<u8>> {
        Ok(self.descriptor(fd)?.read(max)?)
    }

    pub fn close(&self, fd: Fd) -> SimResult<()> {
        let table = self.table.descriptors(self.pid)?;
        table.lock().close(fd)?;
        Ok(())
    }

    pub fn dup(&self, fd: Fd) -> SimResult<Fd> {
        let table = self.table.descriptors(self.pid)?;
        let dup_fd = table.lock().dup(fd)?;
        Ok(dup_fd)
    }

    // ---- process control ----

    /// Duplicate the calling process.
    ///
    /// The continuation is the shared checkpoint after the split and is
    /// entered exactly once on each side: on the calling thread with
    /// `Fork::Parent(child_pid)`, whose return value becomes this call's
    /// value, and on the child's own thread with `Fork::Child`, where the
    /// return value becomes the child's exit code.
    ///
    /// The child starts with a deep copy of the caller's address space, a
    /// shallow copy of its descriptor table (same open file descriptions,
    /// shared offsets), and the same image.
    pub fn spawn<F>(&self, continuation: F) -> ProcessResult<ExitCode>
    where
        F: Fn(Fork, &ProcessContext) -> ExitCode + Send + Sync + 'static,
    {
        let child_pid = self.table.fork_record(self.pid)?;
        let continuation = Arc::new(continuation);

        let child_ctx = self.for_pid(child_pid);
        let child_body = Arc::clone(&continuation);
        let spawned = thread::Builder::new()
            .name(format!("pid-{}", child_pid))
            .spawn(move || run_process(child_ctx, move |ctx| child_body(Fork::Child, ctx)));

        if let Err(e) = spawned {
            self.table.discard(child_pid);
            return Err(ProcessError::SpawnFailed(e.to_string()));
        }

        Ok(continuation(Fork::Parent(child_pid), self))
    }

    /// Replace this process's image.
    ///
    /// All failure checks happen before anything is touched: on error the
    /// address space, descriptor table, and pid are exactly as they were
    /// and the error is returned normally. On success the address space is
    /// reinitialized, the descriptor table and pid survive, the new image
    /// runs to completion on this thread, and control never returns: the
    /// success type is uninhabited.
    pub fn exec(&self, request: ExecRequest) -> ExecResult<Never> {
        let (path, body) = self
            .registry
            .resolve(&request.program, request.resolution)?;

        let env = match request.env {
            EnvMode::Inherit => self.image().map(|image| image.env).unwrap_or_default(),
            EnvMode::Explicit(env) => env,
        };
        let image = ProcessImage::new(path)
            .with_args(request.args)
            .with_env(env);

        info!("Pid {} exec {}", self.pid, image.program);
        self.table.replace_image(self.pid, image);

        let code = body(self);
        exit_process(code)
    }

    /// Terminate this process immediately with `code`, unwinding the
    /// calling continuation (the `_exit` analogue)
    pub fn exit(&self, code: ExitCode) -> ! {
        exit_process(code)
    }

    /// Block until any child terminates; returns its pid and status
    pub fn wait_any(&self) -> ProcessResult<(Pid, ExitStatus)> {
        self.table.wait_any(self.pid)
    }

    /// Block until the named child terminates; returns its status
    pub fn wait_for(&self, pid: Pid) -> ProcessResult<ExitStatus> {
        self.table.wait_for(self.pid, pid)
    }
}

impl Clone for ProcessContext {
    fn clone(&self) -> Self {
        self.for_pid(self.pid)
    }
}

impl std::fmt::Debug for ProcessContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessContext")
            .field("pid", &self.pid)
            .finish()
    }
}
