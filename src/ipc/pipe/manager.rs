/*!
 * Pipe Manager
 * Central manager for pid-bound unidirectional pipes
 */

use super::super::types::{PipeError, PipeId, PipeResult, PipeStats};
use super::pipe::Pipe;
use crate::core::types::{Pid, SimConfig, Size};
use crossbeam_queue::SegQueue;
use dashmap::DashMap;
use log::info;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

struct ManagedPipe {
    pipe: Arc<Pipe>,
    reader_pid: Pid,
    writer_pid: Pid,
}

/// Pipe manager
///
/// Each pipe has a fixed reader pid and writer pid; the manager enforces
/// end ownership on every operation. Destroyed pipe ids are recycled
/// through a lock-free free list.
pub struct PipeManager {
    pipes: Arc<DashMap<PipeId, ManagedPipe>>,
    next_id: Arc<AtomicU32>,
    free_ids: Arc<SegQueue<PipeId>>,
    config: SimConfig,
}

impl PipeManager {
    pub fn new(config: SimConfig) -> Self {
        info!(
            "Pipe manager initialized (default capacity: {}, max pipes: {})",
            config.default_pipe_capacity, config.max_pipes
        );
        Self {
            pipes: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU32::new(1)),
            free_ids: Arc::new(SegQueue::new()),
            config,
        }
    }

    pub fn create(
        &self,
        reader_pid: Pid,
        writer_pid: Pid,
        capacity: Option<Size>,
    ) -> PipeResult<PipeId> {
        let current = self.pipes.len();
        if current >= self.config.max_pipes {
            return Err(PipeError::LimitReached {
                current,
                limit: self.config.max_pipes,
            });
        }

        let capacity = capacity
            .unwrap_or(self.config.default_pipe_capacity)
            .min(self.config.max_pipe_capacity)
            .max(1);

        // Recycle an id from the free list when one is available
        let pipe_id = match self.free_ids.pop() {
            Some(recycled) => recycled,
            None => self.next_id.fetch_add(1, Ordering::SeqCst),
        };

        self.pipes.insert(
            pipe_id,
            ManagedPipe {
                pipe: Arc::new(Pipe::new(capacity)),
                reader_pid,
                writer_pid,
            },
        );
        info!(
            "Created pipe {} (reader: {}, writer: {}, capacity: {} bytes)",
            pipe_id, reader_pid, writer_pid, capacity
        );
        Ok(pipe_id)
    }

    /// The pipe's channel, with the entry guard released so blocking
    /// operations never hold a map shard
    fn channel(&self, pipe_id: PipeId) -> PipeResult<(Arc<Pipe>, Pid, Pid)> {
        let entry = self
            .pipes
            .get(&pipe_id)
            .ok_or(PipeError::NotFound(pipe_id))?;
        Ok((
            Arc::clone(&entry.pipe),
            entry.reader_pid,
            entry.writer_pid,
        ))
    }

    /// Write through the pipe's write end; blocks while the buffer is full
    pub fn write(&self, pipe_id: PipeId, pid: Pid, data: &[u8]) -> PipeResult<Size> {
        let (pipe, _, writer_pid) = self.channel(pipe_id)?;
        if writer_pid != pid {
            return Err(PipeError::PermissionDenied("Not the write end".to_string()));
        }
        pipe.write(data)
    }

    /// Read from the pipe's read end; blocks until data or end-of-stream
    pub fn read(&self, pipe_id: PipeId, pid: Pid, max: Size) -> PipeResult<Vec<u8>> {
        let (pipe, reader_pid, _) = self.channel(pipe_id)?;
        if reader_pid != pid {
            return Err(PipeError::PermissionDenied("Not the read end".to_string()));
        }
        pipe.read(max)
    }

    /// Close whichever end `pid` owns. Once both ends are closed the pipe
    /// is destroyed and its id recycled.
    pub fn close(&self, pipe_id: PipeId, pid: Pid) -> PipeResult<()> {
        let (pipe, reader_pid, writer_pid) = self.channel(pipe_id)?;
        if pid == writer_pid {
            pipe.close_write();
        } else if pid == reader_pid {
            pipe.close_read();
        } else {
            return Err(PipeError::PermissionDenied(
                "Not a pipe endpoint".to_string(),
            ));
        }
        info!("Closed pipe {} end owned by pid {}", pipe_id, pid);

        if pipe.read_closed() && pipe.write_closed() {
            self.destroy(pipe_id)?;
        }
        Ok(())
    }

    pub fn destroy(&self, pipe_id: PipeId) -> PipeResult<()> {
        self.pipes
            .remove(&pipe_id)
            .ok_or(PipeError::NotFound(pipe_id))?;
        self.free_ids.push(pipe_id);
        info!("Destroyed pipe {}", pipe_id);
        Ok(())
    }

    pub fn stats(&self, pipe_id: PipeId) -> PipeResult<PipeStats> {
        let entry = self
            .pipes
            .get(&pipe_id)
            .ok_or(PipeError::NotFound(pipe_id))?;
        Ok(PipeStats {
            id: pipe_id,
            reader_pid: entry.reader_pid,
            writer_pid: entry.writer_pid,
            capacity: entry.pipe.capacity(),
            buffered: entry.pipe.buffered(),
            read_closed: entry.pipe.read_closed(),
            write_closed: entry.pipe.write_closed(),
        })
    }

    pub fn count(&self) -> usize {
        self.pipes.len()
    }
}

impl Clone for PipeManager {
    fn clone(&self) -> Self {
        Self {
            pipes: Arc::clone(&self.pipes),
            next_id: Arc::clone(&self.next_id), // Share the counter across clones
            free_ids: Arc::clone(&self.free_ids),
            config: self.config.clone(),
        }
    }
}
