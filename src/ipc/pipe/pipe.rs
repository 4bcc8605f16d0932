/*!
 * Pipe Implementation
 * Blocking bounded byte channel with ringbuf-based circular buffer
 *
 * Blocking semantics: a read parks until at least one byte is available or
 * the write end is closed, in which case it returns an empty vector as
 * end-of-stream. A write parks while the buffer is full and fails once
 * either end is closed.
 */

use super::super::types::{PipeError, PipeResult};
use crate::core::types::Size;
use parking_lot::{Condvar, Mutex};
use ringbuf::{traits::*, HeapRb};

struct PipeState {
    buffer: HeapRb<u8>,
    read_closed: bool,
    write_closed: bool,
}

pub(crate) struct Pipe {
    capacity: Size,
    state: Mutex<PipeState>,
    readable: Condvar,
    writable: Condvar,
}

impl Pipe {
    pub fn new(capacity: Size) -> Self {
        Self {
            capacity,
            state: Mutex::new(PipeState {
                buffer: HeapRb::<u8>::new(capacity),
                read_closed: false,
                write_closed: false,
            }),
            readable: Condvar::new(),
            writable: Condvar::new(),
        }
    }

    pub fn capacity(&self) -> Size {
        self.capacity
    }

    pub fn buffered(&self) -> Size {
        self.state.lock().buffer.occupied_len()
    }

    pub fn read_closed(&self) -> bool {
        self.state.lock().read_closed
    }

    pub fn write_closed(&self) -> bool {
        self.state.lock().write_closed
    }

    /// Write as much of `data` as fits, parking while the buffer is full.
    /// Returns the number of bytes accepted (at least one for non-empty
    /// input). Fails with `Closed` once either end is closed.
    pub fn write(&self, data: &[u8]) -> PipeResult<Size> {
        if data.is_empty() {
            return Ok(0);
        }

        let mut state = self.state.lock();
        loop {
            if state.write_closed || state.read_closed {
                return Err(PipeError::Closed);
            }
            if state.buffer.vacant_len() > 0 {
                let written = state.buffer.push_slice(data);
                self.readable.notify_all();
                return Ok(written);
            }
            self.writable.wait(&mut state);
        }
    }

    /// Read up to `max` bytes, parking while the buffer is empty and the
    /// write end is open. An empty vector is end-of-stream.
    pub fn read(&self, max: Size) -> PipeResult<Vec<u8>> {
        let mut state = self.state.lock();
        loop {
            if state.read_closed {
                return Err(PipeError::Closed);
            }
            if !state.buffer.is_empty() {
                let to_read = max.min(state.buffer.occupied_len());
                let mut data = vec![0u8; to_read];
                let read = state.buffer.pop_slice(&mut data);
                data.truncate(read);
                self.writable.notify_all();
                return Ok(data);
            }
            if state.write_closed {
                return Ok(Vec::new()); // EOF
            }
            self.readable.wait(&mut state);
        }
    }

    /// Close the write end: drained readers see end-of-stream
    pub fn close_write(&self) {
        let mut state = self.state.lock();
        state.write_closed = true;
        drop(state);
        self.readable.notify_all();
        self.writable.notify_all();
    }

    /// Close the read end: subsequent writes fail with `Closed`
    pub fn close_read(&self) {
        let mut state = self.state.lock();
        state.read_closed = true;
        drop(state);
        self.readable.notify_all();
        self.writable.notify_all();
    }
}

impl std::fmt::Debug for Pipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Pipe")
            .field("capacity", &self.capacity)
            .field("buffered", &state.buffer.occupied_len())
            .field("read_closed", &state.read_closed)
            .field("write_closed", &state.write_closed)
            .finish()
    }
}
