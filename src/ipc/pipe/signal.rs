/*!
 * Signal Pipe
 * One-shot ordering handshake between two sides of a spawn
 *
 * The producer writes a single token and closes its end; the consumer
 * blocks for the token (or end-of-stream). Whatever the consumer does
 * after `wait` returns is therefore ordered after whatever the producer
 * did before `signal`. This is how a parent sequences its output after a
 * child's without calling wait on the child.
 */

use super::super::types::PipeResult;
use super::pipe::Pipe;
use std::sync::Arc;

const TOKEN: &[u8] = b"x";

/// One-shot signal channel. Created before the spawn so both sides of the
/// split capture it; clones share the underlying channel.
pub struct SignalPipe {
    pipe: Arc<Pipe>,
}

impl SignalPipe {
    pub fn new() -> Self {
        Self {
            pipe: Arc::new(Pipe::new(1)),
        }
    }

    /// Producer side: deliver the token and close the write end. One-shot:
    /// signalling twice fails with `Closed`.
    pub fn signal(&self) -> PipeResult<()> {
        self.pipe.write(TOKEN)?;
        self.pipe.close_write();
        Ok(())
    }

    /// Consumer side: block until the token (or end-of-stream) arrives
    pub fn wait(&self) -> PipeResult<()> {
        self.pipe.read(TOKEN.len()).map(|_| ())
    }
}

impl Clone for SignalPipe {
    fn clone(&self) -> Self {
        Self {
            pipe: Arc::clone(&self.pipe),
        }
    }
}

impl Default for SignalPipe {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::PipeError;
    use std::thread;

    #[test]
    fn test_signal_then_wait() {
        let signal = SignalPipe::new();
        signal.signal().unwrap();
        signal.wait().unwrap();
    }

    #[test]
    fn test_wait_blocks_until_signal() {
        let signal = SignalPipe::new();
        let waiter = {
            let signal = signal.clone();
            thread::spawn(move || signal.wait())
        };
        signal.signal().unwrap();
        waiter.join().unwrap().unwrap();
    }

    #[test]
    fn test_signal_is_one_shot() {
        let signal = SignalPipe::new();
        signal.signal().unwrap();
        assert!(matches!(signal.signal(), Err(PipeError::Closed)));
    }
}
