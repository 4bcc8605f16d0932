/*!
 * Pipe Tests
 * Tests for blocking pipe IPC and the one-shot ordering handshake
 */

use pretty_assertions::assert_eq;
use procsim::{Fork, PipeError, PipeManager, SignalPipe, SimConfig, Simulator};
use serial_test::serial;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[test]
fn test_basic_pipe_create() {
    let pm = PipeManager::new(SimConfig::default());

    let reader_pid = 100;
    let writer_pid = 200;

    let pipe_id = pm.create(reader_pid, writer_pid, None).unwrap();
    assert!(pipe_id > 0);
}

#[test]
fn test_pipe_write_read() {
    let pm = PipeManager::new(SimConfig::default());

    let reader_pid = 100;
    let writer_pid = 200;

    let pipe_id = pm.create(reader_pid, writer_pid, None).unwrap();

    let data = b"Hello through pipe!";
    let written = pm.write(pipe_id, writer_pid, data).unwrap();
    assert_eq!(written, data.len());

    let read_data = pm.read(pipe_id, reader_pid, data.len()).unwrap();
    assert_eq!(read_data, data);
}

#[test]
fn test_pipe_streaming() {
    let pm = PipeManager::new(SimConfig::default());

    let reader_pid = 100;
    let writer_pid = 200;

    let pipe_id = pm.create(reader_pid, writer_pid, None).unwrap();

    pm.write(pipe_id, writer_pid, b"chunk1").unwrap();
    pm.write(pipe_id, writer_pid, b"chunk2").unwrap();
    pm.write(pipe_id, writer_pid, b"chunk3").unwrap();

    assert_eq!(pm.read(pipe_id, reader_pid, 6).unwrap(), b"chunk1");
    assert_eq!(pm.read(pipe_id, reader_pid, 6).unwrap(), b"chunk2");
    assert_eq!(pm.read(pipe_id, reader_pid, 6).unwrap(), b"chunk3");
}

#[test]
fn test_pipe_permissions() {
    let pm = PipeManager::new(SimConfig::default());

    let reader_pid = 100;
    let writer_pid = 200;
    let other_pid = 300;

    let pipe_id = pm.create(reader_pid, writer_pid, None).unwrap();

    // Writer can't read
    let result = pm.read(pipe_id, writer_pid, 100);
    assert!(matches!(result, Err(PipeError::PermissionDenied(_))));

    // Reader can't write
    let result = pm.write(pipe_id, reader_pid, b"test");
    assert!(matches!(result, Err(PipeError::PermissionDenied(_))));

    // Other process can't touch either end
    let result = pm.write(pipe_id, other_pid, b"test");
    assert!(matches!(result, Err(PipeError::PermissionDenied(_))));

    let result = pm.close(pipe_id, other_pid);
    assert!(matches!(result, Err(PipeError::PermissionDenied(_))));
}

#[test]
fn test_closed_write_end_yields_eof_after_drain() {
    let pm = PipeManager::new(SimConfig::default());

    let reader_pid = 100;
    let writer_pid = 200;

    let pipe_id = pm.create(reader_pid, writer_pid, None).unwrap();
    pm.write(pipe_id, writer_pid, b"tail").unwrap();
    pm.close(pipe_id, writer_pid).unwrap();

    // Buffered bytes are still readable; then end-of-stream
    assert_eq!(pm.read(pipe_id, reader_pid, 4).unwrap(), b"tail");
    assert_eq!(pm.read(pipe_id, reader_pid, 4).unwrap(), Vec::<u8>::new());
}

#[test]
fn test_write_after_read_end_closed() {
    let pm = PipeManager::new(SimConfig::default());

    let reader_pid = 100;
    let writer_pid = 200;

    let pipe_id = pm.create(reader_pid, writer_pid, None).unwrap();
    pm.close(pipe_id, reader_pid).unwrap();

    let result = pm.write(pipe_id, writer_pid, b"lost");
    assert!(matches!(result, Err(PipeError::Closed)));
}

#[test]
#[serial]
fn test_read_blocks_until_data_arrives() {
    let pm = PipeManager::new(SimConfig::default());

    let reader_pid = 100;
    let writer_pid = 200;

    let pipe_id = pm.create(reader_pid, writer_pid, None).unwrap();

    let reader = {
        let pm = pm.clone();
        thread::spawn(move || pm.read(pipe_id, reader_pid, 5).unwrap())
    };

    thread::sleep(Duration::from_millis(30));
    assert!(!reader.is_finished());

    pm.write(pipe_id, writer_pid, b"wake!").unwrap();
    assert_eq!(reader.join().unwrap(), b"wake!");
}

#[test]
#[serial]
fn test_write_blocks_while_full() {
    let pm = PipeManager::new(SimConfig::default());

    let reader_pid = 100;
    let writer_pid = 200;

    let pipe_id = pm.create(reader_pid, writer_pid, Some(4)).unwrap();
    assert_eq!(pm.write(pipe_id, writer_pid, b"full").unwrap(), 4);

    let writer = {
        let pm = pm.clone();
        thread::spawn(move || pm.write(pipe_id, writer_pid, b"x").unwrap())
    };

    thread::sleep(Duration::from_millis(30));
    assert!(!writer.is_finished());

    pm.read(pipe_id, reader_pid, 2).unwrap();
    assert_eq!(writer.join().unwrap(), 1);
}

#[test]
fn test_pipe_limit() {
    let pm = PipeManager::new(SimConfig::new().with_max_pipes(2));

    pm.create(1, 2, None).unwrap();
    pm.create(3, 4, None).unwrap();
    let result = pm.create(5, 6, None);
    assert!(matches!(
        result,
        Err(PipeError::LimitReached {
            current: 2,
            limit: 2
        })
    ));
}

#[test]
fn test_destroyed_pipe_id_is_recycled() {
    let pm = PipeManager::new(SimConfig::default());

    let first = pm.create(1, 2, None).unwrap();
    pm.destroy(first).unwrap();
    let second = pm.create(3, 4, None).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_closing_both_ends_destroys_the_pipe() {
    let pm = PipeManager::new(SimConfig::default());

    let pipe_id = pm.create(100, 200, None).unwrap();
    pm.close(pipe_id, 200).unwrap();
    assert_eq!(pm.count(), 1);
    pm.close(pipe_id, 100).unwrap();
    assert_eq!(pm.count(), 0);
    assert!(matches!(pm.stats(pipe_id), Err(PipeError::NotFound(_))));
}

#[test]
fn test_pipe_stats() {
    let pm = PipeManager::new(SimConfig::default());

    let pipe_id = pm.create(100, 200, Some(64)).unwrap();
    pm.write(pipe_id, 200, b"abcde").unwrap();

    let stats = pm.stats(pipe_id).unwrap();
    assert_eq!(stats.reader_pid, 100);
    assert_eq!(stats.writer_pid, 200);
    assert_eq!(stats.capacity, 64);
    assert_eq!(stats.buffered, 5);
    assert!(!stats.read_closed);
    assert!(!stats.write_closed);
}

/// The ordering invariant: over repeated trials the consumer's post-wait
/// side effect always lands after the producer's pre-signal side effect,
/// with no wait on the child involved.
#[test]
#[serial]
fn test_handshake_orders_hello_before_goodbye() {
    for _ in 0..100 {
        let sim = Simulator::new();
        let ctx = sim.spawn_root().unwrap();
        let events: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        let signal = SignalPipe::new();

        let log = Arc::clone(&events);
        ctx.spawn(move |branch, _ctx| match branch {
            Fork::Child => {
                log.lock().unwrap().push("hello");
                signal.signal().unwrap();
                0
            }
            Fork::Parent(_) => {
                signal.wait().unwrap();
                log.lock().unwrap().push("goodbye");
                0
            }
        })
        .unwrap();

        assert_eq!(*events.lock().unwrap(), vec!["hello", "goodbye"]);
    }
}
