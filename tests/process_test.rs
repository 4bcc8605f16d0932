/*!
 * Process Tests
 * Tests for root creation, spawn duplication semantics, and lifecycle
 */

use pretty_assertions::assert_eq;
use procsim::{Fork, ProcessError, ProcessState, SignalPipe, SimConfig, Simulator};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Spin until the pid's record reports Terminated (the child finished but
/// nobody waited yet)
fn wait_until_zombie(sim: &Simulator, pid: procsim::Pid) {
    for _ in 0..500 {
        if let Some(info) = sim.processes().info(pid) {
            if info.state == ProcessState::Terminated {
                return;
            }
        }
        thread::sleep(Duration::from_millis(2));
    }
    panic!("pid {} never terminated", pid);
}

#[test]
fn test_root_creation() {
    let sim = Simulator::new();
    let ctx = sim.spawn_root().unwrap();

    assert_eq!(ctx.pid(), 1);

    let info = ctx.info().unwrap();
    assert_eq!(info.parent_pid, 0);
    assert_eq!(info.program, "init");
    assert_eq!(info.state, ProcessState::Running);
    assert_eq!(info.exit_status, None);

    let second = sim.spawn_root().unwrap();
    assert_eq!(second.pid(), 2);
}

#[test]
fn test_spawn_copies_address_space_both_ways() {
    let sim = Simulator::new();
    let ctx = sim.spawn_root().unwrap();
    ctx.set_var("x", 100).unwrap();

    let parent_mutated = SignalPipe::new();

    ctx.spawn(move |branch, ctx| match branch {
        Fork::Child => {
            // Child starts from a deep copy of the parent's variables
            if ctx.var("x").unwrap() != Some(100) {
                return 1;
            }
            ctx.set_var("x", 200).unwrap();
            // The parent has mutated its own copy by now; ours is untouched
            parent_mutated.wait().unwrap();
            if ctx.var("x").unwrap() != Some(200) {
                return 2;
            }
            0
        }
        Fork::Parent(child) => {
            ctx.set_var("x", 300).unwrap();
            parent_mutated.signal().unwrap();
            let status = ctx.wait_for(child).unwrap();
            assert_eq!(status.code(), 0, "child-side isolation check failed");
            0
        }
    })
    .unwrap();

    // The child's mutation to 200 never reached the parent
    assert_eq!(ctx.var("x").unwrap(), Some(300));
}

#[test]
fn test_spawn_respects_process_limit() {
    let sim = Simulator::with_config(SimConfig::new().with_max_processes(2));
    let ctx = sim.spawn_root().unwrap();

    ctx.spawn(|branch, ctx| match branch {
        Fork::Child => 0,
        Fork::Parent(child) => {
            // Root plus unwaited child fill the table
            let attempt = ctx.spawn(|_, _| 0);
            assert!(matches!(
                attempt,
                Err(ProcessError::LimitReached {
                    current: 2,
                    limit: 2
                })
            ));
            ctx.wait_for(child).unwrap();
            0
        }
    })
    .unwrap();
}

#[test]
fn test_terminated_child_stays_until_waited() {
    let sim = Simulator::new();
    let ctx = sim.spawn_root().unwrap();
    let child_pid = Arc::new(Mutex::new(0));

    let recorded = Arc::clone(&child_pid);
    ctx.spawn(move |branch, _ctx| match branch {
        Fork::Child => 7,
        Fork::Parent(child) => {
            *recorded.lock().unwrap() = child;
            0
        }
    })
    .unwrap();

    let child = *child_pid.lock().unwrap();
    wait_until_zombie(&sim, child);

    // The record is retained with its status pending
    assert_eq!(sim.processes().count(), 2);
    let info = sim.processes().info(child).unwrap();
    assert_eq!(info.state, ProcessState::Terminated);
    assert_eq!(info.exit_status.map(|s| s.code()), Some(7));

    // Consuming the status removes the record
    let status = ctx.wait_for(child).unwrap();
    assert_eq!(status.code(), 7);
    assert!(sim.processes().info(child).is_none());
}

#[test]
fn test_spawn_inherits_image() {
    let sim = Simulator::new();
    let ctx = sim.spawn_root().unwrap();

    ctx.spawn(|branch, ctx| match branch {
        Fork::Child => {
            // Same program continues on both sides of the split
            if ctx.image().unwrap().program != "init" {
                return 1;
            }
            if ctx.parent_pid().unwrap() != 1 {
                return 2;
            }
            0
        }
        Fork::Parent(child) => {
            let status = ctx.wait_for(child).unwrap();
            assert_eq!(status.code(), 0);
            0
        }
    })
    .unwrap();
}

#[test]
fn test_list_processes() {
    let sim = Simulator::new();
    let first = sim.spawn_root().unwrap();
    let second = sim.spawn_root().unwrap();

    let infos = sim.processes().list();
    assert_eq!(infos.len(), 2);
    assert_eq!(infos[0].pid, first.pid());
    assert_eq!(infos[1].pid, second.pid());
}

#[test]
fn test_lookup_of_unknown_pid() {
    let sim = Simulator::new();
    assert!(sim.processes().info(999).is_none());
    assert!(matches!(
        sim.processes().image(999),
        Err(ProcessError::NotFound(999))
    ));
}
