/*!
 * procsim - Demo Entry Point
 *
 * Replays the classic process-control teaching programs through the
 * simulator: private memory across spawn, shared descriptor offsets,
 * pipe-based ordering without wait, the exec variant matrix, wait/waitpid,
 * and descriptor-close independence.
 */

use std::collections::HashMap;
use std::error::Error;

use procsim::{
    ExecRequest, Fork, OpenFlags, SignalPipe, Simulator, EXEC_FAILURE_CODE, STDOUT_FD,
};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    fork_private_memory()?;
    shared_offset_append()?;
    shared_offset_racy()?;
    pipe_ordering_without_wait()?;
    exec_variants()?;
    wait_for_any_child()?;
    wait_for_named_child()?;
    closed_descriptor_is_private()?;

    Ok(())
}

fn banner(title: &str) {
    println!("\n=== {} ===", title);
}

/// question1: spawn deep-copies the address space, so each side's
/// mutation of x is invisible to the other
fn fork_private_memory() -> Result<(), Box<dyn Error>> {
    banner("spawn copies memory: x is private to each side");
    let sim = Simulator::new();

    sim.run_root(|ctx| {
        ctx.set_var("x", 100).expect("set x");
        ctx.spawn(|branch, ctx| {
            let x = ctx.var("x").expect("read x").unwrap_or(0);
            match branch {
                Fork::Child => {
                    println!("[child] initial x={}", x);
                    ctx.set_var("x", 200).expect("set x");
                    println!(
                        "[child] after change x={}",
                        ctx.var("x").expect("read x").unwrap_or(0)
                    );
                    0
                }
                Fork::Parent(child) => {
                    println!("[parent] initial x={}", x);
                    ctx.set_var("x", 300).expect("set x");
                    println!(
                        "[parent] after change x={}",
                        ctx.var("x").expect("read x").unwrap_or(0)
                    );
                    ctx.wait_for(child).expect("wait");
                    0
                }
            }
        })
        .expect("spawn")
    })?;
    Ok(())
}

/// q2 with O_APPEND: both sides write through the same open file
/// description; append positions each record atomically at end-of-file,
/// so all ten lines land intact (in some order)
fn shared_offset_append() -> Result<(), Box<dyn Error>> {
    banner("append-mode writes through a shared descriptor stay intact");
    let sim = Simulator::new();

    sim.run_root(|ctx| {
        let fd = ctx
            .open(
                "/tmp/q2_output.txt",
                OpenFlags::write_only()
                    .with_create()
                    .with_truncate()
                    .with_append(),
            )
            .expect("open");

        ctx.spawn(move |branch, ctx| {
            let role = match branch {
                Fork::Child => "child",
                Fork::Parent(_) => "parent",
            };
            for i in 0..5 {
                let line = format!("[{}] line {}\n", role, i);
                if let Err(e) = ctx.write(fd, line.as_bytes()) {
                    eprintln!("[{}] write failed: {}", role, e);
                }
            }
            if let Fork::Parent(child) = branch {
                ctx.wait_for(child).expect("wait");
            }
            0
        })
        .expect("spawn")
    })?;

    let contents = sim.store().contents("/tmp/q2_output.txt")?;
    print!("{}", String::from_utf8_lossy(&contents));
    let stat = sim.store().stat("/tmp/q2_output.txt")?;
    println!(
        "({} bytes; every record is whole, parent/child order varies run to run)",
        stat.len
    );
    Ok(())
}

/// q2 without O_APPEND: both sharers read the offset before either
/// writes, so one record overwrites the other. The interleaving is
/// driven explicitly instead of by scheduling jitter.
fn shared_offset_racy() -> Result<(), Box<dyn Error>> {
    banner("non-append writes race on the shared offset and overwrite");
    let sim = Simulator::new();

    sim.run_root(|ctx| {
        let fd = ctx
            .open(
                "/tmp/q2_racy.txt",
                OpenFlags::write_only().with_create().with_truncate(),
            )
            .expect("open");
        let parent_staged = SignalPipe::new();
        let child_committed = SignalPipe::new();

        ctx.spawn(move |branch, ctx| match branch {
            Fork::Child => {
                parent_staged.wait().expect("handshake");
                // Parent already read the offset; this stages the same one
                let staged = ctx.stage_write(fd).expect("stage");
                staged.commit(b"[child] line 0\n").expect("commit");
                child_committed.signal().expect("handshake");
                0
            }
            Fork::Parent(child) => {
                let staged = ctx.stage_write(fd).expect("stage");
                parent_staged.signal().expect("handshake");
                child_committed.wait().expect("handshake");
                // Stale offset: this lands on top of the child's record
                staged.commit(b"[parent] line 0\n").expect("commit");
                ctx.wait_for(child).expect("wait");
                0
            }
        })
        .expect("spawn")
    })?;

    let contents = sim.store().contents("/tmp/q2_racy.txt")?;
    print!("{}", String::from_utf8_lossy(&contents));
    println!("(both sides wrote one line; the child's was overwritten)");
    Ok(())
}

/// q3: child prints hello strictly before the parent prints goodbye,
/// with a pipe handshake instead of wait
fn pipe_ordering_without_wait() -> Result<(), Box<dyn Error>> {
    banner("pipe handshake orders parent output after child output");
    let sim = Simulator::new();

    sim.run_root(|ctx| {
        let signal = SignalPipe::new();
        ctx.spawn(move |branch, _ctx| match branch {
            Fork::Child => {
                println!("hello");
                signal.signal().expect("signal");
                0
            }
            Fork::Parent(_) => {
                signal.wait().expect("wait for token");
                println!("goodbye");
                0
            }
        })
        .expect("spawn")
    })?;
    Ok(())
}

/// q4: the exec variant matrix. Resolution is direct path or search path,
/// the environment is inherited or replaced; a failed exec returns to the
/// caller, which exits 127 by convention.
fn exec_variants() -> Result<(), Box<dyn Error>> {
    banner("exec variants replace the image; failures exit 127");
    let sim = Simulator::new();

    // A stand-in ls: lists the simulator's file namespace
    sim.registry().install("/bin/ls", |ctx| {
        let image = ctx.image().expect("image");
        println!("ls args: {:?}", image.args);
        for path in ctx.store().list() {
            println!("  {}", path);
        }
        if let Some(flag) = image.env.get("MYFLAG") {
            println!("ls sees MYFLAG={}", flag);
        }
        0
    });

    let env = |variant: &str| {
        HashMap::from([
            ("LC_ALL".to_string(), "C".to_string()),
            ("MYFLAG".to_string(), variant.to_string()),
        ])
    };

    let variants: Vec<(&str, ExecRequest)> = vec![
        ("execl", ExecRequest::direct("/bin/ls").with_args(vec!["-l".into()])),
        (
            "execle",
            ExecRequest::direct("/bin/ls")
                .with_args(vec!["-a".into()])
                .with_env(env("execle")),
        ),
        ("execlp", ExecRequest::path_search("ls").with_args(vec!["-1".into()])),
        ("execv", ExecRequest::direct("/bin/ls").with_args(vec!["-l".into()])),
        ("execvp", ExecRequest::path_search("ls").with_args(vec!["-a".into()])),
        (
            "execvpe",
            ExecRequest::path_search("ls").with_env(env("execvpe")),
        ),
        ("missing", ExecRequest::path_search("no-such-tool")),
    ];

    for (label, request) in variants {
        sim.run_root(move |ctx| {
            ctx.spawn(move |branch, ctx| match branch {
                Fork::Child => match ctx.exec(request.clone()) {
                    Err(e) => {
                        eprintln!("{}: {}", label, e);
                        EXEC_FAILURE_CODE
                    }
                    // A successful exec never returns
                    Ok(never) => match never {},
                },
                Fork::Parent(child) => {
                    let status = ctx.wait_for(child).expect("wait");
                    println!("{:<10} -> {}", label, status);
                    0
                }
            })
            .expect("spawn")
        })?;
    }
    Ok(())
}

/// q5: wait for whichever child finishes first and decode its status
fn wait_for_any_child() -> Result<(), Box<dyn Error>> {
    banner("wait_any retrieves a child's pid and exit status");
    let sim = Simulator::new();

    sim.run_root(|ctx| {
        ctx.spawn(|branch, ctx| match branch {
            Fork::Child => {
                println!("Child running...");
                7
            }
            Fork::Parent(_) => {
                let (pid, status) = ctx.wait_any().expect("wait_any");
                println!("Parent: wait_any() returned pid={}", pid);
                println!("Parent: child {}", status);
                0
            }
        })
        .expect("spawn")
    })?;
    Ok(())
}

/// q6: wait for one specific child by pid
fn wait_for_named_child() -> Result<(), Box<dyn Error>> {
    banner("wait_for blocks on one named child");
    let sim = Simulator::new();

    sim.run_root(|ctx| {
        ctx.spawn(|branch, ctx| match branch {
            Fork::Child => {
                println!("Child running...");
                5
            }
            Fork::Parent(child) => {
                let status = ctx.wait_for(child).expect("wait_for");
                println!("Parent: wait_for() returned pid={}", child);
                println!("Parent: child {}", status);
                0
            }
        })
        .expect("spawn")
    })?;
    Ok(())
}

/// q7: handles are per-process even when the descriptions are shared;
/// the child closing stdout does not touch the parent's stdout
fn closed_descriptor_is_private() -> Result<(), Box<dyn Error>> {
    banner("closing a descriptor in the child leaves the parent's intact");
    let sim = Simulator::new();

    sim.run_root(|ctx| {
        ctx.spawn(|branch, ctx| match branch {
            Fork::Child => {
                ctx.close(STDOUT_FD).expect("close");
                if let Err(e) = ctx.write(STDOUT_FD, b"This will not be printed\n") {
                    eprintln!("[child] write after close failed: {}", e);
                }
                0
            }
            Fork::Parent(child) => {
                ctx.write(STDOUT_FD, b"Parent still has stdout\n")
                    .expect("write");
                ctx.wait_for(child).expect("wait");
                0
            }
        })
        .expect("spawn")
    })?;

    let contents = sim.store().contents("/dev/stdout")?;
    print!("{}", String::from_utf8_lossy(&contents));
    Ok(())
}
