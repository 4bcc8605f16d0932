/*!
 * Blocking Primitives
 * Keyed wait/notify used by the process table for child-exit waits
 */

mod wait;

pub use wait::WaitQueue;
