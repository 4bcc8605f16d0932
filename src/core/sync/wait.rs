/*!
 * Wait Queue
 * Condvar-backed blocking wait on arbitrary keys
 *
 * A waiter re-checks its readiness predicate under the slot lock before
 * every sleep, and wakers bump the slot under the same lock, so a wake
 * that races with a check is never lost.
 */

use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

struct WaitSlot {
    lock: Mutex<()>,
    condvar: Condvar,
}

impl WaitSlot {
    fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            condvar: Condvar::new(),
        }
    }
}

/// Blocking wait/notify keyed by `K` (a pid, a pipe id)
pub struct WaitQueue<K>
where
    K: Eq + Hash + Copy,
{
    slots: Mutex<HashMap<K, Arc<WaitSlot>>>,
}

impl<K> WaitQueue<K>
where
    K: Eq + Hash + Copy,
{
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, key: K) -> Arc<WaitSlot> {
        let mut slots = self.slots.lock();
        Arc::clone(slots.entry(key).or_insert_with(|| Arc::new(WaitSlot::new())))
    }

    /// Block until `ready` yields a value.
    ///
    /// `ready` is evaluated under the slot lock: once it returns `None` the
    /// caller sleeps until the next `wake_all(key)`, then re-checks. State
    /// mutations made before a wake are therefore always observed.
    pub fn wait_until<T>(&self, key: K, mut ready: impl FnMut() -> Option<T>) -> T {
        let slot = self.slot(key);
        let mut guard = slot.lock.lock();
        loop {
            if let Some(value) = ready() {
                return value;
            }
            slot.condvar.wait(&mut guard);
        }
    }

    /// Wake every waiter parked on `key`.
    pub fn wake_all(&self, key: K) {
        let slot = self.slot(key);
        drop(slot.lock.lock());
        slot.condvar.notify_all();
    }
}

impl<K> Default for WaitQueue<K>
where
    K: Eq + Hash + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_wait_returns_immediately_when_ready() {
        let queue = WaitQueue::new();
        let value = queue.wait_until(1u32, || Some(42));
        assert_eq!(value, 42);
    }

    #[test]
    fn test_wake_unblocks_waiter() {
        let queue = Arc::new(WaitQueue::new());
        let flag = Arc::new(AtomicBool::new(false));

        let waiter = {
            let queue = Arc::clone(&queue);
            let flag = Arc::clone(&flag);
            thread::spawn(move || {
                queue.wait_until(7u32, || flag.load(Ordering::SeqCst).then_some(()))
            })
        };

        thread::sleep(Duration::from_millis(20));
        flag.store(true, Ordering::SeqCst);
        queue.wake_all(7u32);

        waiter.join().unwrap();
    }

    #[test]
    fn test_wake_on_other_key_is_ignored() {
        let queue = Arc::new(WaitQueue::new());
        let flag = Arc::new(AtomicBool::new(false));

        let waiter = {
            let queue = Arc::clone(&queue);
            let flag = Arc::clone(&flag);
            thread::spawn(move || {
                queue.wait_until(1u32, || flag.load(Ordering::SeqCst).then_some(()))
            })
        };

        // A wake on an unrelated key must not satisfy the waiter
        queue.wake_all(2u32);
        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());

        flag.store(true, Ordering::SeqCst);
        queue.wake_all(1u32);
        waiter.join().unwrap();
    }
}
