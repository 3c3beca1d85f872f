//! Futex-backed counting semaphore for x86_64 Linux.
//!
//! The count itself is the futex word: `wait` CAS-decrements a positive
//! count or parks on zero, `post` increments and wakes one waiter. The
//! kernel re-validates the word under its own lock before parking, so a
//! post that lands between our load and the wait cannot be lost.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::syscall;

/// Counting semaphore backed by a single futex word.
#[derive(Debug)]
pub struct Semaphore {
    count: AtomicU32,
}

impl Semaphore {
    /// Create a semaphore holding `initial` permits.
    #[must_use]
    pub const fn new(initial: u32) -> Self {
        Self {
            count: AtomicU32::new(initial),
        }
    }

    /// Block until a permit is available, then take it.
    pub fn wait(&self) {
        loop {
            let observed = self.count.load(Ordering::Acquire);
            if observed > 0 {
                if self
                    .count
                    .compare_exchange_weak(
                        observed,
                        observed - 1,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    )
                    .is_ok()
                {
                    return;
                }
                continue;
            }
            // SAFETY: the futex word is this semaphore's own count and
            // outlives the call. EAGAIN (count moved under us) and EINTR
            // (signal) both fall through to the re-check above.
            let _ = unsafe { syscall::sys_futex_wait(self.count.as_ptr(), 0) };
        }
    }

    /// Release one permit and wake one parked waiter, if any.
    pub fn post(&self) {
        self.count.fetch_add(1, Ordering::Release);
        // SAFETY: the futex word is this semaphore's own count; waking a
        // word nobody is parked on is a no-op.
        let _ = unsafe { syscall::sys_futex_wake(self.count.as_ptr(), 1) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn initial_permits_are_consumable_without_blocking() {
        let sem = Semaphore::new(2);
        sem.wait();
        sem.wait();
    }

    #[test]
    fn post_before_wait_does_not_block() {
        let sem = Semaphore::new(0);
        sem.post();
        sem.wait();
    }

    #[test]
    fn wait_parks_until_posted() {
        let sem = Arc::new(Semaphore::new(0));
        let waiter = {
            let sem = Arc::clone(&sem);
            thread::spawn(move || {
                sem.wait();
                true
            })
        };
        // Give the waiter a chance to actually park before releasing it.
        thread::sleep(Duration::from_millis(50));
        sem.post();
        assert!(waiter.join().expect("waiter thread panicked"));
    }

    #[test]
    fn every_post_releases_exactly_one_waiter() {
        let sem = Arc::new(Semaphore::new(0));
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let sem = Arc::clone(&sem);
                thread::spawn(move || sem.wait())
            })
            .collect();
        for _ in 0..4 {
            sem.post();
        }
        for waiter in waiters {
            waiter.join().expect("waiter thread panicked");
        }
    }
}
