//! Portable counting semaphore over a mutex/condvar pair.

use parking_lot::{Condvar, Mutex};

/// Counting semaphore for targets without the futex fast path.
#[derive(Debug)]
pub struct Semaphore {
    count: Mutex<u32>,
    available: Condvar,
}

impl Semaphore {
    /// Create a semaphore holding `initial` permits.
    #[must_use]
    pub const fn new(initial: u32) -> Self {
        Self {
            count: Mutex::new(initial),
            available: Condvar::new(),
        }
    }

    /// Block until a permit is available, then take it.
    pub fn wait(&self) {
        let mut count = self.count.lock();
        while *count == 0 {
            self.available.wait(&mut count);
        }
        *count -= 1;
    }

    /// Release one permit and wake one parked waiter, if any.
    pub fn post(&self) {
        let mut count = self.count.lock();
        *count += 1;
        self.available.notify_one();
    }
}
