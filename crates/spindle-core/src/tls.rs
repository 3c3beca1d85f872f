//! One pointer-sized storage slot per OS thread, behind an OS TLS key.

use std::ffi::c_void;

use crate::sys;

/// Owns one OS thread-local storage key.
///
/// Every OS thread sees its own pointer-sized value through the same slot;
/// a thread that never stored one reads null. The stored value is opaque —
/// the slot neither dereferences it nor frees it. Dropping the slot releases
/// the key and invalidates all further access through it.
#[derive(Debug)]
pub struct TlsSlot {
    key: sys::RawTlsKey,
}

impl TlsSlot {
    /// Allocate a fresh OS key.
    ///
    /// # Panics
    ///
    /// Panics with the OS error when the platform has no keys left — a slot
    /// without a key cannot uphold any of its guarantees.
    #[must_use]
    pub fn new() -> Self {
        match sys::tls_create() {
            Ok(key) => Self { key },
            Err(errno) => panic!("TLS key allocation failed (errno {errno})"),
        }
    }

    /// The calling thread's value, or null when this thread never stored one.
    #[must_use]
    pub fn get(&self) -> *mut c_void {
        sys::tls_get(self.key)
    }

    /// Store a value visible only to later [`get`](TlsSlot::get) calls from
    /// the same calling thread.
    pub fn set(&self, value: *mut c_void) {
        sys::tls_set(self.key, value);
    }
}

impl Default for TlsSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TlsSlot {
    fn drop(&mut self) {
        let released = sys::tls_destroy(self.key);
        debug_assert!(
            released.is_ok(),
            "TLS key release rejected: {released:?}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::Thread;

    #[test]
    fn unset_slot_reads_null() {
        let slot = TlsSlot::new();
        assert!(slot.get().is_null());
    }

    #[test]
    fn set_then_get_round_trips_on_one_thread() {
        let slot = TlsSlot::new();
        slot.set(0x1111 as *mut c_void);
        assert_eq!(slot.get() as usize, 0x1111);
        slot.set(0x2222 as *mut c_void);
        assert_eq!(slot.get() as usize, 0x2222, "later stores replace earlier ones");
    }

    #[test]
    fn threads_never_observe_each_others_value() {
        let slot = TlsSlot::new();
        slot.set(0x7070 as *mut c_void);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                assert!(slot.get().is_null(), "a fresh thread must read null");
                slot.set(0x1111 as *mut c_void);
                assert_eq!(slot.get() as usize, 0x1111);
            });
            scope.spawn(|| {
                slot.set(0x2222 as *mut c_void);
                assert_eq!(slot.get() as usize, 0x2222);
            });
        });

        assert_eq!(
            slot.get() as usize,
            0x7070,
            "the spawning thread's value must survive the others"
        );
    }

    struct TagContext<'a> {
        slot: &'a TlsSlot,
        tag: usize,
    }

    /// Stores a tag, yields so siblings can interleave, and reports whether
    /// the readback still matches.
    fn tag_entry(user_data: *mut c_void) -> i32 {
        // SAFETY: tests pass a TagContext that outlives the worker.
        let ctx = unsafe { &*user_data.cast::<TagContext<'_>>() };
        ctx.slot.set(ctx.tag as *mut c_void);
        std::thread::yield_now();
        i32::from(ctx.slot.get() as usize == ctx.tag)
    }

    #[test]
    fn worker_threads_keep_private_values() {
        let slot = TlsSlot::new();
        let ctx_a = TagContext { slot: &slot, tag: 0x1111 };
        let ctx_b = TagContext { slot: &slot, tag: 0x2222 };

        let mut a = Thread::new();
        let mut b = Thread::new();
        // SAFETY: both contexts outlive their workers; shutdown joins below.
        unsafe {
            a.init(tag_entry, std::ptr::from_ref(&ctx_a).cast_mut().cast(), 0, None);
            b.init(tag_entry, std::ptr::from_ref(&ctx_b).cast_mut().cast(), 0, None);
        }
        a.shutdown();
        b.shutdown();

        assert_eq!(a.exit_code(), 1, "worker A must read back its own tag");
        assert_eq!(b.exit_code(), 1, "worker B must read back its own tag");
        assert!(slot.get().is_null(), "the main thread never stored a value");
    }

    #[test]
    fn dropping_slots_releases_their_keys() {
        // PTHREAD_KEYS_MAX is 1024 on glibc and as low as 128 elsewhere;
        // cycling far past both proves Drop really frees the key.
        for round in 0..4096usize {
            let slot = TlsSlot::new();
            slot.set(round as *mut c_void);
        }
    }
}
