//! Typed futex veneer over raw x86_64 Linux syscalls.
//!
//! The startup-gate semaphore parks and wakes threads directly on its count
//! word; these wrappers expose exactly the two futex operations it needs,
//! with kernel returns decoded into errno-style `Result`s.

pub mod raw;

/// `futex(2)` syscall number on x86_64.
const SYS_FUTEX: usize = 202;

const FUTEX_WAIT: usize = 0;
const FUTEX_WAKE: usize = 1;
/// Process-private futex; skips the cross-process hash bucket lookup.
const FUTEX_PRIVATE_FLAG: usize = 0x80;

// -------------------------------------------------------------------------
// Error handling
// -------------------------------------------------------------------------

/// Maximum errno value returned by Linux syscalls.
const MAX_ERRNO: usize = 4095;

/// Convert a raw syscall return value to `Result<usize, i32>`.
///
/// On x86_64 Linux, error returns are in the range `[-(MAX_ERRNO), -1]`,
/// which in unsigned representation is `[usize::MAX - MAX_ERRNO + 1, usize::MAX]`.
#[inline]
pub fn syscall_result(ret: usize) -> Result<usize, i32> {
    if ret > usize::MAX - MAX_ERRNO {
        Err(-(ret as isize) as i32)
    } else {
        Ok(ret)
    }
}

// -------------------------------------------------------------------------
// Futex wrappers
// -------------------------------------------------------------------------

/// `futex(uaddr, FUTEX_WAIT_PRIVATE, expected, NULL)` — block while
/// `*uaddr == expected`.
///
/// Returns `Err(EAGAIN)` when the word no longer holds `expected` and
/// `Err(EINTR)` on signal delivery; callers re-check their condition and
/// loop in both cases.
///
/// # Safety
///
/// `uaddr` must point to a valid, aligned `u32` that stays alive for the
/// duration of the call.
#[inline]
pub unsafe fn sys_futex_wait(uaddr: *const u32, expected: u32) -> Result<(), i32> {
    // SAFETY: caller guarantees uaddr validity; the null timeout blocks
    // indefinitely, which is what a startup gate wants.
    let ret = unsafe {
        raw::syscall4(
            SYS_FUTEX,
            uaddr as usize,
            FUTEX_WAIT | FUTEX_PRIVATE_FLAG,
            expected as usize,
            0,
        )
    };
    syscall_result(ret).map(|_| ())
}

/// `futex(uaddr, FUTEX_WAKE_PRIVATE, count)` — wake up to `count` waiters
/// parked on `uaddr`. Returns the number of threads woken.
///
/// # Safety
///
/// `uaddr` must point to a valid, aligned `u32`.
#[inline]
pub unsafe fn sys_futex_wake(uaddr: *const u32, count: i32) -> Result<usize, i32> {
    // SAFETY: caller guarantees uaddr validity; waking an unparked word is
    // a no-op that reports zero waiters.
    let ret = unsafe {
        raw::syscall3(
            SYS_FUTEX,
            uaddr as usize,
            FUTEX_WAKE | FUTEX_PRIVATE_FLAG,
            count as usize,
        )
    };
    syscall_result(ret)
}
