//! POSIX backend: pthread lifecycle and pthread TLS keys.
//!
//! Thread naming is the one genuinely per-OS corner of this file — every
//! platform family spells it differently, and a few cannot name anything
//! but the calling thread. All of those differences stay behind
//! [`set_name`], which never reports failure.

use std::ffi::{CStr, CString, c_void};

/// Join-capable handle for one spawned OS thread.
#[derive(Debug)]
pub struct RawThread {
    handle: libc::pthread_t,
}

// SAFETY: a pthread_t is an opaque thread identifier. POSIX allows joining
// and naming a thread from any other thread, and the wrapper never exposes
// the identifier for anything else.
unsafe impl Send for RawThread {}
// SAFETY: see above; shared references only permit naming, which is
// thread-agnostic.
unsafe impl Sync for RawThread {}

/// Start routine handed to `pthread_create`. Runs the shared thread body
/// and smuggles its `i32` exit code out through the thread's exit value.
extern "C" fn thread_start(args: *mut c_void) -> *mut c_void {
    // SAFETY: `args` is the spawn-arguments box passed to `spawn`; pthread
    // invokes the start routine exactly once.
    let code = unsafe { crate::thread::thread_main(args) };
    // Sign-extend into the pointer; `join` truncates back to the low 32 bits.
    code as isize as *mut c_void
}

/// Create an OS thread running the shared thread body over `args`.
///
/// A `stack_size` of 0 keeps the platform default; other values are passed
/// through unvalidated, so undersized requests surface as a create failure.
///
/// # Safety
///
/// `args` must be the spawn-arguments box produced by `Thread::init`;
/// ownership transfers to the new thread exactly once on success and stays
/// with the caller on failure.
pub unsafe fn spawn(args: *mut c_void, stack_size: u32) -> Result<RawThread, i32> {
    // SAFETY: attr is a plain out-parameter; init and destroy are balanced.
    let mut attr: libc::pthread_attr_t = unsafe { std::mem::zeroed() };
    // SAFETY: attr points to writable storage on this frame.
    let rc = unsafe { libc::pthread_attr_init(&mut attr) };
    if rc != 0 {
        return Err(rc);
    }

    if stack_size > 0 {
        // SAFETY: attr was initialized above.
        let rc = unsafe { libc::pthread_attr_setstacksize(&mut attr, stack_size as usize) };
        if rc != 0 {
            // SAFETY: balances pthread_attr_init above.
            let _ = unsafe { libc::pthread_attr_destroy(&mut attr) };
            return Err(rc);
        }
    }

    // SAFETY: handle is a plain out-parameter.
    let mut handle: libc::pthread_t = unsafe { std::mem::zeroed() };
    // SAFETY: thread_start matches the pthread start-routine ABI, attr is
    // initialized, and the caller keeps `args` alive until the new thread
    // claims it.
    let rc = unsafe { libc::pthread_create(&mut handle, &attr, thread_start, args) };
    // SAFETY: balances pthread_attr_init above; a created thread keeps no
    // reference to the attr object.
    let _ = unsafe { libc::pthread_attr_destroy(&mut attr) };

    if rc != 0 {
        return Err(rc);
    }
    Ok(RawThread { handle })
}

/// Join the thread and recover the exit code from its exit value.
pub fn join(thread: RawThread) -> i32 {
    let mut exit_value: *mut c_void = std::ptr::null_mut();
    // SAFETY: the handle came from pthread_create and is joined exactly once
    // (the struct is consumed here).
    let rc = unsafe { libc::pthread_join(thread.handle, &mut exit_value) };
    debug_assert_eq!(rc, 0, "pthread_join rejected a live handle (errno {rc})");
    exit_value as isize as i32
}

/// Best-effort thread naming. Unsupported platforms, oversized names, and
/// names with interior NULs all leave the thread unnamed.
pub fn set_name(thread: &RawThread, name: &str) {
    let Ok(name) = CString::new(name) else {
        return;
    };
    apply_name(thread.handle, &name);
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn apply_name(handle: libc::pthread_t, name: &CStr) {
    // SAFETY: the handle identifies a thread owned by the caller and the
    // name is NUL-terminated. The kernel caps comm names at 15 bytes and
    // rejects longer ones; that verdict is deliberately dropped.
    let _ = unsafe { libc::pthread_setname_np(handle, name.as_ptr()) };
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
fn apply_name(handle: libc::pthread_t, name: &CStr) {
    // Apple can only name the calling thread, so the name sticks only when
    // the handle refers to ourselves.
    // SAFETY: pthread_self is always valid and the name is NUL-terminated.
    unsafe {
        if libc::pthread_equal(libc::pthread_self(), handle) != 0 {
            let _ = libc::pthread_setname_np(name.as_ptr());
        }
    }
}

#[cfg(any(target_os = "freebsd", target_os = "dragonfly", target_os = "openbsd"))]
fn apply_name(handle: libc::pthread_t, name: &CStr) {
    // SAFETY: the handle identifies a live thread; the name is NUL-terminated.
    unsafe { libc::pthread_set_name_np(handle, name.as_ptr()) };
}

#[cfg(target_os = "netbsd")]
fn apply_name(handle: libc::pthread_t, name: &CStr) {
    // SAFETY: "%s" formats the third argument; both strings are NUL-terminated.
    let _ = unsafe {
        libc::pthread_setname_np(handle, c"%s".as_ptr(), name.as_ptr() as *mut libc::c_void)
    };
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "openbsd",
    target_os = "netbsd",
)))]
fn apply_name(_handle: libc::pthread_t, _name: &CStr) {}

// -------------------------------------------------------------------------
// TLS keys
// -------------------------------------------------------------------------

/// OS key addressing one pointer-sized slot per thread.
pub type RawTlsKey = libc::pthread_key_t;

/// Allocate a fresh TLS key with no value destructor.
pub fn tls_create() -> Result<RawTlsKey, i32> {
    let mut key: RawTlsKey = 0;
    // SAFETY: key is a plain out-parameter and no destructor is registered,
    // so the key never calls back into this crate.
    let rc = unsafe { libc::pthread_key_create(&mut key, None) };
    if rc != 0 { Err(rc) } else { Ok(key) }
}

/// Release a TLS key.
pub fn tls_destroy(key: RawTlsKey) -> Result<(), i32> {
    // SAFETY: the key came from tls_create and is released exactly once.
    let rc = unsafe { libc::pthread_key_delete(key) };
    if rc != 0 { Err(rc) } else { Ok(()) }
}

/// The calling thread's value for `key`; null when never set.
#[must_use]
pub fn tls_get(key: RawTlsKey) -> *mut c_void {
    // SAFETY: reading a live key's slot for the calling thread cannot fault;
    // a never-set slot reads back null.
    unsafe { libc::pthread_getspecific(key) }
}

/// Store the calling thread's value for `key`.
pub fn tls_set(key: RawTlsKey, value: *mut c_void) {
    // SAFETY: stores a plain pointer-sized value in this thread's slot for
    // a key the caller owns.
    let rc = unsafe { libc::pthread_setspecific(key, value) };
    debug_assert_eq!(rc, 0, "pthread_setspecific rejected a live key (errno {rc})");
}
