//! Win32 backend: CreateThread lifecycle and TLS indices.
//!
//! Naming goes through `SetThreadDescription`, which only exists on
//! Windows 10 1607 and later, so the export is resolved dynamically and its
//! absence downgrades naming to a no-op.

use std::ffi::c_void;

use winapi::shared::basetsd::SIZE_T;
use winapi::shared::minwindef::{DWORD, FALSE, FARPROC, LPVOID};
use winapi::um::errhandlingapi::GetLastError;
use winapi::um::handleapi::CloseHandle;
use winapi::um::libloaderapi::{GetModuleHandleA, GetProcAddress};
use winapi::um::processthreadsapi::{
    CreateThread, GetExitCodeThread, TlsAlloc, TlsFree, TlsGetValue, TlsSetValue,
};
use winapi::um::synchapi::WaitForSingleObject;
use winapi::um::winbase::{INFINITE, TLS_OUT_OF_INDEXES, WAIT_OBJECT_0};
use winapi::um::winnt::{HANDLE, HRESULT};

/// Join-capable handle for one spawned OS thread.
#[derive(Debug)]
pub struct RawThread {
    handle: HANDLE,
}

// SAFETY: a Win32 thread HANDLE is an owned kernel-object reference; waiting
// on it, querying it, and closing it are all valid from any thread.
unsafe impl Send for RawThread {}
// SAFETY: see above; shared references only permit naming, which is
// thread-agnostic.
unsafe impl Sync for RawThread {}

/// Start routine handed to `CreateThread`. Runs the shared thread body and
/// reports its `i32` exit code as the thread exit code.
unsafe extern "system" fn thread_start(args: LPVOID) -> DWORD {
    // SAFETY: `args` is the spawn-arguments box passed to `spawn`; the OS
    // invokes the start routine exactly once.
    let code = unsafe { crate::thread::thread_main(args.cast()) };
    code as DWORD
}

/// Create an OS thread running the shared thread body over `args`.
///
/// A `stack_size` of 0 keeps the executable's default reservation.
///
/// # Safety
///
/// `args` must be the spawn-arguments box produced by `Thread::init`;
/// ownership transfers to the new thread exactly once on success and stays
/// with the caller on failure.
pub unsafe fn spawn(args: *mut c_void, stack_size: u32) -> Result<RawThread, i32> {
    // SAFETY: thread_start matches the Win32 start-routine ABI and the
    // caller keeps `args` alive until the new thread claims it.
    let handle = unsafe {
        CreateThread(
            std::ptr::null_mut(),
            stack_size as SIZE_T,
            Some(thread_start),
            args.cast(),
            0,
            std::ptr::null_mut(),
        )
    };
    if handle.is_null() {
        // SAFETY: GetLastError reads calling-thread state only.
        return Err(unsafe { GetLastError() } as i32);
    }
    Ok(RawThread { handle })
}

/// Join the thread, recover its exit code, and close the handle.
pub fn join(thread: RawThread) -> i32 {
    let mut code: DWORD = 0;
    // SAFETY: the handle came from CreateThread and is consumed exactly once
    // here; the exit code is defined once the wait observes termination.
    unsafe {
        let waited = WaitForSingleObject(thread.handle, INFINITE);
        debug_assert_eq!(waited, WAIT_OBJECT_0, "thread wait failed");
        let queried = GetExitCodeThread(thread.handle, &mut code);
        debug_assert_ne!(queried, FALSE, "exit-code query failed");
        let _ = CloseHandle(thread.handle);
    }
    code as i32
}

type SetThreadDescriptionFn = unsafe extern "system" fn(HANDLE, *const u16) -> HRESULT;

fn lookup_set_thread_description() -> FARPROC {
    // SAFETY: kernel32 is mapped into every process; a null module or a
    // missing export both produce null, which callers treat as "no naming
    // facility".
    unsafe {
        let module = GetModuleHandleA(c"kernel32.dll".as_ptr().cast());
        if module.is_null() {
            return std::ptr::null_mut();
        }
        GetProcAddress(module, c"SetThreadDescription".as_ptr().cast())
    }
}

/// Best-effort thread naming. Systems predating `SetThreadDescription`
/// leave the thread unnamed; a rejected description is ignored.
pub fn set_name(thread: &RawThread, name: &str) {
    let func = lookup_set_thread_description();
    if func.is_null() {
        return;
    }

    let mut wide: Vec<u16> = name.encode_utf16().collect();
    wide.push(0);
    // SAFETY: the export carries the documented SetThreadDescription
    // signature, the handle is live, and the buffer is NUL-terminated. The
    // HRESULT is advisory and deliberately dropped.
    unsafe {
        let set_description: SetThreadDescriptionFn = std::mem::transmute(func);
        let _ = set_description(thread.handle, wide.as_ptr());
    }
}

// -------------------------------------------------------------------------
// TLS indices
// -------------------------------------------------------------------------

/// OS key addressing one pointer-sized slot per thread.
pub type RawTlsKey = DWORD;

/// Allocate a fresh TLS index.
pub fn tls_create() -> Result<RawTlsKey, i32> {
    // SAFETY: TlsAlloc takes no arguments and only touches process state.
    let index = unsafe { TlsAlloc() };
    if index == TLS_OUT_OF_INDEXES {
        // SAFETY: GetLastError reads calling-thread state only.
        Err(unsafe { GetLastError() } as i32)
    } else {
        Ok(index)
    }
}

/// Release a TLS index.
pub fn tls_destroy(key: RawTlsKey) -> Result<(), i32> {
    // SAFETY: the index came from TlsAlloc and is released exactly once.
    if unsafe { TlsFree(key) } == FALSE {
        // SAFETY: GetLastError reads calling-thread state only.
        Err(unsafe { GetLastError() } as i32)
    } else {
        Ok(())
    }
}

/// The calling thread's value for `key`; null when never set.
#[must_use]
pub fn tls_get(key: RawTlsKey) -> *mut c_void {
    // SAFETY: reading a live index's slot for the calling thread cannot
    // fault; a never-set slot reads back null.
    unsafe { TlsGetValue(key).cast() }
}

/// Store the calling thread's value for `key`.
pub fn tls_set(key: RawTlsKey, value: *mut c_void) {
    // SAFETY: stores a plain pointer-sized value in this thread's slot for
    // an index the caller owns.
    let stored = unsafe { TlsSetValue(key, value.cast()) };
    debug_assert_ne!(stored, FALSE, "TlsSetValue rejected a live index ({key})");
}
