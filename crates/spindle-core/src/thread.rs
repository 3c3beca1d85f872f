//! OS thread lifecycle: spawn with a startup handshake, join with exit-code
//! recovery, best-effort naming.
//!
//! # Architecture
//!
//! [`Thread::init`] boxes the entry function, its argument, and a clone of
//! the startup gate, hands the box to the platform start routine, and blocks
//! on the gate. The new thread posts the gate before touching the entry
//! function, so `init` returning means the worker is live — which is what
//! makes post-creation steps like naming safe to run right after.
//!
//! The entry function's return value travels through the OS thread-exit
//! channel (pthread exit value, Win32 exit code) and is read back at join.
//! The worker never holds a pointer into the `Thread` object, so the object
//! stays movable while the worker runs.

use std::ffi::c_void;
use std::sync::Arc;

use crate::sync::Semaphore;
use crate::sys;

/// User entry function: receives the opaque pointer given to
/// [`Thread::init`] and returns the thread's exit code.
pub type ThreadFn = fn(*mut c_void) -> i32;

/// Everything the worker needs, smuggled through the platform start routine.
pub(crate) struct SpawnArgs {
    entry: ThreadFn,
    user_data: *mut c_void,
    gate: Arc<Semaphore>,
}

/// Shared tail of the platform start routines: post the startup gate, then
/// run the user entry function and hand its exit code back to the platform
/// layer.
///
/// # Safety
///
/// `raw` must be a `SpawnArgs` box produced by [`Thread::init`], claimed
/// exactly once.
pub(crate) unsafe fn thread_main(raw: *mut c_void) -> i32 {
    // SAFETY: ownership of the box transfers from `init` to this call.
    let args = unsafe { Box::from_raw(raw.cast::<SpawnArgs>()) };
    args.gate.post();
    (args.entry)(args.user_data)
}

/// Owns the lifecycle of one OS thread running a user entry function.
///
/// An instance is inert until [`init`](Thread::init); from then until
/// [`shutdown`](Thread::shutdown) exactly one OS thread is alive on its
/// behalf. Dropping a running instance joins the worker first, so it can
/// never outlive its owner. A joined instance may be initialized again.
pub struct Thread {
    handle: Option<sys::RawThread>,
    gate: Arc<Semaphore>,
    exit_code: i32,
    running: bool,
}

impl Thread {
    /// Create an inert instance. No OS resources are allocated yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handle: None,
            gate: Arc::new(Semaphore::new(0)),
            exit_code: 0,
            running: false,
        }
    }

    /// Spawn the OS thread and block until it has observably started.
    ///
    /// `entry` runs on the new thread with `user_data`; its return value
    /// becomes the exit code readable after [`shutdown`](Thread::shutdown).
    /// A `stack_size` of 0 requests the platform default; nonzero values
    /// pass through to the OS unvalidated. A `name`, when given, is applied
    /// after the handshake, best-effort.
    ///
    /// By the time this returns the worker has posted the startup gate: it
    /// is live and entering (or already inside) `entry`.
    ///
    /// # Panics
    ///
    /// Asserts that the instance is not already running. Panics with the OS
    /// error when thread creation fails — no usable partial state exists at
    /// that point.
    ///
    /// # Safety
    ///
    /// `user_data` must stay valid for every access `entry` performs, which
    /// can be any time up to the completion of `shutdown`, and any data it
    /// shares across threads must be synchronized externally.
    pub unsafe fn init(
        &mut self,
        entry: ThreadFn,
        user_data: *mut c_void,
        stack_size: u32,
        name: Option<&str>,
    ) {
        assert!(
            !self.running,
            "init called on a thread that is already running"
        );

        // Fresh gate per run: a post left over from an earlier lifecycle
        // must never satisfy this handshake.
        self.gate = Arc::new(Semaphore::new(0));
        let args = Box::new(SpawnArgs {
            entry,
            user_data,
            gate: Arc::clone(&self.gate),
        });
        let raw = Box::into_raw(args).cast::<c_void>();

        // SAFETY: `raw` is a live SpawnArgs box; on success its ownership
        // passes to the new thread, on failure it returns to us below.
        match unsafe { sys::spawn(raw, stack_size) } {
            Ok(handle) => self.handle = Some(handle),
            Err(errno) => {
                // SAFETY: no thread was created, so the box is still
                // exclusively ours to reclaim.
                drop(unsafe { Box::from_raw(raw.cast::<SpawnArgs>()) });
                panic!("OS thread creation failed (errno {errno})");
            }
        }
        self.running = true;

        self.gate.wait();

        if let Some(name) = name {
            self.set_name(name);
        }
    }

    /// Join the worker, record its exit code, and release the handle.
    ///
    /// Blocks until the entry function returns; making sure it eventually
    /// does is the caller's job.
    ///
    /// # Panics
    ///
    /// Asserts that the instance is currently running.
    pub fn shutdown(&mut self) {
        assert!(
            self.running,
            "shutdown called on a thread that is not running"
        );
        let Some(handle) = self.handle.take() else {
            unreachable!("running thread lost its platform handle");
        };
        self.exit_code = sys::join(handle);
        self.running = false;
    }

    /// True between a successful [`init`](Thread::init) and the completion
    /// of [`shutdown`](Thread::shutdown).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Exit code recorded by the last completed
    /// [`shutdown`](Thread::shutdown); 0 before a first run completes.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Apply a diagnostic name to the underlying OS thread, best-effort.
    ///
    /// Does nothing when the instance is not running, and never reports a
    /// platform's refusal or inability to name the thread.
    pub fn set_name(&self, name: &str) {
        if let Some(handle) = &self.handle {
            sys::set_name(handle, name);
        }
    }
}

impl Default for Thread {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Thread {
    fn drop(&mut self) {
        if self.running {
            self.shutdown();
        }
    }
}
