//! Startup-gate semaphore with compile-time backend selection.
//!
//! One backend compiles per target: a raw-futex implementation on x86_64
//! Linux, and a mutex/condvar implementation everywhere else. Both expose
//! the same [`Semaphore`] surface, and `post` → `wait` establishes the
//! happens-before edge the thread startup handshake relies on.

#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
mod futex;
#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
pub use futex::Semaphore;

#[cfg(not(all(target_os = "linux", target_arch = "x86_64")))]
mod generic;
#[cfg(not(all(target_os = "linux", target_arch = "x86_64")))]
pub use generic::Semaphore;
