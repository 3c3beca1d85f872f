//! # spindle-core
//!
//! Cross-platform OS thread lifecycle and thread-local storage primitives.
//!
//! Two independent building blocks, each wrapping one fixed-size,
//! platform-selected handle:
//!
//! - [`Thread`]: spawn a user entry function on a new OS thread behind a
//!   deterministic startup handshake, join it for a signed 32-bit exit code,
//!   and give it a best-effort diagnostic name.
//! - [`TlsSlot`]: one opaque pointer-sized value per OS thread, behind an OS
//!   TLS key.
//!
//! Platform dispatch happens entirely at compile time: each supported OS
//! contributes a concrete backend module and there is no trait object, no
//! runtime capability probe (beyond the naming export lookup on Windows),
//! and no process-wide registry. Instances are plain values owned by their
//! callers.
//!
//! The semaphore behind the startup handshake is an internal collaborator;
//! this crate deliberately exposes no synchronization primitives.

pub mod thread;
pub mod tls;

mod sync;
mod sys;
#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
mod syscall;

pub use thread::{Thread, ThreadFn};
pub use tls::TlsSlot;
