//! Platform backends behind one compile-time surface.
//!
//! Exactly one backend module compiles per target. Each exports the same
//! items — `RawThread`, `spawn`, `join`, `set_name`, `RawTlsKey`, and the
//! `tls_*` key operations — so the rest of the crate never names a platform
//! type. Handles are fixed-size concrete structs; there is no trait object
//! and no runtime dispatch anywhere in this layer.

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub(crate) use unix::*;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub(crate) use windows::*;

#[cfg(not(any(unix, windows)))]
compile_error!("spindle-core supports unix and windows targets only");
