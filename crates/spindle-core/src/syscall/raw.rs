//! Raw x86_64 Linux syscall stubs.
//!
//! Each function issues a single `syscall` instruction with the given number
//! of arguments and hands back the raw kernel return from `rax`. Only the
//! arities the futex veneer needs are provided.
//!
//! # ABI
//!
//! ```text
//! syscall number → rax
//! arg1           → rdi
//! arg2           → rsi
//! arg3           → rdx
//! arg4           → r10
//! return         → rax
//! clobbered      → rcx, r11
//! ```

use core::arch::asm;

/// Issue a syscall with 3 arguments.
///
/// # Safety
///
/// The caller must supply a valid syscall number and arguments that uphold
/// the invariants of that syscall.
#[inline]
pub unsafe fn syscall3(nr: usize, a1: usize, a2: usize, a3: usize) -> usize {
    let ret: usize;
    // SAFETY: Inline asm issues the syscall instruction. Caller guarantees validity.
    unsafe {
        asm!(
            "syscall",
            inlateout("rax") nr => ret,
            in("rdi") a1,
            in("rsi") a2,
            in("rdx") a3,
            lateout("rcx") _,
            lateout("r11") _,
            options(nostack, preserves_flags),
        );
    }
    ret
}

/// Issue a syscall with 4 arguments.
///
/// # Safety
///
/// The caller must supply a valid syscall number and arguments that uphold
/// the invariants of that syscall.
#[inline]
pub unsafe fn syscall4(nr: usize, a1: usize, a2: usize, a3: usize, a4: usize) -> usize {
    let ret: usize;
    // SAFETY: Inline asm issues the syscall instruction. Caller guarantees validity.
    unsafe {
        asm!(
            "syscall",
            inlateout("rax") nr => ret,
            in("rdi") a1,
            in("rsi") a2,
            in("rdx") a3,
            in("r10") a4,
            lateout("rcx") _,
            lateout("r11") _,
            options(nostack, preserves_flags),
        );
    }
    ret
}
