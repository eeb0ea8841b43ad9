// Copyright (c) 2019 King's College London created by the Software Development
// Team <http://soft-dev.org/>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, or the MIT license <LICENSE-MIT
// or http://opensource.org/licenses/MIT>, or the UPL-1.0 license
// <http://opensource.org/licenses/UPL> at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Platform primitives. Everything here degrades rather than fails: a query
//! that cannot be answered returns `None` or 0 and the caller reports with
//! less information.

use cfg_if::cfg_if;

/// Returns an address guaranteed to lie within the calling thread's active
/// stack at the moment of the call.
///
/// Taking the address of a local is cheaper than any thread-id syscall and
/// stays correct across userspace fiber switches, since each fiber runs on
/// its own stack.
#[cfg(guards_enabled)]
#[inline(always)]
pub(crate) fn current_stack_mark() -> usize {
    let slot: usize = 0;
    &slot as *const usize as usize
}

cfg_if! {
    if #[cfg(any(target_arch = "x86", target_arch = "x86_64"))] {
        /// Breakpoint if a debugger is attached; otherwise raises the trap
        /// signal.
        pub(crate) fn debug_trap() {
            unsafe { std::arch::asm!("int3") };
        }
    } else if #[cfg(target_arch = "aarch64")] {
        pub(crate) fn debug_trap() {
            unsafe { std::arch::asm!("brk #0xf000") };
        }
    } else if #[cfg(unix)] {
        pub(crate) fn debug_trap() {
            unsafe {
                libc::raise(libc::SIGTRAP);
            }
        }
    } else {
        pub(crate) fn debug_trap() {
            std::process::abort();
        }
    }
}

cfg_if! {
    if #[cfg(target_os = "linux")] {
        /// Stack range of the calling thread, from the pthread attribute
        /// API. pthread stores the attributes of spawned threads itself, and
        /// glibc fills them in for the main thread from the process limits.
        pub(crate) fn current_stack_bounds() -> Option<(usize, usize)> {
            unsafe {
                let mut attr: libc::pthread_attr_t = std::mem::zeroed();
                if libc::pthread_getattr_np(libc::pthread_self(), &mut attr) != 0 {
                    return None;
                }
                let mut stack_addr = std::ptr::null_mut();
                let mut stack_size: libc::size_t = 0;
                let rc = libc::pthread_attr_getstack(&attr, &mut stack_addr, &mut stack_size);
                libc::pthread_attr_destroy(&mut attr);
                if rc != 0 {
                    return None;
                }
                // On POSIX the address is the low end of the mapping.
                let low = stack_addr as usize;
                Some((low, low + stack_size))
            }
        }

        pub(crate) fn current_thread_id() -> u64 {
            // The raw syscall, not the libc wrapper, which glibc only
            // gained in 2.30.
            unsafe { libc::syscall(libc::SYS_gettid) as u64 }
        }
    } else if #[cfg(target_os = "macos")] {
        /// Stack range of the calling thread. Unlike the POSIX attribute
        /// API, `pthread_get_stackaddr_np` returns the high end; the stack
        /// grows down from it.
        pub(crate) fn current_stack_bounds() -> Option<(usize, usize)> {
            unsafe {
                let thread = libc::pthread_self();
                let high = libc::pthread_get_stackaddr_np(thread) as usize;
                let size = libc::pthread_get_stacksize_np(thread);
                Some((high - size, high))
            }
        }

        pub(crate) fn current_thread_id() -> u64 {
            let mut tid = 0u64;
            unsafe { libc::pthread_threadid_np(libc::pthread_self(), &mut tid) };
            tid
        }
    } else {
        // Unknown platform: no stack introspection, reports carry degraded
        // thread information.
        pub(crate) fn current_stack_bounds() -> Option<(usize, usize)> {
            None
        }

        pub(crate) fn current_thread_id() -> u64 {
            0
        }
    }
}

/// True iff `addr` lies within the calling thread's stack, `false` when the
/// bounds cannot be determined. The range is half-open: the low bound is in,
/// the high bound is out.
#[inline]
pub(crate) fn is_in_current_stack(addr: usize) -> bool {
    match current_stack_bounds() {
        Some((low, high)) => low <= addr && addr < high,
        None => false,
    }
}
