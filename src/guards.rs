// Copyright (c) 2019 King's College London created by the Software Development
// Team <http://soft-dev.org/>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, or the MIT license <LICENSE-MIT
// or http://opensource.org/licenses/MIT>, or the UPL-1.0 license
// <http://opensource.org/licenses/UPL> at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Scoped access guards. Construction checks the shadow against the intended
//! transition and, for writers and destroys, stores the new state; the write
//! guard re-checks and restores on drop. The fast path is one relaxed load, a
//! tag extract, a compare and a rarely-taken branch to the cold handler.

#[cfg(not(guards_enabled))]
use std::marker::PhantomData;

#[cfg(guards_enabled)]
use crate::report::on_bad_access;
#[cfg(guards_enabled)]
use crate::shadow::{state_bits, AccessState};
use crate::shadow::Shadow;

/// Read scope. Observes without disturbing: readers never store, so
/// concurrent readers cannot report each other.
///
/// There is no exit check either; it would double the cost of every read for
/// little gain, since the write guards catch most overlaps.
#[must_use]
pub struct ReadGuard {
    _private: (),
}

#[cfg(guards_enabled)]
impl ReadGuard {
    #[inline(always)]
    pub fn new(shadow: &Shadow) -> ReadGuard {
        let last_seen = shadow.load();
        if state_bits(last_seen) != AccessState::ReadingOrIdle as usize {
            on_bad_access(last_seen, AccessState::ReadingOrIdle, true, None);
        }
        ReadGuard { _private: () }
    }

    /// As [`ReadGuard::new`], attaching a severity and message to any report.
    #[inline(always)]
    pub fn with_context(shadow: &Shadow, is_assertion: bool, message: Option<&str>) -> ReadGuard {
        let last_seen = shadow.load();
        if state_bits(last_seen) != AccessState::ReadingOrIdle as usize {
            on_bad_access(last_seen, AccessState::ReadingOrIdle, is_assertion, message);
        }
        ReadGuard { _private: () }
    }
}

/// Write scope. Stores `Writing` on entry even when the entry check passed,
/// so that a second racing writer observes this one's mark and reports from
/// its side; the exit check then catches writers whose whole region was
/// overlapped by another writer.
#[must_use]
pub struct WriteGuard<'a> {
    #[cfg(guards_enabled)]
    shadow: &'a Shadow,
    #[cfg(not(guards_enabled))]
    _marker: PhantomData<&'a Shadow>,
}

#[cfg(guards_enabled)]
impl<'a> WriteGuard<'a> {
    #[inline(always)]
    pub fn new(shadow: &'a Shadow) -> WriteGuard<'a> {
        let last_seen = shadow.load();
        if state_bits(last_seen) != AccessState::ReadingOrIdle as usize {
            on_bad_access(last_seen, AccessState::Writing, true, None);
        }
        shadow.set_state(AccessState::Writing);
        WriteGuard { shadow }
    }
}

#[cfg(guards_enabled)]
impl Drop for WriteGuard<'_> {
    #[inline(always)]
    fn drop(&mut self) {
        let last_seen = self.shadow.load();
        if state_bits(last_seen) != AccessState::Writing as usize {
            on_bad_access(last_seen, AccessState::Writing, true, None);
        }
        self.shadow.set_state(AccessState::ReadingOrIdle);
    }
}

/// As [`WriteGuard`], carrying a severity and message through to the handler
/// without any extra branching on the fast path.
#[must_use]
pub struct WriteGuardEx<'a> {
    #[cfg(guards_enabled)]
    shadow: &'a Shadow,
    #[cfg(guards_enabled)]
    is_assertion: bool,
    #[cfg(guards_enabled)]
    message: Option<&'a str>,
    #[cfg(not(guards_enabled))]
    _marker: PhantomData<&'a Shadow>,
}

#[cfg(guards_enabled)]
impl<'a> WriteGuardEx<'a> {
    #[inline(always)]
    pub fn new(
        shadow: &'a Shadow,
        is_assertion: bool,
        message: Option<&'a str>,
    ) -> WriteGuardEx<'a> {
        let last_seen = shadow.load();
        if state_bits(last_seen) != AccessState::ReadingOrIdle as usize {
            on_bad_access(last_seen, AccessState::Writing, is_assertion, message);
        }
        shadow.set_state(AccessState::Writing);
        WriteGuardEx {
            shadow,
            is_assertion,
            message,
        }
    }
}

#[cfg(guards_enabled)]
impl Drop for WriteGuardEx<'_> {
    #[inline(always)]
    fn drop(&mut self) {
        let last_seen = self.shadow.load();
        if state_bits(last_seen) != AccessState::Writing as usize {
            on_bad_access(last_seen, AccessState::Writing, self.is_assertion, self.message);
        }
        self.shadow.set_state(AccessState::ReadingOrIdle);
    }
}

/// Destroy scope. Entry-only: destruction is a one-way transition, after
/// which every access on the shadow reports until the word is reinitialized.
#[must_use]
pub struct DestroyGuard {
    _private: (),
}

#[cfg(guards_enabled)]
impl DestroyGuard {
    #[inline(always)]
    pub fn new(shadow: &Shadow) -> DestroyGuard {
        let last_seen = shadow.load();
        if state_bits(last_seen) != AccessState::ReadingOrIdle as usize {
            on_bad_access(last_seen, AccessState::DestructorCalled, true, None);
        }
        shadow.set_state(AccessState::DestructorCalled);
        DestroyGuard { _private: () }
    }
}

#[cfg(not(guards_enabled))]
impl ReadGuard {
    #[inline(always)]
    pub fn new(_shadow: &Shadow) -> ReadGuard {
        ReadGuard { _private: () }
    }

    #[inline(always)]
    pub fn with_context(
        _shadow: &Shadow,
        _is_assertion: bool,
        _message: Option<&str>,
    ) -> ReadGuard {
        ReadGuard { _private: () }
    }
}

#[cfg(not(guards_enabled))]
impl<'a> WriteGuard<'a> {
    #[inline(always)]
    pub fn new(_shadow: &'a Shadow) -> WriteGuard<'a> {
        WriteGuard {
            _marker: PhantomData,
        }
    }
}

#[cfg(not(guards_enabled))]
impl<'a> WriteGuardEx<'a> {
    #[inline(always)]
    pub fn new(
        _shadow: &'a Shadow,
        _is_assertion: bool,
        _message: Option<&'a str>,
    ) -> WriteGuardEx<'a> {
        WriteGuardEx {
            _marker: PhantomData,
        }
    }
}

#[cfg(not(guards_enabled))]
impl DestroyGuard {
    #[inline(always)]
    pub fn new(_shadow: &Shadow) -> DestroyGuard {
        DestroyGuard { _private: () }
    }
}
