// Copyright (c) 2019 King's College London created by the Software Development
// Team <http://soft-dev.org/>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, or the MIT license <LICENSE-MIT
// or http://opensource.org/licenses/MIT>, or the UPL-1.0 license
// <http://opensource.org/licenses/UPL> at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The slow path: given the shadow word a guard observed, work out what kind
//! of misuse it was, report it, and optionally trap into a debugger.

use crate::config;
use crate::platform;
use crate::registry;
use crate::shadow::{mark_of, state_bits, state_of, AccessState, STATES_COUNT};

/// What a bad access decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadAccessKind {
    /// The shadow word itself decodes out of range: an out-of-bounds write,
    /// a use-after-free with storage reuse, or a wild pointer hit it.
    ShadowCorrupted,
    /// The previous operation's mark lies in the calling thread's stack: an
    /// operation re-entered the object while an outer one was in progress.
    SameThreadRecursion,
    /// The previous operation came from some other thread.
    CrossThreadRace,
}

/// Classifies the previously observed shadow word `prev`.
///
/// The recursion/race split is only as good as the platform's stack query:
/// when the calling thread's bounds cannot be determined, a recursion is
/// conservatively classified as a race.
pub fn classify_bad_access(prev: usize) -> BadAccessKind {
    if state_bits(prev) >= STATES_COUNT {
        BadAccessKind::ShadowCorrupted
    } else if platform::is_in_current_stack(mark_of(prev)) {
        BadAccessKind::SameThreadRecursion
    } else {
        BadAccessKind::CrossThreadRace
    }
}

// Display label for a state in a report. `ReadingOrIdle` needs the report's
// target state to disambiguate: a read guard reports it as the current
// operation ("Reading"), but as a *previous* state in a write-exit report it
// can only have been produced by another write that completed in between.
fn state_label(state: AccessState, target: AccessState) -> &'static str {
    match state {
        AccessState::ReadingOrIdle => {
            if target == AccessState::Writing {
                "Writing"
            } else {
                "Reading"
            }
        }
        AccessState::Writing => "Writing",
        AccessState::DestructorCalled => "Destroyed",
    }
}

/// The default reporting sink: writes one of the canonical report texts to
/// standard error and leaves the break decision to the caller.
pub fn default_report(
    prev: usize,
    target: AccessState,
    _is_assertion: bool,
    message: Option<&str>,
) -> bool {
    if let Some(message) = message {
        eprintln!("{}", message);
        return true;
    }
    let prev_state = match state_of(prev) {
        Some(state) => state,
        None => {
            eprintln!(
                "Shadow value was corrupted! This could be due to use after-free, out of bounds writes, etc..."
            );
            return true;
        }
    };
    if platform::is_in_current_stack(mark_of(prev)) {
        eprintln!(
            "Recursion detected: This may lead to invalid operations\n- Parent operation: {}.\n- This operation: {}.",
            state_label(prev_state, target),
            state_label(target, target),
        );
    } else {
        let (id, name) = match registry::find_thread_with_addr(mark_of(prev)) {
            Some((id, name)) => (id, name),
            None => (0, String::new()),
        };
        eprintln!(
            "Race condition: Multiple threads are reading/writing to the data at the same time, potentially corrupting it!\n- Other thread: {} (Desc={} Id={})\n- This thread: {}.",
            state_label(prev_state, target),
            if name.is_empty() { "<Unknown>" } else { name.as_str() },
            id,
            state_label(target, target),
        );
    }
    true
}

/// The single cold symbol behind every guard's rarely-taken branch.
///
/// Blocking in here (registry lock, sink I/O) is deliberate: it holds the
/// offending thread in place, raising the odds that a debugger freezes the
/// other involved threads while they are still inside their operations.
#[cold]
#[inline(never)]
pub fn on_bad_access(prev: usize, target: AccessState, is_assertion: bool, message: Option<&str>) {
    // Corruption always reports at assertion level.
    let is_assertion =
        is_assertion || (message.is_none() && state_bits(prev) >= STATES_COUNT);
    let config = config::config();
    if is_assertion && config.allow_break && config.break_asap {
        // Trap before reporting, to catch the other thread in the act.
        platform::debug_trap();
    }
    let sink = config.report.unwrap_or(default_report);
    let break_allowed = sink(prev, target, is_assertion, message);
    if is_assertion && break_allowed && config.allow_break && !config.break_asap {
        platform::debug_trap();
    }
}
