// Copyright (c) 2019 King's College London created by the Software Development
// Team <http://soft-dev.org/>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, or the MIT license <LICENSE-MIT
// or http://opensource.org/licenses/MIT>, or the UPL-1.0 license
// <http://opensource.org/licenses/UPL> at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Opt-in registry of named threads, used to put a name and id on the other
//! side of a race.
//!
//! No unix exposes the stack bounds of *other* threads, so the registry
//! captures each thread's bounds from the thread itself at registration
//! time, where the query is reliable. Threads that never register simply
//! show up as `<Unknown>` in race reports.

use parking_lot::Mutex;

use crate::platform;

struct Entry {
    tid: u64,
    name: String,
    stack_low: usize,
    stack_high: usize,
}

static REGISTRY: Mutex<Vec<Entry>> = Mutex::new(Vec::new());

/// Registers the calling thread under `name`, capturing its stack range.
///
/// A no-op on platforms where the stack range cannot be determined.
pub fn register_current_thread(name: &str) {
    let (stack_low, stack_high) = match platform::current_stack_bounds() {
        Some(bounds) => bounds,
        None => return,
    };
    let entry = Entry {
        tid: platform::current_thread_id(),
        name: name.to_string(),
        stack_low,
        stack_high,
    };
    REGISTRY.lock().push(entry);
}

/// Removes the calling thread's registry entries.
pub fn deregister_current_thread() {
    let tid = platform::current_thread_id();
    REGISTRY.lock().retain(|entry| entry.tid != tid);
}

/// RAII registration: registers on construction, deregisters on drop. Keep
/// it alive for the whole thread body.
pub struct RegisteredThread {
    _private: (),
}

impl RegisteredThread {
    pub fn new(name: &str) -> RegisteredThread {
        register_current_thread(name);
        RegisteredThread { _private: () }
    }
}

impl Drop for RegisteredThread {
    fn drop(&mut self) {
        deregister_current_thread();
    }
}

/// Finds the registered thread whose stack contains `addr` and returns its
/// id and name.
///
/// Threads come and go while races are being reported; the walk only ever
/// reads registry data, never live thread state, so a thread exiting
/// mid-walk cannot fault it. At worst an entry is stale and the answer
/// degrades to `None` on the caller's side.
pub fn find_thread_with_addr(addr: usize) -> Option<(u64, String)> {
    REGISTRY
        .lock()
        .iter()
        .find(|entry| entry.stack_low <= addr && addr < entry.stack_high)
        .map(|entry| (entry.tid, entry.name.clone()))
}
