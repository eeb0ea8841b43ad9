// Run-time:
//   status: success
//   stderr:
//     Recursion detected: This may lead to invalid operations
//     - Parent operation: Writing.
//     - This operation: Writing.

extern crate shadowguard;

use shadowguard::{set_config, AccessState, GuardConfig, Shadow, WriteGuard};

// A write guard whose region was completely overlapped by another write
// finds the shadow idle again on exit. The report must attribute both sides
// to writes: an idle word at write-exit can only have been left by another
// write that completed in between.
fn main() {
    set_config(GuardConfig {
        allow_break: false,
        break_asap: false,
        report: None,
    });

    let shadow = Shadow::new();
    let write = WriteGuard::new(&shadow);
    shadow.set_state(AccessState::ReadingOrIdle);
    drop(write);
}
