// Run-time:
//   status: success
//   stderr:
//     Recursion detected: This may lead to invalid operations
//     - Parent operation: Writing.
//     - This operation: Reading.

extern crate shadowguard;

use shadowguard::{set_config, GuardConfig, ReadGuard, Shadow, WriteGuard};

// A read entered while a write on the same thread is still open, e.g. from a
// callback fired mid-mutation. Exactly one report, through the stock stderr
// sink.
fn main() {
    // Keep the default sink but never trap.
    set_config(GuardConfig {
        allow_break: false,
        break_asap: false,
        report: None,
    });

    let shadow = Shadow::new();
    let _write = WriteGuard::new(&shadow);
    let _read = ReadGuard::new(&shadow);
}
