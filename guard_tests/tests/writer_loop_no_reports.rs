// Run-time:
//   status: success

extern crate shadowguard;

use std::sync::atomic::{AtomicUsize, Ordering};

use shadowguard::{set_config, state_of, AccessState, GuardConfig, Shadow, WriteGuard};

static REPORTS: AtomicUsize = AtomicUsize::new(0);

fn sink(_prev: usize, _target: AccessState, _is_assertion: bool, _message: Option<&str>) -> bool {
    REPORTS.fetch_add(1, Ordering::Relaxed);
    false
}

// An exclusive writer only ever observes its own transitions: a million
// write scopes, not one report, idle before and after each.
fn main() {
    set_config(GuardConfig {
        allow_break: false,
        break_asap: false,
        report: Some(sink),
    });

    let shadow = Shadow::new();
    for _ in 0..1_000_000 {
        assert_eq!(state_of(shadow.load()), Some(AccessState::ReadingOrIdle));
        {
            let _write = WriteGuard::new(&shadow);
            assert_eq!(state_of(shadow.load()), Some(AccessState::Writing));
        }
        assert_eq!(state_of(shadow.load()), Some(AccessState::ReadingOrIdle));
    }
    assert_eq!(REPORTS.load(Ordering::Relaxed), 0);
}
