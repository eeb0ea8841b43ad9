// Run-time:
//   status: success

extern crate shadowguard;

use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use shadowguard::{
    classify_bad_access, find_thread_with_addr, mark_of, set_config, state_of, AccessState,
    BadAccessKind, GuardConfig, ReadGuard, RegisteredThread, Shadow, WriteGuard,
};

struct Report {
    kind: BadAccessKind,
    prev_state: Option<AccessState>,
    target: AccessState,
    other: Option<(u64, String)>,
}

static REPORTS: Mutex<Vec<Report>> = Mutex::new(Vec::new());

fn sink(prev: usize, target: AccessState, _is_assertion: bool, _message: Option<&str>) -> bool {
    REPORTS.lock().unwrap().push(Report {
        kind: classify_bad_access(prev),
        prev_state: state_of(prev),
        target,
        other: find_thread_with_addr(mark_of(prev)),
    });
    false
}

// A reader races a writer that is parked inside its scope on another thread.
// The reader reports, and the registry puts a name and id on the writer.
fn main() {
    set_config(GuardConfig {
        allow_break: false,
        break_asap: false,
        report: Some(sink),
    });

    let shadow = Arc::new(Shadow::new());
    let entered = Arc::new(Barrier::new(2));
    let done = Arc::new(Barrier::new(2));

    let writer = {
        let shadow = Arc::clone(&shadow);
        let entered = Arc::clone(&entered);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let _registration = RegisteredThread::new("unsafe writer");
            let _write = WriteGuard::new(&shadow);
            entered.wait();
            // Hold the write open, unsynchronized on purpose, until the
            // reader has raced it.
            done.wait();
        })
    };

    entered.wait();
    {
        let _read = ReadGuard::new(&shadow);
    }
    done.wait();
    writer.join().unwrap();

    let reports = REPORTS.lock().unwrap();
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.kind, BadAccessKind::CrossThreadRace);
    assert_eq!(report.prev_state, Some(AccessState::Writing));
    assert_eq!(report.target, AccessState::ReadingOrIdle);
    let (id, name) = report.other.as_ref().expect("writer thread not identified");
    assert_ne!(*id, 0);
    assert_eq!(name.as_str(), "unsafe writer");
}
