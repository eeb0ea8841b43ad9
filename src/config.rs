// Copyright (c) 2019 King's College London created by the Software Development
// Team <http://soft-dev.org/>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, or the MIT license <LICENSE-MIT
// or http://opensource.org/licenses/MIT>, or the UPL-1.0 license
// <http://opensource.org/licenses/UPL> at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Process-wide detector policy. Expected to be set once during startup and
//! read from arbitrary threads on the slow path only; the fast path never
//! touches it.

use parking_lot::Mutex;

use crate::report::default_report;
use crate::shadow::AccessState;

/// Reporting sink signature: receives the previously observed shadow word,
/// the attempted transition's target state, the severity, and the optional
/// caller-supplied message. The return value says whether a (deferred)
/// debug break is allowed; sinks return `false` to keep headless runs alive.
pub type ReportFn =
    fn(prev: usize, target: AccessState, is_assertion: bool, message: Option<&str>) -> bool;

/// Process-wide configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GuardConfig {
    /// Master switch for trapping into the debugger.
    pub allow_break: bool,
    /// Trap before reporting rather than after. Set this when a debugger is
    /// attached; leave it off in headless runs so the report reaches the
    /// logs (or a minidump) first.
    pub break_asap: bool,
    /// Reporting sink. `None` selects the built-in stderr sink.
    pub report: Option<ReportFn>,
}

impl Default for GuardConfig {
    fn default() -> GuardConfig {
        GuardConfig {
            allow_break: true,
            break_asap: false,
            report: Some(default_report),
        }
    }
}

static CONFIG: Mutex<GuardConfig> = Mutex::new(GuardConfig {
    allow_break: true,
    break_asap: false,
    report: None,
});

/// Snapshot of the current configuration.
pub fn config() -> GuardConfig {
    let mut config = *CONFIG.lock();
    if config.report.is_none() {
        config.report = Some(default_report);
    }
    config
}

/// Replaces the process-wide configuration. A `None` sink is replaced with
/// the built-in stderr sink.
pub fn set_config(new: GuardConfig) {
    let mut config = new;
    if config.report.is_none() {
        config.report = Some(default_report);
    }
    *CONFIG.lock() = config;
}
