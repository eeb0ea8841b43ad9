// Copyright (c) 2019 King's College London created by the Software Development
// Team <http://soft-dev.org/>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, or the MIT license <LICENSE-MIT
// or http://opensource.org/licenses/MIT>, or the UPL-1.0 license
// <http://opensource.org/licenses/UPL> at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::env;

fn main() {
    // Editing test programs must not rebuild the library.
    rerun_except::rerun_except(&["guard_tests"]).unwrap();

    println!("cargo:rustc-check-cfg=cfg(guards_enabled)");

    if env::var_os("CARGO_FEATURE_ENABLE").is_none() {
        return;
    }
    // Under a thread sanitizer the detector's intentional races would only
    // add noise to the sanitizer's own reports, so it switches itself off.
    if tsan_active() {
        return;
    }
    println!("cargo:rustc-cfg=guards_enabled");
}

fn tsan_active() -> bool {
    let encoded = env::var("CARGO_ENCODED_RUSTFLAGS").unwrap_or_default();
    let plain = env::var("RUSTFLAGS").unwrap_or_default();
    encoded
        .split('\x1f')
        .chain(plain.split_whitespace())
        .any(|flag| flag.ends_with("sanitizer=thread"))
}
