//! Fuzz test for size string parsing
//!
//! Tests that the settings size parser handles arbitrary inputs safely.

#![no_main]

use libfuzzer_sys::fuzz_target;

use powercut_core::settings::parse_size;

fuzz_target!(|data: &str| {
    if let Ok(size) = parse_size("fuzz", data) {
        assert!(size > 0, "Size should be positive");
    }

    for suffix in ["", "B", "K", "KB", "M", "MB", "G", "GB", "k", "m", "g", "b"] {
        let test_input = format!("{}{}", data.trim(), suffix);
        let _ = parse_size("fuzz", &test_input);
    }

    let whitespace_input = format!("  {}  ", data);
    let _ = parse_size("fuzz", &whitespace_input);
});
