//! Fuzz test for artifact file name parsing
//!
//! Path recovery derives the test size from names found on disk, so any
//! file name must parse or be rejected without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;

use powercut_core::{artifact_name, parse_artifact_size};

fuzz_target!(|data: &str| {
    if let Some(size) = parse_artifact_size(data) {
        assert!(size > 0, "Size should be positive");
        // Accepted names are canonical unless the digits carry leading zeros
        if !data.starts_with("large_file_0") {
            assert_eq!(artifact_name(size), data);
        }
    }

    // Wrapped in the expected prefix and suffix
    let wrapped = format!("large_file_{}gb.dat", data);
    if let Some(size) = parse_artifact_size(&wrapped) {
        assert_eq!(parse_artifact_size(&artifact_name(size)), Some(size));
    }
});
