//! Fuzz test for baseline digest parsing
//!
//! The baseline side-file survives a power cut and may hold anything, so
//! parsing its content must never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;

use powercut_core::Checksum;

fuzz_target!(|data: &str| {
    if let Ok(checksum) = Checksum::parse_hex(data) {
        let hex = checksum.to_hex();
        assert_eq!(hex.len(), checksum.algorithm.hex_length());
        assert_eq!(hex, data.trim().to_lowercase());

        // Round trip through the canonical form
        let again = Checksum::parse_hex(&hex).expect("canonical hex must parse");
        assert_eq!(again, checksum);
    }

    let _ = Checksum::parse_hex(&data.to_uppercase());
    let _ = Checksum::parse_hex(&format!("0x{}", data));
});
