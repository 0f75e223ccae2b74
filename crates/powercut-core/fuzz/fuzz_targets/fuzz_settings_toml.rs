//! Fuzz test for settings TOML parsing
//!
//! Tests that settings deserialization and the derived configurations
//! handle arbitrary TOML safely.

#![no_main]

use libfuzzer_sys::fuzz_target;

use powercut_core::Settings;

fuzz_target!(|data: &str| {
    check(data);

    // Test with table wrappers (how they appear in full config)
    for section in ["copy", "crash_window", "generator", "checksum", "paths"] {
        check(&format!("[{}]\n{}", section, data));
    }
});

fn check(data: &str) {
    let Ok(settings) = Settings::from_toml_str(data) else {
        return;
    };

    // Deriving runtime configuration must fail cleanly, never panic
    if let Ok(window) = settings.crash_window() {
        assert!(window.lower() <= window.upper());
    }
    let _ = settings.copy_config();
    let _ = settings.generator_config();
    let _ = settings.checksum_config();
    let _ = settings.checksum_algorithm();

    // Should be able to serialize without panicking
    let _ = toml::to_string_pretty(&settings);
}
