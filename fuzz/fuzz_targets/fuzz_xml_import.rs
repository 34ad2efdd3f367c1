#![no_main]

use libfuzzer_sys::fuzz_target;
use rbxplace::{ImportConfig, parse_import};

fuzz_target!(|data: &[u8]| {
    // Any document must either parse or fail cleanly
    if let Ok(xml) = std::str::from_utf8(data) {
        let _ = parse_import(xml, &ImportConfig::default().with_max_depth(64));
    }
});
