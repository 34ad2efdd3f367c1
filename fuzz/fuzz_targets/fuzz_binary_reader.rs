#![no_main]

use libfuzzer_sys::fuzz_target;
use rbxplace::binary::reader::PlaceFile;

fuzz_target!(|data: &[u8]| {
    if let Ok(file) = PlaceFile::parse(data) {
        let _ = file.metadata();
        let _ = file.properties();
        let _ = file.parents();
    }
});
