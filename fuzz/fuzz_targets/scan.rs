#![no_main]

use incident_digest::{digest, ScanConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Read errors are fine; we only care about panics.
    let _ = digest(data, &ScanConfig::default());
});
