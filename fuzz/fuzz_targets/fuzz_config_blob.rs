//! Fuzz target: stored config blob decoding
//!
//! Treats the input as the NVS `cfg` blob. Invariants checked:
//! - No panics while decoding or validating
//! - Any blob that decodes and validates re-encodes to the same config
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use libfuzzer_sys::fuzz_target;
use tramrun::config::TramConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(cfg) = postcard::from_bytes::<TramConfig>(data) else {
        return;
    };
    if cfg.validate().is_err() {
        return;
    }
    let bytes = postcard::to_allocvec(&cfg).expect("valid config must encode");
    let back: TramConfig = postcard::from_bytes(&bytes).expect("re-decode");
    assert_eq!(back, cfg);
});
