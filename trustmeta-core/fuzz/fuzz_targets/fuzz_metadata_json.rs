#![no_main]

//! Fuzz target for MetadataObject::from_json() and resolver construction
//!
//! Run with: cargo +nightly fuzz run fuzz_metadata_json

use libfuzzer_sys::fuzz_target;
use trustmeta_core::{MetadataObject, SimpleAttestationResolver};

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(record) = MetadataObject::from_json(json) {
        // Device accessors must tolerate whatever the document declared
        for device in &record.devices {
            let _ = device.declared_transports();
            let _ = device.device_properties();
        }
        let _ = record.vendor_properties();
        let _ = SimpleAttestationResolver::new(vec![record]);
    }
});
