#![no_main]

//! Fuzz target for Certificate::from_der() and the extension accessors
//!
//! Run with: cargo +nightly fuzz run fuzz_certificate

use libfuzzer_sys::fuzz_target;
use trustmeta_core::{extract_transports, Certificate, TRANSPORTS_EXTENSION_OID};

fuzz_target!(|data: &[u8]| {
    if let Ok(certificate) = Certificate::from_der(data) {
        let _ = certificate.extension_value(TRANSPORTS_EXTENSION_OID);
        let _ = extract_transports(&certificate);
        for oid in certificate.extension_oids() {
            let _ = certificate.extension(oid);
        }
    }
});
