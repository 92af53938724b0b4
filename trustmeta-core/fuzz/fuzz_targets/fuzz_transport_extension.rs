#![no_main]

//! Fuzz target for decode_transport_extension()
//!
//! The decoder sees attacker-controlled certificate bytes, so it must accept
//! any input without panicking and never report bits beyond the content.
//!
//! Run with: cargo +nightly fuzz run fuzz_transport_extension

use libfuzzer_sys::fuzz_target;
use trustmeta_core::{decode_transport_extension, Transport};

fuzz_target!(|data: &[u8]| {
    let bits = decode_transport_extension(data);

    let content = data.len().saturating_sub(5);
    if content < 4 {
        assert!(u64::from(bits) < 1u64 << (8 * content));
    }

    // Unknown bits are dropped, never rejected
    let _ = Transport::from_bits(bits);
});
