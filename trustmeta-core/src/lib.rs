//! Trustmeta Core - WebAuthn attestation metadata resolution
//!
//! This crate resolves the attestation certificate presented during a
//! WebAuthn/FIDO registration ceremony into a trust verdict plus descriptive
//! metadata about the authenticator that produced it.
//!
//! # Features
//!
//! - Trust anchor lookup by exact certificate identity (DER equality)
//! - Ordered, pluggable device matching driven by metadata selectors
//! - Bit-exact decoding of the FIDO transports certificate extension
//!
//! Signature and chain validation are not performed here: the trust anchor
//! passed to [`AttestationResolver::resolve`] is expected to have been
//! established by the caller.
//!
//! # Example
//!
//! ```no_run
//! use trustmeta_core::{AttestationResolver, Certificate, SimpleAttestationResolver};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let metadata = std::fs::read_to_string("yubico-metadata.json")?;
//! let resolver = SimpleAttestationResolver::from_metadata_json(&metadata)?;
//!
//! let certificate = Certificate::from_pem(&std::fs::read_to_string("attestation.pem")?)?;
//! let anchor = Certificate::from_pem(&std::fs::read_to_string("root.pem")?)?;
//!
//! match resolver.resolve(&certificate, Some(&anchor)) {
//!     Some(attestation) => println!("{:?}", attestation.device_property("displayName")),
//!     None => println!("untrusted: {:?}", resolver.untrusted_from_certificate(&certificate)),
//! }
//! # Ok(())
//! # }
//! ```

pub mod certificate;
pub mod error;
pub mod matcher;
pub mod metadata;
pub mod resolver;
pub mod transport;
pub mod trust_anchor;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types for convenience
pub use certificate::{Certificate, FingerprintAlgorithm};
pub use error::{MetadataError, Result};
pub use matcher::{DeviceMatcher, ExtensionMatcher, FingerprintMatcher, MatcherRegistry};
pub use metadata::{DeviceDescriptor, MetadataObject, Selector};
pub use resolver::{
    Attestation, AttestationResolver, CompositeAttestationResolver, SimpleAttestationResolver,
};
pub use transport::{
    decode_transport_extension, encode_transport_extension, extract_transports, Transport,
    TRANSPORTS_EXTENSION_OID,
};
pub use trust_anchor::TrustAnchorIndex;

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::test_support::{generate_certificate, metadata_document};
    use serde_json::json;

    /// Integration test: build from metadata, resolve from several threads.
    #[test]
    fn test_full_resolution_workflow() {
        let transports_oid: &[u64] = &[1, 3, 6, 1, 4, 1, 45724, 2, 1, 1];
        let device_oid: &[u64] = &[1, 3, 6, 1, 4, 1, 41482, 1, 5];

        // Step 1: a vendor root and an attestation certificate claiming USB
        let root = generate_certificate("Vendor Root CA", &[]);
        let leaf = generate_certificate(
            "Vendor Attestation",
            &[
                (transports_oid, vec![0x03, 0x02, 0x05, 0x20]),
                (device_oid, vec![0x05, 0x00]),
            ],
        );

        // Step 2: metadata declaring the root and a device that adds NFC
        let doc = metadata_document(
            "vendor-metadata",
            &[root.pem.as_str()],
            json!([{
                "deviceId": "1.3.6.1.4.1.41482.1.5",
                "displayName": "Vendor Key NFC",
                "transports": 8,
                "selectors": [{
                    "type": "x509Extension",
                    "parameters": { "key": "1.3.6.1.4.1.41482.1.5" }
                }]
            }]),
        );
        let resolver =
            Arc::new(SimpleAttestationResolver::from_metadata_json(&doc.to_string()).unwrap());

        // Step 3: resolve concurrently
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                let leaf = leaf.certificate.clone();
                let root = root.certificate.clone();
                thread::spawn(move || resolver.resolve(&leaf, Some(&root)))
            })
            .collect();

        for handle in handles {
            let attestation = handle.join().unwrap().expect("trusted attestation");
            assert!(attestation.trusted);
            assert_eq!(attestation.metadata_identifier.as_deref(), Some("vendor-metadata"));
            assert_eq!(attestation.device_property("displayName"), Some("Vendor Key NFC"));
            assert_eq!(
                attestation.transports,
                Some(BTreeSet::from([Transport::Usb, Transport::Nfc]))
            );
        }

        // Step 4: without a trust anchor only the certificate's claims remain
        let untrusted = resolver.untrusted_from_certificate(&leaf.certificate);
        assert!(!untrusted.trusted);
        assert_eq!(untrusted.transports, Some(BTreeSet::from([Transport::Usb])));
    }
}
