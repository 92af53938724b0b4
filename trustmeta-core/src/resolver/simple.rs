use tracing::{debug, instrument};

use super::{Attestation, AttestationResolver};
use crate::certificate::Certificate;
use crate::error::Result;
use crate::matcher::MatcherRegistry;
use crate::metadata::{DeviceDescriptor, MetadataObject};
use crate::transport::{extract_transports, Transport};
use crate::trust_anchor::TrustAnchorIndex;

/// Resolver backed by an in-memory set of metadata documents.
///
/// Built once; resolution afterwards only reads the index and the matcher
/// registry, so a single instance can serve any number of threads.
///
/// ```no_run
/// use trustmeta_core::{AttestationResolver, Certificate, SimpleAttestationResolver};
///
/// # fn example(metadata_json: &str, cert_pem: &str, anchor_pem: &str) -> trustmeta_core::Result<()> {
/// let resolver = SimpleAttestationResolver::from_metadata_json(metadata_json)?;
/// let certificate = Certificate::from_pem(cert_pem)?;
/// let anchor = Certificate::from_pem(anchor_pem)?;
///
/// let attestation = resolver
///     .resolve(&certificate, Some(&anchor))
///     .unwrap_or_else(|| resolver.untrusted_from_certificate(&certificate));
/// println!("trusted: {}", attestation.trusted);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SimpleAttestationResolver {
    index: TrustAnchorIndex,
    matchers: MatcherRegistry,
}

impl SimpleAttestationResolver {
    /// Build a resolver with the default matchers.
    pub fn new<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = MetadataObject>,
    {
        Self::with_matchers(records, MatcherRegistry::default())
    }

    /// Build a resolver with a caller-supplied matcher registry.
    #[instrument(level = "debug", skip_all, fields(selector_types = ?matchers.selector_types()))]
    pub fn with_matchers<I>(records: I, matchers: MatcherRegistry) -> Result<Self>
    where
        I: IntoIterator<Item = MetadataObject>,
    {
        Ok(Self {
            index: TrustAnchorIndex::build(records)?,
            matchers,
        })
    }

    /// Build a resolver from a single JSON metadata document.
    pub fn from_metadata_json(json: &str) -> Result<Self> {
        Self::new([MetadataObject::from_json(json)?])
    }

    /// Build a resolver from several JSON metadata documents, in order.
    pub fn from_metadata_documents<I, S>(documents: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let records = documents
            .into_iter()
            .map(|doc| MetadataObject::from_json(doc.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Self::new(records)
    }

    pub fn trust_anchors(&self) -> &TrustAnchorIndex {
        &self.index
    }

    pub fn matchers(&self) -> &MatcherRegistry {
        &self.matchers
    }

    /// First device descriptor, in document order, that applies to
    /// `certificate`.
    fn select_device<'a>(
        &self,
        record: &'a MetadataObject,
        certificate: &Certificate,
    ) -> Option<&'a DeviceDescriptor> {
        record
            .devices
            .iter()
            .find(|device| self.device_matches(device, certificate))
    }

    fn device_matches(&self, device: &DeviceDescriptor, certificate: &Certificate) -> bool {
        match &device.selectors {
            None => true,
            Some(selectors) => selectors
                .iter()
                .any(|selector| self.matchers.matches(certificate, selector)),
        }
    }
}

impl AttestationResolver for SimpleAttestationResolver {
    fn resolve(
        &self,
        certificate: &Certificate,
        trust_anchor: Option<&Certificate>,
    ) -> Option<Attestation> {
        let record = self.index.lookup(trust_anchor?)?;

        let device = self.select_device(record, certificate);
        debug!(
            identifier = %record.identifier,
            device_matched = device.is_some(),
            "Resolved trust anchor"
        );

        let device_transports = device.map_or(0, DeviceDescriptor::declared_transports);
        let transports = extract_transports(certificate) | device_transports;

        Some(Attestation {
            trusted: true,
            metadata_identifier: Some(record.identifier.clone()),
            vendor_properties: Some(record.vendor_properties()),
            device_properties: device.map(DeviceDescriptor::device_properties),
            transports: Some(Transport::from_bits(transports)),
        })
    }

    fn untrusted_from_certificate(&self, certificate: &Certificate) -> Attestation {
        Attestation::untrusted(Transport::from_bits(extract_transports(certificate)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::certificate::FingerprintAlgorithm;
    use crate::error::MetadataError;
    use crate::test_support::{generate_certificate, metadata_document};
    use serde_json::{json, Value};

    const TRANSPORTS_OID: &[u64] = &[1, 3, 6, 1, 4, 1, 45724, 2, 1, 1];
    const DEVICE_OID: &[u64] = &[1, 3, 6, 1, 4, 1, 41482, 1, 7];

    fn resolver(anchor_pem: &str, devices: Value) -> SimpleAttestationResolver {
        let doc = metadata_document("vendor-id", &[anchor_pem], devices);
        SimpleAttestationResolver::from_metadata_json(&doc.to_string()).unwrap()
    }

    #[test]
    fn test_missing_or_unknown_anchor_is_none() {
        let anchor = generate_certificate("Anchor", &[]);
        let stranger = generate_certificate("Stranger", &[]);
        let leaf = generate_certificate("Leaf", &[]);
        let resolver = resolver(&anchor.pem, json!([]));

        assert!(resolver.resolve(&leaf.certificate, None).is_none());
        assert!(resolver
            .resolve(&leaf.certificate, Some(&stranger.certificate))
            .is_none());
    }

    #[test]
    fn test_trusted_without_device_match() {
        let anchor = generate_certificate("Anchor", &[]);
        let leaf = generate_certificate("Leaf", &[]);
        let resolver = resolver(
            &anchor.pem,
            json!([{ "displayName": "Other", "selectors": [
                { "type": "x509Extension", "parameters": { "key": "1.2.3.4" } }
            ] }]),
        );

        let attestation = resolver
            .resolve(&leaf.certificate, Some(&anchor.certificate))
            .unwrap();

        assert!(attestation.trusted);
        assert_eq!(attestation.metadata_identifier.as_deref(), Some("vendor-id"));
        assert_eq!(attestation.vendor_property("name"), Some("Example Vendor"));
        // imageUrl is null in the fixture
        assert_eq!(attestation.vendor_properties.as_ref().unwrap().len(), 2);
        assert!(attestation.device_properties.is_none());
        assert_eq!(attestation.transports, Some(BTreeSet::new()));
    }

    #[test]
    fn test_first_match_wins() {
        let anchor = generate_certificate("Anchor", &[]);
        let leaf = generate_certificate("Leaf", &[(DEVICE_OID, vec![0x05, 0x00])]);
        let fingerprint = leaf.certificate.fingerprint(FingerprintAlgorithm::Sha1);
        let resolver = resolver(
            &anchor.pem,
            json!([
                { "displayName": "First", "transports": 4, "selectors": [
                    { "type": "fingerprint", "parameters": { "fingerprints": [fingerprint] } }
                ] },
                { "displayName": "Second", "transports": 8, "selectors": [
                    { "type": "x509Extension", "parameters": { "key": "1.3.6.1.4.1.41482.1.7" } }
                ] }
            ]),
        );

        let attestation = resolver
            .resolve(&leaf.certificate, Some(&anchor.certificate))
            .unwrap();

        assert_eq!(attestation.device_property("displayName"), Some("First"));
        assert_eq!(
            attestation.transports,
            Some(BTreeSet::from([Transport::Usb]))
        );
    }

    #[test]
    fn test_any_selector_of_a_device_matches() {
        let anchor = generate_certificate("Anchor", &[]);
        let leaf = generate_certificate("Leaf", &[(DEVICE_OID, vec![0x05, 0x00])]);
        let resolver = resolver(
            &anchor.pem,
            json!([{ "displayName": "Key", "selectors": [
                { "type": "unknownType", "parameters": {} },
                { "type": "fingerprint", "parameters": { "fingerprints": ["00"] } },
                { "type": "extension", "parameters": { "key": "1.3.6.1.4.1.41482.1.7" } }
            ] }]),
        );

        let attestation = resolver
            .resolve(&leaf.certificate, Some(&anchor.certificate))
            .unwrap();
        assert_eq!(attestation.device_property("displayName"), Some("Key"));
    }

    #[test]
    fn test_wildcard_device_matches_anything() {
        let anchor = generate_certificate("Anchor", &[]);
        let resolver = resolver(
            &anchor.pem,
            json!([
                { "displayName": "Specific", "selectors": [] },
                { "displayName": "Catch-all", "selectors": null, "certificationLevel": 1 }
            ]),
        );

        for name in ["One", "Two"] {
            let leaf = generate_certificate(name, &[]);
            let attestation = resolver
                .resolve(&leaf.certificate, Some(&anchor.certificate))
                .unwrap();
            let props = attestation.device_properties.unwrap();
            assert_eq!(props.get("displayName").map(String::as_str), Some("Catch-all"));
            assert!(!props.contains_key("certificationLevel"));
        }
    }

    #[test]
    fn test_transports_union() {
        let anchor = generate_certificate("Anchor", &[]);
        // certificate asserts NFC
        let leaf = generate_certificate("Leaf", &[(TRANSPORTS_OID, vec![0x03, 0x02, 0x04, 0x10])]);
        let resolver = resolver(
            &anchor.pem,
            json!([{ "displayName": "Key", "transports": 4 }]),
        );

        let attestation = resolver
            .resolve(&leaf.certificate, Some(&anchor.certificate))
            .unwrap();
        assert_eq!(
            attestation.transports,
            Some(BTreeSet::from([Transport::Usb, Transport::Nfc]))
        );
    }

    #[test]
    fn test_non_numeric_device_transports_ignored() {
        let anchor = generate_certificate("Anchor", &[]);
        let leaf = generate_certificate("Leaf", &[(TRANSPORTS_OID, vec![0x03, 0x02, 0x05, 0x20])]);
        let resolver = resolver(
            &anchor.pem,
            json!([{ "displayName": "Key", "transports": "usb,nfc" }]),
        );

        let attestation = resolver
            .resolve(&leaf.certificate, Some(&anchor.certificate))
            .unwrap();
        assert_eq!(attestation.transports, Some(BTreeSet::from([Transport::Usb])));
    }

    #[test]
    fn test_oversized_device_transports_keep_low_bits() {
        let anchor = generate_certificate("Anchor", &[]);
        let leaf = generate_certificate("Leaf", &[]);
        let resolver = resolver(
            &anchor.pem,
            json!([{ "displayName": "Key", "transports": 4_294_967_300u64 }]),
        );

        let attestation = resolver
            .resolve(&leaf.certificate, Some(&anchor.certificate))
            .unwrap();
        assert_eq!(attestation.transports, Some(BTreeSet::from([Transport::Usb])));
    }

    #[test]
    fn test_untrusted_from_certificate() {
        let anchor = generate_certificate("Anchor", &[]);
        let leaf = generate_certificate("Leaf", &[(TRANSPORTS_OID, vec![0x03, 0x02, 0x06, 0x40])]);
        let resolver = resolver(&anchor.pem, json!([{ "displayName": "Key", "transports": 8 }]));

        let attestation = resolver.untrusted_from_certificate(&leaf.certificate);
        assert_eq!(attestation, Attestation::untrusted(BTreeSet::from([Transport::Ble])));

        // Even the trust anchor itself yields no metadata on this path.
        let attestation = resolver.untrusted_from_certificate(&anchor.certificate);
        assert!(!attestation.trusted);
        assert!(attestation.metadata_identifier.is_none());
        assert!(attestation.vendor_properties.is_none());
        assert!(attestation.device_properties.is_none());
    }

    #[test]
    fn test_custom_matchers() {
        let anchor = generate_certificate("Anchor", &[]);
        let leaf = generate_certificate("Leaf", &[]);
        let doc = metadata_document(
            "vendor-id",
            &[anchor.pem.as_str()],
            json!([{ "displayName": "Key", "selectors": [{ "type": "always" }] }]),
        );

        let plain = SimpleAttestationResolver::new([MetadataObject::from_value(doc.clone()).unwrap()]).unwrap();
        let custom = SimpleAttestationResolver::with_matchers(
            [MetadataObject::from_value(doc).unwrap()],
            MatcherRegistry::empty().with_matcher("always", |_: &Certificate, _: &Value| true),
        )
        .unwrap();

        let plain = plain.resolve(&leaf.certificate, Some(&anchor.certificate)).unwrap();
        let custom = custom.resolve(&leaf.certificate, Some(&anchor.certificate)).unwrap();
        assert!(plain.device_properties.is_none());
        assert_eq!(custom.device_property("displayName"), Some("Key"));
    }

    #[test]
    fn test_from_metadata_documents() {
        let first = generate_certificate("First", &[]);
        let second = generate_certificate("Second", &[]);
        let leaf = generate_certificate("Leaf", &[]);
        let docs = [
            metadata_document("first", &[first.pem.as_str()], json!([])).to_string(),
            metadata_document("second", &[second.pem.as_str()], json!([])).to_string(),
        ];

        let resolver = SimpleAttestationResolver::from_metadata_documents(&docs).unwrap();
        assert_eq!(resolver.trust_anchors().len(), 2);
        assert_eq!(
            resolver
                .resolve(&leaf.certificate, Some(&second.certificate))
                .unwrap()
                .metadata_identifier
                .as_deref(),
            Some("second")
        );
    }

    #[test]
    fn test_construction_errors() {
        assert!(matches!(
            SimpleAttestationResolver::from_metadata_json("[]"),
            Err(MetadataError::InvalidMetadata(_))
        ));

        let doc = metadata_document("broken", &["not a certificate"], json!([]));
        assert!(matches!(
            SimpleAttestationResolver::from_metadata_json(&doc.to_string()),
            Err(MetadataError::ParseError(_))
        ));
    }

    #[test]
    fn test_resolver_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SimpleAttestationResolver>();
    }
}
