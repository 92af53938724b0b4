//! Attestation resolution.
//!
//! Turns an attestation certificate (and the trust anchor its chain was
//! verified against) into an [`Attestation`]: whether the anchor is known,
//! which vendor and device model produced the certificate, and which
//! transports the authenticator supports.
//!
//! An unknown or missing trust anchor is an ordinary outcome, reported as
//! `None` by [`AttestationResolver::resolve`]; callers that still want the
//! certificate's own claims use
//! [`AttestationResolver::untrusted_from_certificate`].

mod composite;
mod simple;

pub use composite::CompositeAttestationResolver;
pub use simple::SimpleAttestationResolver;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::certificate::Certificate;
use crate::transport::Transport;

/// Resolves attestation certificates against known metadata.
pub trait AttestationResolver: Send + Sync {
    /// Resolve `certificate` issued under `trust_anchor`.
    ///
    /// Returns `None` when no trust anchor is given or it is not known.
    fn resolve(
        &self,
        certificate: &Certificate,
        trust_anchor: Option<&Certificate>,
    ) -> Option<Attestation>;

    /// An untrusted attestation carrying only what the certificate asserts.
    fn untrusted_from_certificate(&self, certificate: &Certificate) -> Attestation;
}

/// Result of resolving an attestation certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attestation {
    pub trusted: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_identifier: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_properties: Option<BTreeMap<String, String>>,

    /// Properties of the matched device model, `None` when no device matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_properties: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transports: Option<BTreeSet<Transport>>,
}

impl Attestation {
    /// Untrusted attestation with the given transports.
    pub fn untrusted(transports: BTreeSet<Transport>) -> Self {
        Self {
            trusted: false,
            metadata_identifier: None,
            vendor_properties: None,
            device_properties: None,
            transports: Some(transports),
        }
    }

    /// Look up a device property, e.g. `displayName`.
    pub fn device_property(&self, key: &str) -> Option<&str> {
        self.device_properties
            .as_ref()
            .and_then(|props| props.get(key))
            .map(String::as_str)
    }

    /// Look up a vendor property, e.g. `name`.
    pub fn vendor_property(&self, key: &str) -> Option<&str> {
        self.vendor_properties
            .as_ref()
            .and_then(|props| props.get(key))
            .map(String::as_str)
    }
}
