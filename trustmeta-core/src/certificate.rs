//! Owned X.509 certificate values.
//!
//! A [`Certificate`] keeps the DER encoding it was parsed from and uses it as
//! its identity: two certificates are equal exactly when their DER bytes are
//! equal, regardless of where they were loaded from. Extensions are captured
//! at parse time so that lookups never need to re-parse the certificate.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use base64::Engine;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use sha3::Sha3_256;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::*;

use crate::error::{MetadataError, Result};

/// DER tag for OCTET STRING.
const DER_OCTET_STRING: u8 = 0x04;

/// A parsed certificate identified by its canonical DER encoding.
#[derive(Clone)]
pub struct Certificate {
    der: Vec<u8>,
    subject: String,
    /// `(dotted OID, extnValue contents)` in certificate order.
    extensions: Vec<(String, Vec<u8>)>,
}

impl Certificate {
    /// Parse a DER-encoded certificate.
    ///
    /// Trailing bytes after the certificate are not part of its identity and
    /// are discarded.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (rest, cert) = X509Certificate::from_der(der)
            .map_err(|e| MetadataError::ParseError(format!("invalid DER certificate: {e}")))?;

        let consumed = der.len() - rest.len();

        let mut extensions: Vec<(String, Vec<u8>)> = Vec::with_capacity(cert.extensions().len());
        for ext in cert.extensions() {
            let oid = ext.oid.to_id_string();
            if extensions.iter().any(|(known, _)| *known == oid) {
                continue;
            }
            extensions.push((oid, ext.value.to_vec()));
        }

        Ok(Self {
            der: der[..consumed].to_vec(),
            subject: cert.subject().to_string(),
            extensions,
        })
    }

    /// Parse a PEM-encoded certificate.
    ///
    /// Metadata documents sometimes carry the bare base64 body without the
    /// `-----BEGIN CERTIFICATE-----` armor; both forms are accepted.
    pub fn from_pem(pem: &str) -> Result<Self> {
        if !pem.contains("-----BEGIN") {
            return Self::from_base64(pem);
        }

        let (_, pem) = parse_x509_pem(pem.as_bytes())
            .map_err(|e| MetadataError::ParseError(format!("invalid PEM: {e}")))?;

        Self::from_der(&pem.contents)
    }

    /// Parse a base64-encoded DER certificate. Whitespace is ignored.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(MetadataError::ParseError("empty certificate".into()));
        }

        let der = base64::engine::general_purpose::STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| MetadataError::ParseError(format!("invalid base64: {e}")))?;

        Self::from_der(&der)
    }

    /// The canonical DER encoding.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// The subject distinguished name, for display and logging.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The `extnValue` contents of the extension with the given dotted OID.
    pub fn extension(&self, oid: &str) -> Option<&[u8]> {
        self.extensions
            .iter()
            .find(|(known, _)| known == oid)
            .map(|(_, value)| value.as_slice())
    }

    /// The extension value still wrapped in its DER OCTET STRING.
    pub fn extension_value(&self, oid: &str) -> Option<Vec<u8>> {
        self.extension(oid).map(wrap_octet_string)
    }

    /// Dotted OIDs of all extensions present.
    pub fn extension_oids(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(|(oid, _)| oid.as_str())
    }

    /// Digest of the DER encoding.
    pub fn digest(&self, algorithm: FingerprintAlgorithm) -> Vec<u8> {
        match algorithm {
            FingerprintAlgorithm::Sha1 => Sha1::digest(&self.der).to_vec(),
            FingerprintAlgorithm::Sha256 => Sha256::digest(&self.der).to_vec(),
            FingerprintAlgorithm::Sha3_256 => Sha3_256::digest(&self.der).to_vec(),
        }
    }

    /// Lowercase hex digest of the DER encoding.
    pub fn fingerprint(&self, algorithm: FingerprintAlgorithm) -> String {
        hex::encode(self.digest(algorithm))
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl Hash for Certificate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.der.hash(state);
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject)
            .field("der_len", &self.der.len())
            .field("extensions", &self.extensions.len())
            .finish()
    }
}

/// Hash algorithm used for certificate fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FingerprintAlgorithm {
    /// SHA-1, the algorithm used by published metadata fingerprints.
    #[default]
    #[serde(rename = "SHA-1")]
    Sha1,
    #[serde(rename = "SHA-256")]
    Sha256,
    #[serde(rename = "SHA3-256")]
    Sha3_256,
}

impl FromStr for FingerprintAlgorithm {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();

        match normalized.as_str() {
            "SHA1" => Ok(Self::Sha1),
            "SHA256" => Ok(Self::Sha256),
            "SHA3256" => Ok(Self::Sha3_256),
            _ => Err(MetadataError::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for FingerprintAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "SHA-1"),
            Self::Sha256 => write!(f, "SHA-256"),
            Self::Sha3_256 => write!(f, "SHA3-256"),
        }
    }
}

/// Wrap `content` in a DER OCTET STRING header.
fn wrap_octet_string(content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + 6);
    out.push(DER_OCTET_STRING);
    push_der_length(&mut out, content.len());
    out.extend_from_slice(content);
    out
}

fn push_der_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    let significant = &bytes[skip..];
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
}
