//! Authenticator metadata documents.
//!
//! A metadata document describes one vendor: the trust anchors its
//! attestation certificates chain to and the device models it ships.
//!
//! ```json
//! {
//!   "identifier": "2fb54029-7613-4f1d-94f1-fb876c14a6fe",
//!   "version": 1,
//!   "vendorInfo": { "name": "Yubico", "url": "https://yubico.com" },
//!   "trustedCertificates": ["-----BEGIN CERTIFICATE-----\n..."],
//!   "devices": [
//!     {
//!       "deviceId": "1.3.6.1.4.1.41482.1.1",
//!       "displayName": "Security Key by Yubico",
//!       "transports": 4,
//!       "selectors": [
//!         { "type": "x509Extension", "parameters": { "key": "1.3.6.1.4.1.41482.1.1" } }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// One vendor's metadata document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataObject {
    pub identifier: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,

    /// Vendor information; `null` values are kept here and dropped on output.
    #[serde(default)]
    pub vendor_info: BTreeMap<String, Option<String>>,

    /// PEM-encoded trust anchors, in document order.
    #[serde(default)]
    pub trusted_certificates: Vec<String>,

    /// Device descriptors, in document order.
    #[serde(default)]
    pub devices: Vec<DeviceDescriptor>,
}

impl MetadataObject {
    /// Decode a metadata document from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode an already-parsed JSON document.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Vendor info entries that carry a value.
    pub fn vendor_properties(&self) -> BTreeMap<String, String> {
        self.vendor_info
            .iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| (key.clone(), v.clone())))
            .collect()
    }
}

/// A device model and the selectors that recognise its certificates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// `None` (absent or `null`) matches every certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectors: Option<Vec<Selector>>,

    /// Declared transport bitmask; kept untyped so that a non-numeric value
    /// degrades to "no transports" instead of rejecting the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transports: Option<Value>,

    /// Every other field of the descriptor.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl DeviceDescriptor {
    pub fn is_wildcard(&self) -> bool {
        self.selectors.is_none()
    }

    /// Declared transport bits, 0 when absent or not a number.
    ///
    /// Integers keep their low 32 bits, so negative values set the high
    /// bits (`-1` declares every transport). Floats are truncated toward
    /// zero and saturate at the `i32` range first.
    pub fn declared_transports(&self) -> u32 {
        match &self.transports {
            Some(Value::Number(n)) => {
                if let Some(v) = n.as_i64() {
                    v as u32
                } else if let Some(v) = n.as_u64() {
                    v as u32
                } else {
                    n.as_f64().map_or(0, |f| f as i32 as u32)
                }
            }
            _ => 0,
        }
    }

    /// String-valued fields. Nested structures, numbers, booleans and nulls
    /// are left out.
    pub fn device_properties(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter_map(|(key, value)| value.as_str().map(|s| (key.clone(), s.to_string())))
            .collect()
    }
}

/// A predicate deciding whether a device descriptor applies to a certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selector {
    /// Key into the matcher registry.
    #[serde(rename = "type")]
    pub selector_type: String,

    /// Matcher-specific parameters.
    #[serde(default)]
    pub parameters: Value,
}
