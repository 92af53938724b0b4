use serde_json::Value;
use tracing::warn;
use x509_parser::der_parser::parse_der;

use super::DeviceMatcher;
use crate::certificate::Certificate;

/// Matches on the presence, and optionally the value, of an X.509 extension.
///
/// Parameters:
///
/// ```json
/// { "key": "1.3.6.1.4.1.41482.1.2" }
/// { "key": "1.3.6.1.4.1.41482.1.2", "value": "expected text" }
/// { "key": "1.3.6.1.4.1.41482.1.2", "value": { "type": "hex", "value": "04a1" } }
/// ```
///
/// Values are compared against the content octets of the DER value inside
/// the extension (the OCTET STRING or character string payload), falling back
/// to the raw extension bytes when they are not a single DER primitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionMatcher;

impl ExtensionMatcher {
    pub const SELECTOR_TYPE: &'static str = "x509Extension";
    pub const SELECTOR_TYPE_ALIAS: &'static str = "extension";
}

impl DeviceMatcher for ExtensionMatcher {
    fn matches(&self, certificate: &Certificate, parameters: &Value) -> bool {
        let Some(key) = parameters.get("key").and_then(Value::as_str) else {
            warn!(?parameters, "Extension selector without a key");
            return false;
        };

        let Some(raw) = certificate.extension(key) else {
            return false;
        };

        match parameters.get("value") {
            None | Some(Value::Null) => true,
            Some(Value::String(expected)) => decoded_value(raw) == expected.as_bytes(),
            Some(Value::Object(typed)) => {
                match (
                    typed.get("type").and_then(Value::as_str),
                    typed.get("value").and_then(Value::as_str),
                ) {
                    (Some("hex"), Some(expected)) => hex::decode(expected)
                        .map(|bytes| bytes == decoded_value(raw))
                        .unwrap_or(false),
                    (kind, _) => {
                        warn!(?kind, "Unsupported extension value type");
                        false
                    }
                }
            }
            Some(other) => {
                warn!(value = %other, "Unsupported extension value");
                false
            }
        }
    }
}

fn decoded_value(raw: &[u8]) -> &[u8] {
    match parse_der(raw) {
        Ok((rest, object)) if rest.is_empty() => object.as_slice().unwrap_or(raw),
        _ => raw,
    }
}
