use serde_json::Value;
use tracing::warn;

use super::DeviceMatcher;
use crate::certificate::{Certificate, FingerprintAlgorithm};

/// Matches certificates by the digest of their DER encoding.
///
/// ```json
/// { "fingerprints": ["d8a4...", "0b62..."] }
/// { "algorithm": "SHA-256", "fingerprint": "AB:CD:..." }
/// ```
///
/// The algorithm defaults to SHA-1. Fingerprints are compared as hex,
/// ignoring case, whitespace and `:` separators.
#[derive(Debug, Clone, Copy, Default)]
pub struct FingerprintMatcher;

impl FingerprintMatcher {
    pub const SELECTOR_TYPE: &'static str = "fingerprint";
}

impl DeviceMatcher for FingerprintMatcher {
    fn matches(&self, certificate: &Certificate, parameters: &Value) -> bool {
        let algorithm = match parameters.get("algorithm").and_then(Value::as_str) {
            Some(name) => match name.parse::<FingerprintAlgorithm>() {
                Ok(algorithm) => algorithm,
                Err(e) => {
                    warn!(error = %e, "Fingerprint selector skipped");
                    return false;
                }
            },
            None => FingerprintAlgorithm::default(),
        };

        let mut candidates = parameters
            .get("fingerprints")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .chain(parameters.get("fingerprint"))
            .filter_map(Value::as_str)
            .peekable();

        if candidates.peek().is_none() {
            return false;
        }

        let actual = certificate.fingerprint(algorithm);
        candidates.any(|candidate| normalize(candidate) == actual)
    }
}

fn normalize(fingerprint: &str) -> String {
    fingerprint
        .chars()
        .filter(|c| *c != ':' && !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase()
}
