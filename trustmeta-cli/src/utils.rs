//! Common utility functions shared across CLI commands.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::debug;
use trustmeta_core::{Certificate, MetadataObject, Transport};

/// Environment variable holding default metadata paths.
pub const METADATA_ENV: &str = "TRUSTMETA_METADATA";

/// Load a certificate, trying PEM, then DER, then base64-encoded DER.
///
/// Armored input is only ever parsed as PEM, so its parse error is reported as is.
pub fn load_certificate(path: &Path) -> Result<Certificate> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read certificate file: {}", path.display()))?;
    let text = std::str::from_utf8(&bytes).ok();

    if let Some(pem) = text.filter(|t| t.contains("-----BEGIN")) {
        let cert = Certificate::from_pem(pem)
            .with_context(|| format!("Failed to parse PEM certificate {}", path.display()))?;
        debug!(format = "pem", "Parsed certificate");
        return Ok(cert);
    }

    let certificate = if let Ok(cert) = Certificate::from_der(&bytes) {
        debug!(format = "der", "Parsed certificate");
        cert
    } else if let Some(cert) = text.and_then(|t| Certificate::from_base64(t).ok()) {
        debug!(format = "base64", "Parsed certificate");
        cert
    } else {
        bail!(
            "Failed to parse certificate {} (tried DER and base64)",
            path.display()
        );
    };

    Ok(certificate)
}

/// Load and parse a metadata document.
pub fn load_metadata(path: &Path) -> Result<MetadataObject> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read metadata file: {}", path.display()))?;

    let record = MetadataObject::from_json(&json)
        .with_context(|| format!("Invalid metadata file: {}", path.display()))?;
    debug!(path = %path.display(), identifier = %record.identifier, "Loaded metadata");

    Ok(record)
}

/// Metadata paths from `TRUSTMETA_METADATA`, split on the platform path separator.
pub fn metadata_paths_from_env() -> Vec<PathBuf> {
    std::env::var_os(METADATA_ENV)
        .map(|value| {
            std::env::split_paths(&value)
                .filter(|p| !p.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Explicit metadata paths, falling back to the environment.
pub fn metadata_paths(explicit: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    let paths = if explicit.is_empty() {
        metadata_paths_from_env()
    } else {
        explicit
    };

    if paths.is_empty() {
        bail!("No metadata files given (pass --metadata or set {METADATA_ENV})");
    }
    Ok(paths)
}

/// Load every metadata document, failing on the first unreadable one.
pub fn load_all_metadata(paths: &[PathBuf]) -> Result<Vec<MetadataObject>> {
    paths.iter().map(|p| load_metadata(p)).collect()
}

/// Human-readable transport list.
pub fn format_transports(transports: &BTreeSet<Transport>) -> String {
    if transports.is_empty() {
        return "none".to_string();
    }
    transports
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_transports() {
        assert_eq!(format_transports(&BTreeSet::new()), "none");
        assert_eq!(
            format_transports(&BTreeSet::from([Transport::Nfc, Transport::Usb])),
            "usb, nfc"
        );
    }

    #[test]
    fn test_explicit_metadata_paths_win() {
        let explicit = vec![PathBuf::from("a.json"), PathBuf::from("b.json")];
        assert_eq!(metadata_paths(explicit.clone()).unwrap(), explicit);
    }

    #[test]
    fn test_missing_files_report_read_failure() {
        let err = load_certificate(Path::new("does-not-exist.pem")).unwrap_err();
        assert!(err.to_string().contains("Failed to read certificate file"));

        let err = load_metadata(Path::new("does-not-exist.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read metadata file"));
    }

    #[test]
    fn test_broken_pem_reports_pem_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pem");
        std::fs::write(
            &path,
            "-----BEGIN CERTIFICATE-----\nnot base64!\n-----END CERTIFICATE-----\n",
        )
        .unwrap();

        let message = format!("{:#}", load_certificate(&path).unwrap_err());
        assert!(message.contains("Failed to parse PEM certificate"));
        assert!(message.contains("invalid PEM"));
        assert!(!message.contains("DER and base64"));
    }
}
