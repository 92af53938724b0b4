//! Trust anchor index.
//!
//! Maps every trusted certificate declared by the loaded metadata documents
//! to the document that declared it. Keys are whole certificates compared by
//! DER encoding, so a lookup only succeeds for the exact anchor, never for a
//! different certificate with the same subject or serial.
//!
//! When two documents declare the same anchor, the document loaded later
//! wins. The overwrite is logged.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::certificate::Certificate;
use crate::error::{MetadataError, Result};
use crate::metadata::MetadataObject;

/// Immutable trust anchor to metadata mapping.
#[derive(Debug, Clone, Default)]
pub struct TrustAnchorIndex {
    anchors: HashMap<Certificate, Arc<MetadataObject>>,
}

impl TrustAnchorIndex {
    /// Index `records`, parsing trust anchors as PEM.
    pub fn build<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = MetadataObject>,
    {
        Self::build_with(records, Certificate::from_pem)
    }

    /// Index `records`, decoding trust anchors with `parse`.
    ///
    /// Fails on the first anchor that does not parse; no partial index is
    /// returned.
    #[instrument(level = "debug", skip_all)]
    pub fn build_with<I, F>(records: I, parse: F) -> Result<Self>
    where
        I: IntoIterator<Item = MetadataObject>,
        F: Fn(&str) -> Result<Certificate>,
    {
        let mut anchors: HashMap<Certificate, Arc<MetadataObject>> = HashMap::new();
        let mut documents = 0usize;

        for record in records {
            let record = Arc::new(record);
            documents += 1;

            for (position, pem) in record.trusted_certificates.iter().enumerate() {
                let anchor = parse(pem.as_str()).map_err(|err| match err {
                    MetadataError::ParseError(msg) => MetadataError::ParseError(format!(
                        "{msg} (metadata {}, trusted certificate #{position})",
                        record.identifier
                    )),
                    other => other,
                })?;

                debug!(
                    identifier = %record.identifier,
                    subject = anchor.subject(),
                    "Indexed trust anchor"
                );

                if let Some(previous) = anchors.insert(anchor, Arc::clone(&record)) {
                    warn!(
                        previous = %previous.identifier,
                        current = %record.identifier,
                        "Trust anchor declared by several metadata documents; keeping the later one"
                    );
                }
            }
        }

        info!(documents, anchors = anchors.len(), "Trust anchor index built");
        Ok(Self { anchors })
    }

    /// The metadata document that declared `anchor`, if any.
    pub fn lookup(&self, anchor: &Certificate) -> Option<&Arc<MetadataObject>> {
        self.anchors.get(anchor)
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Distinct metadata documents reachable from the index.
    pub fn documents(&self) -> Vec<&Arc<MetadataObject>> {
        let mut seen: Vec<&Arc<MetadataObject>> = Vec::new();
        for record in self.anchors.values() {
            if !seen.iter().any(|known| Arc::ptr_eq(known, record)) {
                seen.push(record);
            }
        }
        seen.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        seen
    }
}
