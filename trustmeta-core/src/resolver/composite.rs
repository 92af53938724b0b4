use std::fmt;
use std::sync::Arc;

use super::{Attestation, AttestationResolver};
use crate::certificate::Certificate;
use crate::transport::{extract_transports, Transport};

/// Tries several resolvers in order and returns the first result.
///
/// Useful when metadata comes from independent sources, e.g. a vendor's
/// own document plus a locally maintained one, that should not share a
/// single trust anchor index.
#[derive(Clone, Default)]
pub struct CompositeAttestationResolver {
    resolvers: Vec<Arc<dyn AttestationResolver>>,
}

impl CompositeAttestationResolver {
    pub fn new(resolvers: Vec<Arc<dyn AttestationResolver>>) -> Self {
        Self { resolvers }
    }

    /// Append a resolver with the lowest priority so far.
    pub fn with_resolver<R>(mut self, resolver: R) -> Self
    where
        R: AttestationResolver + 'static,
    {
        self.resolvers.push(Arc::new(resolver));
        self
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl AttestationResolver for CompositeAttestationResolver {
    fn resolve(
        &self,
        certificate: &Certificate,
        trust_anchor: Option<&Certificate>,
    ) -> Option<Attestation> {
        self.resolvers
            .iter()
            .find_map(|resolver| resolver.resolve(certificate, trust_anchor))
    }

    fn untrusted_from_certificate(&self, certificate: &Certificate) -> Attestation {
        match self.resolvers.first() {
            Some(resolver) => resolver.untrusted_from_certificate(certificate),
            None => Attestation::untrusted(Transport::from_bits(extract_transports(certificate))),
        }
    }
}

impl fmt::Debug for CompositeAttestationResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeAttestationResolver")
            .field("resolvers", &self.resolvers.len())
            .finish()
    }
}
