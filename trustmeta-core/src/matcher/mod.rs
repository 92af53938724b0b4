//! Device selectors.
//!
//! Metadata documents recognise device models through selectors, each naming a
//! matcher by type and carrying matcher-specific parameters. Matchers are
//! looked up by that type name in a [`MatcherRegistry`]:
//!
//! - `x509Extension` (alias `extension`): [`ExtensionMatcher`]
//! - `fingerprint`: [`FingerprintMatcher`]
//!
//! Further matchers can be registered at construction time; any type without a
//! registered matcher simply never matches.
//!
//! ```
//! use trustmeta_core::matcher::MatcherRegistry;
//!
//! let registry = MatcherRegistry::default()
//!     .with_matcher("never", |_: &trustmeta_core::Certificate, _: &serde_json::Value| false);
//! assert!(registry.get("never").is_some());
//! assert!(registry.get("x509Extension").is_some());
//! ```

mod extension;
mod fingerprint;

pub use extension::ExtensionMatcher;
pub use fingerprint::FingerprintMatcher;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::certificate::Certificate;
use crate::metadata::Selector;

/// Decides whether a selector applies to an attestation certificate.
///
/// Implementations must be pure: the same certificate and parameters always
/// give the same answer. Malformed parameters are a non-match, not an error.
pub trait DeviceMatcher: Send + Sync {
    fn matches(&self, certificate: &Certificate, parameters: &Value) -> bool;
}

impl<F> DeviceMatcher for F
where
    F: Fn(&Certificate, &Value) -> bool + Send + Sync,
{
    fn matches(&self, certificate: &Certificate, parameters: &Value) -> bool {
        self(certificate, parameters)
    }
}

/// Selector type name to matcher mapping.
#[derive(Clone)]
pub struct MatcherRegistry {
    matchers: HashMap<String, Arc<dyn DeviceMatcher>>,
}

impl MatcherRegistry {
    /// A registry without any matchers.
    pub fn empty() -> Self {
        Self {
            matchers: HashMap::new(),
        }
    }

    /// Register `matcher` under `selector_type`, replacing any previous one.
    pub fn with_matcher<M>(mut self, selector_type: impl Into<String>, matcher: M) -> Self
    where
        M: DeviceMatcher + 'static,
    {
        self.insert(selector_type, Arc::new(matcher));
        self
    }

    pub fn insert(&mut self, selector_type: impl Into<String>, matcher: Arc<dyn DeviceMatcher>) {
        self.matchers.insert(selector_type.into(), matcher);
    }

    pub fn get(&self, selector_type: &str) -> Option<&dyn DeviceMatcher> {
        self.matchers.get(selector_type).map(|m| m.as_ref())
    }

    /// Whether `selector` applies to `certificate`. Unknown types never match.
    pub fn matches(&self, certificate: &Certificate, selector: &Selector) -> bool {
        self.get(&selector.selector_type)
            .is_some_and(|matcher| matcher.matches(certificate, &selector.parameters))
    }

    /// Registered selector types, sorted.
    pub fn selector_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.matchers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for MatcherRegistry {
    fn default() -> Self {
        let extension = Arc::new(ExtensionMatcher);
        let mut registry = Self::empty();
        registry.insert(ExtensionMatcher::SELECTOR_TYPE, extension.clone());
        registry.insert(ExtensionMatcher::SELECTOR_TYPE_ALIAS, extension);
        registry.insert(FingerprintMatcher::SELECTOR_TYPE, Arc::new(FingerprintMatcher));
        registry
    }
}

impl fmt::Debug for MatcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatcherRegistry")
            .field("selector_types", &self.selector_types())
            .finish()
    }
}
