//! Knowledge-source abstraction.
//!
//! The engine never talks to a concrete database. It receives a
//! [`KnowledgeBase`], a versioned set of providers, and queries each one
//! through [`KnowledgeSourceProvider`].

use std::fmt;
use std::sync::Arc;

use oncotier_common::KnowledgeSource;

use crate::error::Result;
use crate::record::{KbHit, KbQuery};

/// Trait for looking up curated records in one knowledge source.
///
/// Implementations can use:
/// - An in-memory snapshot table (local)
/// - The OncoKB web API (remote, bounded timeout)
/// - Mock data (testing)
pub trait KnowledgeSourceProvider: Send + Sync {
    fn source(&self) -> KnowledgeSource;

    /// Records matching the query. An empty vector means "no records";
    /// an error means the source could not answer.
    fn lookup(&self, query: &KbQuery) -> Result<Vec<KbHit>>;
}

/// Immutable, versioned set of providers shared by every classification call.
#[derive(Clone)]
pub struct KnowledgeBase {
    version: String,
    providers: Vec<Arc<dyn KnowledgeSourceProvider>>,
}

impl KnowledgeBase {
    pub fn new(version: impl Into<String>) -> Self {
        Self { version: version.into(), providers: Vec::new() }
    }

    /// Add a provider, replacing any existing provider for the same source.
    pub fn with_provider(mut self, provider: Arc<dyn KnowledgeSourceProvider>) -> Self {
        let source = provider.source();
        self.providers.retain(|p| p.source() != source);
        self.providers.push(provider);
        self.providers.sort_by_key(|p| p.source());
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Providers in stable source order.
    pub fn providers(&self) -> &[Arc<dyn KnowledgeSourceProvider>] {
        &self.providers
    }

    pub fn sources(&self) -> Vec<KnowledgeSource> {
        self.providers.iter().map(|p| p.source()).collect()
    }
}

impl fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("version", &self.version)
            .field("sources", &self.sources())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockProvider;

    #[test]
    fn test_with_provider_replaces_same_source() {
        let kb = KnowledgeBase::new("v1")
            .with_provider(Arc::new(MockProvider::new(KnowledgeSource::Gnomad)))
            .with_provider(Arc::new(MockProvider::new(KnowledgeSource::Civic)))
            .with_provider(Arc::new(MockProvider::failing(KnowledgeSource::Gnomad, "down")));
        assert_eq!(kb.sources(), vec![KnowledgeSource::Civic, KnowledgeSource::Gnomad]);
        assert_eq!(kb.version(), "v1");
    }
}
