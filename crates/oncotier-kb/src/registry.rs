//! Process-wide handle on the current knowledge base.
//!
//! Readers clone the `Arc` and keep using their copy for the whole call;
//! a reload swaps the pointer and never mutates a loaded knowledge base.

use std::sync::{Arc, RwLock};

use tracing::info;

use crate::provider::KnowledgeBase;

#[derive(Debug)]
pub struct KbRegistry {
    current: RwLock<Arc<KnowledgeBase>>,
}

impl KbRegistry {
    pub fn new(kb: KnowledgeBase) -> Self {
        Self { current: RwLock::new(Arc::new(kb)) }
    }

    /// The knowledge base in effect right now.
    pub fn current(&self) -> Arc<KnowledgeBase> {
        let guard = self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&*guard)
    }

    pub fn version(&self) -> String {
        self.current().version().to_string()
    }

    /// Replace the knowledge base, returning the previous one.
    pub fn reload(&self, kb: KnowledgeBase) -> Arc<KnowledgeBase> {
        let next = Arc::new(kb);
        let mut guard = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let previous = std::mem::replace(&mut *guard, next);
        info!(
            previous_version = %previous.version(),
            version = %guard.version(),
            "Knowledge base reloaded"
        );
        previous
    }
}
