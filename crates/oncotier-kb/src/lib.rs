//! oncotier-kb: Knowledge Base Lookup for the tiering engine.
//!
//! Curated records are served through [`KnowledgeSourceProvider`]s grouped
//! into an immutable, versioned [`KnowledgeBase`]:
//!
//! | Provider | Backing data |
//! |----------|--------------|
//! | [`SnapshotProvider`] | In-memory table from a JSON snapshot export |
//! | [`OncoKbApiClient`] | Live OncoKB annotation API (bounded timeout) |
//! | [`MockProvider`] | Hardcoded records for tests |
//!
//! [`KbRegistry`] holds the current knowledge base for long-running
//! processes and swaps it atomically on reload.

pub mod error;
pub mod mock;
pub mod provider;
pub mod record;
pub mod registry;
pub mod remote;
pub mod snapshot;

pub use error::{KbError, Result};
pub use mock::MockProvider;
pub use provider::{KnowledgeBase, KnowledgeSourceProvider};
pub use record::{Alteration, KbEntry, KbHit, KbQuery, KbRecord};
pub use registry::KbRegistry;
pub use remote::OncoKbApiClient;
pub use snapshot::{cancer_type_matches, KbSnapshot, SnapshotFile, SnapshotProvider, SourceTable};
