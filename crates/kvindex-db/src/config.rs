use std::sync::Arc;

use kvindex_engine::DocumentLoader;

/// Process-lifetime settings for a [`crate::Database`] (spec §5).
#[derive(Clone, Default)]
pub struct DatabaseConfig {
    /// Skip the store's durability sync on commit. Off by default; a
    /// process that can tolerate losing the last few commits on crash can
    /// turn this on for throughput.
    pub no_sync: bool,
    /// Remote document loader used by JSON-LD collections that need to
    /// dereference `@context` URLs. `None` collections fall back to a
    /// loader that refuses every fetch.
    pub document_loader: Option<Arc<dyn DocumentLoader>>,
}
