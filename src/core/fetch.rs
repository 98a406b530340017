use crate::core::rate_limiter::RateLimiter;
use crate::domain::model::{ArtifactKind, Location, Table};
use crate::domain::ports::FetchAdapter;
use crate::utils::error::{Result, UpdateError};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Explicit kind -> adapter table. Kinds without an entry are skipped by the
/// dispatcher rather than treated as errors.
#[derive(Clone, Default)]
pub struct AdapterTable {
    adapters: BTreeMap<ArtifactKind, Arc<dyn FetchAdapter>>,
}

impl AdapterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: ArtifactKind, adapter: Arc<dyn FetchAdapter>) -> &mut Self {
        self.adapters.insert(kind, adapter);
        self
    }

    /// Registers one adapter for every known kind.
    pub fn register_all(&mut self, adapter: Arc<dyn FetchAdapter>) -> &mut Self {
        for kind in ArtifactKind::ALL {
            self.adapters.insert(kind, adapter.clone());
        }
        self
    }

    pub fn get(&self, kind: ArtifactKind) -> Option<&Arc<dyn FetchAdapter>> {
        self.adapters.get(&kind)
    }

    pub fn supports(&self, kind: ArtifactKind) -> bool {
        self.adapters.contains_key(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = ArtifactKind> + '_ {
        self.adapters.keys().copied()
    }
}

/// The single outbound fetch path: every call is admitted by the rate
/// limiter before reaching its adapter.
pub struct GatedFetcher {
    limiter: RateLimiter,
    adapters: AdapterTable,
}

impl GatedFetcher {
    pub fn new(limiter: RateLimiter, adapters: AdapterTable) -> Self {
        Self { limiter, adapters }
    }

    pub fn adapters(&self) -> &AdapterTable {
        &self.adapters
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub async fn fetch(&mut self, location: &Location, kind: ArtifactKind) -> Result<Table> {
        let adapter = self.adapters.get(kind).cloned().ok_or_else(|| {
            UpdateError::source_unavailable(kind.as_str(), "no adapter registered")
        })?;

        self.limiter.admit().await;
        tracing::debug!("Fetching {} for {}", kind, location);

        let table = adapter.fetch(location, kind).await?;
        if table.headers().is_none() {
            return Err(UpdateError::malformed_response(
                kind.as_str(),
                "response has no header row",
            ));
        }
        Ok(table)
    }
}
