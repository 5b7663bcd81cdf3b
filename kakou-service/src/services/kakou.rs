//! Checkpoint and crossing-record queries, enriched for display.

use serde_json::Value;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::instrument;

use crate::models::{Checkpoint, CrossingView, IdRange};
use crate::services::enrichment::Enricher;
use crate::services::error::ServiceError;
use crate::services::store::KakouStore;
use crate::utils::pagination::optional_json_integer;
use crate::utils::{Page, PageRequest};

/// Decoded `q` parameter of the crossing listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossingQuery {
    pub range: IdRange,
    pub page: PageRequest,
}

impl CrossingQuery {
    /// Parse the JSON object carried in `q`. A missing, unparsable or non-object
    /// value is a client error, as is a window over `max_per_page`.
    pub fn parse(raw: Option<&str>, max_per_page: i64) -> Result<Self, AppError> {
        let raw = raw.ok_or_else(|| ServiceError::InvalidFilter("q is required".to_string()))?;

        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ServiceError::InvalidFilter(format!("q is not valid JSON: {}", e)))?;
        let Value::Object(filter) = value else {
            return Err(ServiceError::InvalidFilter("q must be a JSON object".to_string()).into());
        };

        Ok(Self {
            range: IdRange {
                start: optional_json_integer(&filter, "startid")?,
                end: optional_json_integer(&filter, "endid")?,
            },
            page: PageRequest::from_json(&filter)?.within(max_per_page)?,
        })
    }
}

#[derive(Clone)]
pub struct KakouService {
    store: Arc<dyn KakouStore>,
    enricher: Enricher,
}

impl KakouService {
    pub fn new(store: Arc<dyn KakouStore>, enricher: Enricher) -> Self {
        Self { store, enricher }
    }

    pub async fn checkpoints(&self) -> Result<Vec<Checkpoint>, AppError> {
        self.store.list_checkpoints().await
    }

    #[instrument(skip(self))]
    pub async fn crossing(&self, id: i64) -> Result<CrossingView, AppError> {
        let record = self
            .store
            .find_crossing(id)
            .await?
            .ok_or(ServiceError::CrossingNotFound)?;
        Ok(self.enricher.enrich(&record))
    }

    /// One page of enriched records; `total` counts the whole filtered range even
    /// when the page itself is empty.
    #[instrument(skip(self))]
    pub async fn crossings(&self, query: CrossingQuery) -> Result<Page<CrossingView>, AppError> {
        let page = self.store.list_crossings(query.range, query.page).await?;
        Ok(page.map(|record| self.enricher.enrich(&record)))
    }

    pub async fn max_id(&self) -> Result<Option<i64>, AppError> {
        self.store.max_crossing_id().await
    }
}
