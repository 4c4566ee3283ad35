use async_trait::async_trait;
use cartwatch_core::UtcDateTime;
use cartwatch_entities::interaction_events;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum EventStoreError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Queryable source of raw interaction records.
///
/// One fetch per analysis request: the full window's records come back in a
/// single response, there is no streaming or pagination contract.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// All records for `store_id` whose timestamp falls in `[start, end]`
    /// inclusive, ascending by timestamp.
    async fn fetch_events(
        &self,
        store_id: i32,
        start: UtcDateTime,
        end: UtcDateTime,
    ) -> Result<Vec<interaction_events::Model>, EventStoreError>;
}

/// sea-orm backed event store.
pub struct SqlEventStore {
    db: Arc<DatabaseConnection>,
}

impl SqlEventStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EventStore for SqlEventStore {
    async fn fetch_events(
        &self,
        store_id: i32,
        start: UtcDateTime,
        end: UtcDateTime,
    ) -> Result<Vec<interaction_events::Model>, EventStoreError> {
        let records = interaction_events::Entity::find()
            .filter(interaction_events::Column::StoreId.eq(store_id))
            .filter(interaction_events::Column::Timestamp.gte(start))
            .filter(interaction_events::Column::Timestamp.lte(end))
            .order_by_asc(interaction_events::Column::Timestamp)
            .all(self.db.as_ref())
            .await?;

        debug!(
            store_id,
            records = records.len(),
            "fetched interaction window"
        );

        Ok(records)
    }
}
