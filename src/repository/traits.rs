//! Repository Layer - Core Traits
//!
//! Defines the abstract interfaces for data access.
//! Each entity type is an independent key-value mapping from id to record;
//! there is no cross-key atomicity.

use async_trait::async_trait;
use crate::domain::{Entity, DomainError, DomainResult};

/// Core repository trait for CRUD operations
///
/// Generic over any Entity type.
/// All operations are async to support various backends.
#[async_trait]
pub trait Repository<T: Entity + 'static>: Send + Sync {
    /// Create a new entity; the returned copy carries the assigned id
    async fn create(&self, entity: &T) -> DomainResult<T>;

    /// Find entity by ID
    async fn find_by_id(&self, id: T::Id) -> DomainResult<Option<T>>;

    /// List all entities
    async fn list(&self) -> DomainResult<Vec<T>>;

    /// Overwrite an existing entity; NotFound if the id is absent
    async fn update(&self, entity: &T) -> DomainResult<T>;

    /// Delete entity by ID (no-op when absent)
    async fn delete(&self, id: T::Id) -> DomainResult<()>;

    /// Find entity by ID or fail with NotFound
    async fn get(&self, id: T::Id) -> DomainResult<T> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found::<T>(id))
    }

    /// Fetch every id that exists, in the order requested; missing ids are skipped
    async fn find_by_ids(&self, ids: &[T::Id]) -> DomainResult<Vec<T>> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entity) = self.find_by_id(*id).await? {
                found.push(entity);
            }
        }
        Ok(found)
    }
}
