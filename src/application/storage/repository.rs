/*
Configuration Repository Ports

The uniform CRUD surface implemented once per entity type. Operations return
booleans/collections for "nothing matched" and reserve errors for store or
mapping faults. A blank required key short-circuits locally without
contacting the store.
*/
use async_trait::async_trait;

use crate::error::RepositoryError;

/// The slice of the provider contract consumed by the application
/// repository's cascading delete. Every concrete provider owning records
/// keyed by `app_id` implements it and must be handed to
/// `ApplicationRepository::new` as a cascade target; a provider left out of
/// that list silently leaks orphaned records on application deletion.
#[async_trait]
pub trait CascadeDelete: Send + Sync {
    /// Bulk-deletes every record in this collection owned by `app_id`.
    /// Returns `true` only if at least one record was deleted.
    async fn remove_by_app_id(&self, app_id: &str) -> Result<bool, RepositoryError>;
}

/// Uniform data-access contract over an entity-specific domain type.
#[async_trait]
pub trait RepositoryProvider<T>: CascadeDelete {
    /// All records, most-recently-created first.
    async fn list(&self) -> Result<Vec<T>, RepositoryError>;

    /// Records owned by `app_id`; empty when none match.
    async fn list_by(&self, app_id: &str) -> Result<Vec<T>, RepositoryError>;

    /// Inserts the record, assigning the store identity on success. Returns
    /// `false` without raising when the write reports no inserted id.
    async fn insert(&self, entity: &mut T) -> Result<bool, RepositoryError>;

    /// Partial update scoped to the entity type's allow-listed mutable
    /// fields plus the modify-time stamp. Returns `true` only if at least
    /// one record was modified.
    async fn update(&self, entity: &T) -> Result<bool, RepositoryError>;

    /// Deletes by the type-specific filter (identity or owner id).
    async fn remove(&self, entity: &T) -> Result<bool, RepositoryError>;
}
