/*
Document Store Port

The repository providers are written against these traits rather than a
concrete driver. A store maps each entity type to one named collection;
filters and update expressions address fields by dot-separated paths so a
write touches exactly the named fields. Identity values are store-generated
and handed back to callers as opaque hex strings.
*/
use std::sync::Arc;

use async_trait::async_trait;
use bson::Document;

use crate::application::storage::codec::CodecRegistry;
use crate::error::RepositoryError;

/// One named collection of documents. Every method is a single round-trip to
/// the store; the update expression within one call is applied atomically.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// All documents matching `filter`, optionally sorted (single-key sort
    /// document, value 1/-1).
    async fn find(
        &self,
        filter: Document,
        sort: Option<Document>,
    ) -> Result<Vec<Document>, RepositoryError>;

    async fn find_one(&self, filter: Document) -> Result<Option<Document>, RepositoryError>;

    /// Inserts one document and returns the store-assigned id handle, or
    /// `None` if the write reported no inserted id.
    async fn insert_one(&self, document: Document) -> Result<Option<String>, RepositoryError>;

    /// Applies `update` to the first matching document; returns the modified
    /// count (0 or 1).
    async fn update_one(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<u64, RepositoryError>;

    /// Applies `update` to every matching document; returns the modified count.
    async fn update_many(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<u64, RepositoryError>;

    /// Atomic upsert: applies `update` to the matching document, inserting one
    /// carrying the filter's equality fields if none matches. Returns the
    /// post-update document.
    async fn find_one_and_upsert(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<Option<Document>, RepositoryError>;

    /// Deletes every matching document; returns the deleted count.
    async fn delete_many(&self, filter: Document) -> Result<u64, RepositoryError>;

    /// Applies a batch of (filter, update) pairs; returns the total modified
    /// count. Each pair is atomic on its own, the batch is not.
    async fn bulk_update(
        &self,
        updates: Vec<(Document, Document)>,
    ) -> Result<u64, RepositoryError>;
}

/// Handle to one database connection: collections plus the codec registry
/// built once for the connection's lifetime.
pub trait DocumentStore: Send + Sync {
    fn collection(&self, name: &str) -> Arc<dyn DocumentCollection>;

    fn codecs(&self) -> Arc<CodecRegistry>;
}
