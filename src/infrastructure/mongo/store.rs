/*
MongoDB Store Adapter

Implements the document-store ports with the MongoDB driver. Durability,
indexing and query execution are the server's job; this adapter only carries
filters and update expressions across the wire. The codec registry is built
once at connect time and shared for the connection's lifetime.
*/
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bson::Document;
use futures::TryStreamExt;
use mongodb::options::{ClientOptions, FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Client, Collection, Database};

use crate::application::storage::codec::CodecRegistry;
use crate::application::storage::document_store::{DocumentCollection, DocumentStore};
use crate::error::RepositoryError;

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub connection_string: String,
    pub database: String,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub connect_timeout_seconds: u64,
    pub server_selection_timeout_seconds: u64,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            connection_string: "mongodb://localhost:27017".to_string(),
            database: "recording_config".to_string(),
            max_pool_size: 16,
            min_pool_size: 1,
            connect_timeout_seconds: 10,
            server_selection_timeout_seconds: 30,
        }
    }
}

pub struct MongoStore {
    database: Database,
    codecs: Arc<CodecRegistry>,
}

impl MongoStore {
    /// Connects and binds the codec registry to this connection. One store is
    /// expected per connection string for the process lifetime.
    pub async fn connect(config: MongoConfig, codecs: CodecRegistry) -> Result<Self, RepositoryError> {
        let mut options = ClientOptions::parse(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::ConnectionError(e.to_string()))?;
        options.max_pool_size = Some(config.max_pool_size);
        options.min_pool_size = Some(config.min_pool_size);
        options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_seconds));
        options.server_selection_timeout =
            Some(Duration::from_secs(config.server_selection_timeout_seconds));

        let client = Client::with_options(options)
            .map_err(|e| RepositoryError::ConnectionError(e.to_string()))?;

        Ok(Self {
            database: client.database(&config.database),
            codecs: Arc::new(codecs),
        })
    }
}

impl DocumentStore for MongoStore {
    fn collection(&self, name: &str) -> Arc<dyn DocumentCollection> {
        Arc::new(MongoDocumentCollection {
            inner: self.database.collection::<Document>(name),
        })
    }

    fn codecs(&self) -> Arc<CodecRegistry> {
        Arc::clone(&self.codecs)
    }
}

struct MongoDocumentCollection {
    inner: Collection<Document>,
}

#[async_trait]
impl DocumentCollection for MongoDocumentCollection {
    async fn find(
        &self,
        filter: Document,
        sort: Option<Document>,
    ) -> Result<Vec<Document>, RepositoryError> {
        let options = FindOptions::builder().sort(sort).build();
        let cursor = self
            .inner
            .find(filter, options)
            .await
            .map_err(|e| RepositoryError::QueryError(e.to_string()))?;
        cursor
            .try_collect()
            .await
            .map_err(|e| RepositoryError::QueryError(e.to_string()))
    }

    async fn find_one(&self, filter: Document) -> Result<Option<Document>, RepositoryError> {
        self.inner
            .find_one(filter, None)
            .await
            .map_err(|e| RepositoryError::QueryError(e.to_string()))
    }

    async fn insert_one(&self, document: Document) -> Result<Option<String>, RepositoryError> {
        let result = self
            .inner
            .insert_one(document, None)
            .await
            .map_err(|e| RepositoryError::QueryError(e.to_string()))?;
        Ok(result.inserted_id.as_object_id().map(|oid| oid.to_hex()))
    }

    async fn update_one(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<u64, RepositoryError> {
        let result = self
            .inner
            .update_one(filter, update, None)
            .await
            .map_err(|e| RepositoryError::QueryError(e.to_string()))?;
        Ok(result.modified_count)
    }

    async fn update_many(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<u64, RepositoryError> {
        let result = self
            .inner
            .update_many(filter, update, None)
            .await
            .map_err(|e| RepositoryError::QueryError(e.to_string()))?;
        Ok(result.modified_count)
    }

    async fn find_one_and_upsert(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<Option<Document>, RepositoryError> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        self.inner
            .find_one_and_update(filter, update, options)
            .await
            .map_err(|e| RepositoryError::QueryError(e.to_string()))
    }

    async fn delete_many(&self, filter: Document) -> Result<u64, RepositoryError> {
        let result = self
            .inner
            .delete_many(filter, None)
            .await
            .map_err(|e| RepositoryError::QueryError(e.to_string()))?;
        Ok(result.deleted_count)
    }

    async fn bulk_update(
        &self,
        updates: Vec<(Document, Document)>,
    ) -> Result<u64, RepositoryError> {
        let mut modified = 0;
        for (filter, update) in updates {
            modified += self.update_many(filter, update).await?;
        }
        Ok(modified)
    }
}
