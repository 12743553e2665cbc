/*
Dynamic-Class Repository

Owns DynamicClass rule records. Generic CRUD only; participates in the
application cascade like every other owned collection.
*/
use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Document};
use chrono::Utc;

use crate::application::storage::codec::CodecRegistry;
use crate::application::storage::document_store::{DocumentCollection, DocumentStore};
use crate::application::storage::repository::{CascadeDelete, RepositoryProvider};
use crate::application::storage::update::UpdateBuilder;
use crate::domain::entities::{DynamicClassField, DynamicClassRule, ID_FIELD};
use crate::error::RepositoryError;

const APP_ID_FIELD: &str = "appId";

pub struct DynamicClassRepository {
    collection: Arc<dyn DocumentCollection>,
    codecs: Arc<CodecRegistry>,
}

impl DynamicClassRepository {
    pub fn new(store: &dyn DocumentStore) -> Self {
        Self {
            collection: store.collection(DynamicClassRule::COLLECTION),
            codecs: store.codecs(),
        }
    }

    fn decode_all(&self, rows: Vec<Document>) -> Result<Vec<DynamicClassRule>, RepositoryError> {
        rows.into_iter().map(|row| self.codecs.decode(row)).collect()
    }
}

#[async_trait]
impl CascadeDelete for DynamicClassRepository {
    async fn remove_by_app_id(&self, app_id: &str) -> Result<bool, RepositoryError> {
        if app_id.trim().is_empty() {
            return Ok(false);
        }
        let deleted = self
            .collection
            .delete_many(doc! { APP_ID_FIELD: app_id })
            .await?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl RepositoryProvider<DynamicClassRule> for DynamicClassRepository {
    async fn list(&self) -> Result<Vec<DynamicClassRule>, RepositoryError> {
        let rows = self
            .collection
            .find(doc! {}, Some(doc! { ID_FIELD: -1 }))
            .await?;
        self.decode_all(rows)
    }

    async fn list_by(&self, app_id: &str) -> Result<Vec<DynamicClassRule>, RepositoryError> {
        if app_id.trim().is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .collection
            .find(doc! { APP_ID_FIELD: app_id }, None)
            .await?;
        self.decode_all(rows)
    }

    async fn insert(&self, rule: &mut DynamicClassRule) -> Result<bool, RepositoryError> {
        let now = Utc::now();
        rule.create_time = now;
        rule.modify_time = now;

        let document = self.codecs.encode(rule)?;
        match self.collection.insert_one(document).await? {
            Some(id) => {
                rule.id = Some(id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update(&self, rule: &DynamicClassRule) -> Result<bool, RepositoryError> {
        let Some(id) = rule.id.as_deref() else {
            return Ok(false);
        };
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(false);
        };

        let update = UpdateBuilder::new()
            .stamp(Utc::now())
            .set_fields(rule, DynamicClassField::UPDATE_FIELDS)
            .build();
        let modified = self
            .collection
            .update_many(doc! { ID_FIELD: oid }, update)
            .await?;
        Ok(modified > 0)
    }

    async fn remove(&self, rule: &DynamicClassRule) -> Result<bool, RepositoryError> {
        let Some(id) = rule.id.as_deref() else {
            return Ok(false);
        };
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(false);
        };
        let deleted = self.collection.delete_many(doc! { ID_FIELD: oid }).await?;
        Ok(deleted > 0)
    }
}
