/*
Operation Repository

Owns ServiceOperation records. Creation goes through an atomic upsert on the
natural key (service_id, operation_name, app_id), merging the incoming
classification into the accumulated type set, so two concurrent reporters of
the same operation converge on a single record.
*/
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use chrono::Utc;
use tracing::debug;

use crate::application::storage::codec::CodecRegistry;
use crate::application::storage::document_store::{DocumentCollection, DocumentStore};
use crate::application::storage::repository::{CascadeDelete, RepositoryProvider};
use crate::application::storage::update::UpdateBuilder;
use crate::domain::entities::{Operation, OperationBaseInfo, OperationField, ID_FIELD};
use crate::error::RepositoryError;

const APP_ID_FIELD: &str = "appId";
const SERVICE_ID_FIELD: &str = "serviceId";
const OPERATION_NAME_FIELD: &str = "operationName";
const OPERATION_TYPES_FIELD: &str = "operationTypes";

pub struct OperationRepository {
    collection: Arc<dyn DocumentCollection>,
    codecs: Arc<CodecRegistry>,
}

impl OperationRepository {
    pub fn new(store: &dyn DocumentStore) -> Self {
        Self {
            collection: store.collection(Operation::COLLECTION),
            codecs: store.codecs(),
        }
    }

    /// Upsert by natural key: matches (service_id, operation_name, app_id),
    /// sets the current classification and status, and adds the incoming
    /// classifications to the accumulated set without duplicates. Absent a
    /// match, the store inserts a record carrying the key fields atomically;
    /// callers never need a separate existence check.
    pub async fn find_and_update(&self, operation: &Operation) -> Result<bool, RepositoryError> {
        if operation.app_id.trim().is_empty() {
            return Ok(false);
        }

        let filter = doc! {
            SERVICE_ID_FIELD: &operation.service_id,
            OPERATION_NAME_FIELD: &operation.operation_name,
            APP_ID_FIELD: &operation.app_id,
        };

        let now = Utc::now();
        let incoming: Vec<Bson> = operation
            .operation_types
            .iter()
            .map(|t| Bson::String(t.clone()))
            .collect();
        let update = UpdateBuilder::new()
            .stamp(now)
            .set_fields(
                operation,
                &[OperationField::OperationType, OperationField::Status],
            )
            .add_each_to_set(OPERATION_TYPES_FIELD, incoming)
            .create_time_on_insert(now)
            .build();

        self.collection.find_one_and_upsert(filter, update).await?;
        Ok(true)
    }

    /// Single record by its store identity.
    pub async fn list_by_operation_id(
        &self,
        operation_id: &str,
    ) -> Result<Option<Operation>, RepositoryError> {
        let Ok(oid) = ObjectId::parse_str(operation_id) else {
            return Ok(None);
        };
        let row = self.collection.find_one(doc! { ID_FIELD: oid }).await?;
        row.map(|row| self.codecs.decode(row)).transpose()
    }

    /// Base-info projection of every operation under one service.
    pub async fn operation_base_info_list(
        &self,
        service_id: &str,
    ) -> Result<Vec<OperationBaseInfo>, RepositoryError> {
        if service_id.trim().is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .collection
            .find(doc! { SERVICE_ID_FIELD: service_id }, None)
            .await?;
        self.decode_base_infos(rows)
    }

    /// Logical AND of one equality filter per condition, skipping empty
    /// keys. An empty or fully-skipped condition set yields an empty result
    /// without contacting the store.
    pub async fn query_by_multi_condition(
        &self,
        conditions: &HashMap<String, Bson>,
    ) -> Result<Vec<OperationBaseInfo>, RepositoryError> {
        if conditions.is_empty() {
            return Ok(Vec::new());
        }

        let filters: Vec<Document> = conditions
            .iter()
            .filter(|(key, _)| !key.trim().is_empty())
            .map(|(key, value)| doc! { key: value.clone() })
            .collect();
        if filters.is_empty() {
            debug!("multi-condition query skipped: no effective filters");
            return Ok(Vec::new());
        }

        let rows = self
            .collection
            .find(doc! { "$and": filters }, None)
            .await?;
        self.decode_base_infos(rows)
    }

    fn decode_all(&self, rows: Vec<Document>) -> Result<Vec<Operation>, RepositoryError> {
        rows.into_iter().map(|row| self.codecs.decode(row)).collect()
    }

    fn decode_base_infos(
        &self,
        rows: Vec<Document>,
    ) -> Result<Vec<OperationBaseInfo>, RepositoryError> {
        rows.into_iter().map(|row| self.codecs.decode(row)).collect()
    }
}

#[async_trait]
impl CascadeDelete for OperationRepository {
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
impl RepositoryProvider<Operation> for OperationRepository {
    async fn list(&self) -> Result<Vec<Operation>, RepositoryError> {
        let rows = self
            .collection
            .find(doc! {}, Some(doc! { ID_FIELD: -1 }))
            .await?;
        self.decode_all(rows)
    }

    async fn list_by(&self, app_id: &str) -> Result<Vec<Operation>, RepositoryError> {
        if app_id.trim().is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .collection
            .find(doc! { APP_ID_FIELD: app_id }, None)
            .await?;
        self.decode_all(rows)
    }

    async fn insert(&self, operation: &mut Operation) -> Result<bool, RepositoryError> {
        let now = Utc::now();
        operation.create_time = now;
        operation.modify_time = now;

        let document = self.codecs.encode(operation)?;
        match self.collection.insert_one(document).await? {
            Some(id) => {
                operation.id = Some(id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update(&self, operation: &Operation) -> Result<bool, RepositoryError> {
        let Some(oid) = parse_id(operation.id.as_deref()) else {
            return Ok(false);
        };
        let update = UpdateBuilder::new()
            .stamp(Utc::now())
            .set_fields(operation, &[OperationField::Status])
            .build();
        let modified = self
            .collection
            .update_many(doc! { ID_FIELD: oid }, update)
            .await?;
        Ok(modified > 0)
    }

    async fn remove(&self, operation: &Operation) -> Result<bool, RepositoryError> {
        let Some(oid) = parse_id(operation.id.as_deref()) else {
            return Ok(false);
        };
        let deleted = self.collection.delete_many(doc! { ID_FIELD: oid }).await?;
        Ok(deleted > 0)
    }
}

fn parse_id(id: Option<&str>) -> Option<ObjectId> {
    ObjectId::parse_str(id?).ok()
}
