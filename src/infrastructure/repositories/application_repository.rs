/*
Application Repository

Owns App records. Removal fans out to every registered cascade target before
deleting the application's own rows, so a crash mid-cascade leaves the App
record as the durable source of truth a retried delete can resume from. A
one-time startup backfill repairs placeholder application names.
*/
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use chrono::Utc;
use tracing::{debug, info};

use crate::application::storage::codec::CodecRegistry;
use crate::application::storage::document_store::{DocumentCollection, DocumentStore};
use crate::application::storage::repository::{CascadeDelete, RepositoryProvider};
use crate::application::storage::update::UpdateBuilder;
use crate::domain::entities::{AppField, Application, ID_FIELD};
use crate::error::RepositoryError;

/// Placeholder written by agents that registered before resolving a name.
pub const UNKNOWN_APP_NAME: &str = "unknown app name";

const APP_ID_FIELD: &str = "appId";
const APP_NAME_FIELD: &str = "appName";
const TAGS_FIELD: &str = "tags";

pub struct ApplicationRepository {
    collection: Arc<dyn DocumentCollection>,
    codecs: Arc<CodecRegistry>,
    cascade_targets: Vec<Arc<dyn CascadeDelete>>,
    update_fields: Vec<AppField>,
}

impl ApplicationRepository {
    /// Builds the repository and runs the placeholder-name backfill before
    /// it serves traffic. `cascade_targets` is the explicit ordered list of
    /// providers whose records are deleted ahead of the App row on removal.
    pub async fn new(
        store: &dyn DocumentStore,
        cascade_targets: Vec<Arc<dyn CascadeDelete>>,
    ) -> Result<Self, RepositoryError> {
        let repository = Self {
            collection: store.collection(Application::COLLECTION),
            codecs: store.codecs(),
            cascade_targets,
            update_fields: AppField::DEFAULT_UPDATE_FIELDS.to_vec(),
        };

        // Repair legacy rows on startup
        repository.backfill_placeholder_names().await?;

        Ok(repository)
    }

    /// Overrides the per-deployment allow-list applied by `update`.
    pub fn with_update_fields(mut self, fields: Vec<AppField>) -> Self {
        self.update_fields = fields;
        self
    }

    /// One-time repair: rewrites `app_name := app_id` on every record whose
    /// name is the placeholder, empty, or absent, batched into one bulk
    /// write. Idempotent; repaired rows never match the scan filter again.
    /// Returns the number of repaired records.
    pub async fn backfill_placeholder_names(&self) -> Result<u64, RepositoryError> {
        let filter = doc! {
            APP_NAME_FIELD: { "$in": [UNKNOWN_APP_NAME, "", Bson::Null] }
        };
        let rows = self.collection.find(filter, None).await?;

        let mut updates = Vec::with_capacity(rows.len());
        for row in rows {
            let app: Application = self.codecs.decode(row)?;
            let Some(id) = app.id.as_deref() else {
                continue;
            };
            let oid = ObjectId::parse_str(id)
                .map_err(|e| RepositoryError::InvalidId(e.to_string()))?;
            let update = UpdateBuilder::new()
                .stamp(Utc::now())
                .set_field(APP_NAME_FIELD, Bson::String(app.app_id.clone()))
                .build();
            updates.push((doc! { ID_FIELD: oid }, update));
        }

        if updates.is_empty() {
            return Ok(0);
        }
        let repaired = self.collection.bulk_update(updates).await?;
        info!(repaired, "backfilled placeholder application names");
        Ok(repaired)
    }

    /// Appends tag values to an application, one `$addToSet` per key so
    /// existing values are never duplicated or overwritten. Blank values are
    /// skipped; returns `false` when nothing effective remains.
    pub async fn add_tags_to_app(
        &self,
        app_id: &str,
        tags: &HashMap<String, String>,
    ) -> Result<bool, RepositoryError> {
        if app_id.trim().is_empty() || tags.is_empty() {
            return Ok(false);
        }

        let mut builder = UpdateBuilder::new();
        for (key, value) in tags {
            if value.trim().is_empty() {
                continue;
            }
            builder = builder.add_to_set(
                &format!("{TAGS_FIELD}.{key}"),
                Bson::String(value.clone()),
            );
        }
        if builder.is_empty() {
            return Ok(false);
        }

        let modified = self
            .collection
            .update_one(doc! { APP_ID_FIELD: app_id }, builder.build())
            .await?;
        Ok(modified > 0)
    }

    fn decode_all(&self, rows: Vec<Document>) -> Result<Vec<Application>, RepositoryError> {
        rows.into_iter().map(|row| self.codecs.decode(row)).collect()
    }
}

#[async_trait]
impl CascadeDelete for ApplicationRepository {
    async fn remove_by_app_id(&self, app_id: &str) -> Result<bool, RepositoryError> {
        if app_id.trim().is_empty() {
            return Ok(false);
        }

        // Dependent collections first; the owning row goes last so a failed
        // cascade can be retried from the surviving App record.
        for target in &self.cascade_targets {
            target.remove_by_app_id(app_id).await?;
        }
        debug!(app_id, targets = self.cascade_targets.len(), "cascade fan-out complete");

        let deleted = self
            .collection
            .delete_many(doc! { APP_ID_FIELD: app_id })
            .await?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl RepositoryProvider<Application> for ApplicationRepository {
    async fn list(&self) -> Result<Vec<Application>, RepositoryError> {
        let rows = self
            .collection
            .find(doc! {}, Some(doc! { ID_FIELD: -1 }))
            .await?;
        self.decode_all(rows)
    }

    async fn list_by(&self, app_id: &str) -> Result<Vec<Application>, RepositoryError> {
        if app_id.trim().is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .collection
            .find(doc! { APP_ID_FIELD: app_id }, None)
            .await?;
        self.decode_all(rows)
    }

    async fn insert(&self, app: &mut Application) -> Result<bool, RepositoryError> {
        let now = Utc::now();
        app.create_time = now;
        app.modify_time = now;

        let document = self.codecs.encode(app)?;
        match self.collection.insert_one(document).await? {
            Some(id) => {
                app.id = Some(id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update(&self, app: &Application) -> Result<bool, RepositoryError> {
        if app.app_id.trim().is_empty() {
            return Ok(false);
        }

        let update = UpdateBuilder::new()
            .stamp(Utc::now())
            .set_fields(app, &self.update_fields)
            .build();
        let modified = self
            .collection
            .update_many(doc! { APP_ID_FIELD: &app.app_id }, update)
            .await?;
        Ok(modified > 0)
    }

    async fn remove(&self, app: &Application) -> Result<bool, RepositoryError> {
        if app.app_id.trim().is_empty() {
            return Ok(false);
        }
        self.remove_by_app_id(&app.app_id).await
    }
}
