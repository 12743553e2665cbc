/*
Partial-Update Builder

Builds update expressions that set exactly the named fields plus the standard
modify-time stamp. The whole object is never serialized into an update, so
concurrent partial updates on disjoint fields of one record cannot clobber
each other. Multiple clauses combine into one document applied atomically by
the store.
*/
use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};

use crate::domain::entities::{EntityField, CREATE_TIME_FIELD, MODIFY_TIME_FIELD};

#[derive(Debug, Default, Clone)]
pub struct UpdateBuilder {
    set: Document,
    add_to_set: Document,
    set_on_insert: Document,
}

impl UpdateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard stamp carried by every update.
    pub fn stamp(self, now: DateTime<Utc>) -> Self {
        self.set_field(MODIFY_TIME_FIELD, Bson::DateTime(now.into()))
    }

    pub fn set_field(mut self, path: &str, value: Bson) -> Self {
        self.set.insert(path, value);
        self
    }

    /// Sets exactly the fields named in `fields` to the entity's current
    /// values, via the entity's declared field table.
    pub fn set_fields<T, F: EntityField<T>>(mut self, entity: &T, fields: &[F]) -> Self {
        for field in fields {
            self.set.insert(field.path(), field.read(entity));
        }
        self
    }

    /// Adds one value to a set-valued field without duplicating it.
    pub fn add_to_set(mut self, path: &str, value: Bson) -> Self {
        self.add_to_set.insert(path, value);
        self
    }

    /// Adds each value to a set-valued field without duplicating any.
    pub fn add_each_to_set(mut self, path: &str, values: Vec<Bson>) -> Self {
        self.add_to_set.insert(path, doc! { "$each": values });
        self
    }

    /// Value applied only when an upsert inserts a new record.
    pub fn set_on_insert(mut self, path: &str, value: Bson) -> Self {
        self.set_on_insert.insert(path, value);
        self
    }

    /// Stamps `create_time` on upsert-inserted records so the audit
    /// invariant holds for documents born through an upsert.
    pub fn create_time_on_insert(self, now: DateTime<Utc>) -> Self {
        self.set_on_insert(CREATE_TIME_FIELD, Bson::DateTime(now.into()))
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.add_to_set.is_empty() && self.set_on_insert.is_empty()
    }

    /// One combined update document; same-operator clauses are merged.
    pub fn build(self) -> Document {
        let mut update = Document::new();
        if !self.set.is_empty() {
            update.insert("$set", self.set);
        }
        if !self.add_to_set.is_empty() {
            update.insert("$addToSet", self.add_to_set);
        }
        if !self.set_on_insert.is_empty() {
            update.insert("$setOnInsert", self.set_on_insert);
        }
        update
    }
}
