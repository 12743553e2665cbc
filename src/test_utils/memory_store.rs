/*
In-Memory Document Store

Test double implementing the document-store ports over plain vectors. Covers
the slice of filter/update semantics the repositories rely on: dotted-path
equality, `$in` (null matches an absent field), `$and`, `$set`,
`$setOnInsert`, `$addToSet` (with `$each`), identity generation, and
single-key sorting. Not a storage engine; durability and indexing stay out of
scope.
*/
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use tokio::sync::RwLock;

use crate::application::storage::codec::CodecRegistry;
use crate::application::storage::document_store::{DocumentCollection, DocumentStore};
use crate::error::RepositoryError;

pub struct MemoryDocumentStore {
    codecs: Arc<CodecRegistry>,
    collections: Mutex<HashMap<String, Arc<MemoryCollection>>>,
}

impl MemoryDocumentStore {
    pub fn new(codecs: CodecRegistry) -> Arc<Self> {
        Arc::new(Self {
            codecs: Arc::new(codecs),
            collections: Mutex::new(HashMap::new()),
        })
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn collection(&self, name: &str) -> Arc<dyn DocumentCollection> {
        let mut collections = self
            .collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let collection: Arc<MemoryCollection> = Arc::clone(
            collections
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(MemoryCollection::default())),
        );
        collection
    }

    fn codecs(&self) -> Arc<CodecRegistry> {
        Arc::clone(&self.codecs)
    }
}

#[derive(Default)]
pub struct MemoryCollection {
    docs: RwLock<Vec<Document>>,
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    async fn find(
        &self,
        filter: Document,
        sort: Option<Document>,
    ) -> Result<Vec<Document>, RepositoryError> {
        let docs = self.docs.read().await;
        let mut matched: Vec<Document> = docs
            .iter()
            .filter(|doc| matches(doc, &filter))
            .cloned()
            .collect();
        if let Some(sort) = sort {
            if let Some((key, direction)) = sort.iter().next() {
                let descending = matches!(direction, Bson::Int32(d) if *d < 0)
                    || matches!(direction, Bson::Int64(d) if *d < 0);
                matched.sort_by(|a, b| {
                    let ordering = cmp_values(lookup_path(a, key), lookup_path(b, key));
                    if descending {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                });
            }
        }
        Ok(matched)
    }

    async fn find_one(&self, filter: Document) -> Result<Option<Document>, RepositoryError> {
        let docs = self.docs.read().await;
        Ok(docs.iter().find(|doc| matches(doc, &filter)).cloned())
    }

    async fn insert_one(&self, mut document: Document) -> Result<Option<String>, RepositoryError> {
        let id = match document.get_object_id("_id") {
            Ok(oid) => oid,
            Err(_) => {
                let oid = ObjectId::new();
                document.insert("_id", oid);
                oid
            }
        };
        self.docs.write().await.push(document);
        Ok(Some(id.to_hex()))
    }

    async fn update_one(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<u64, RepositoryError> {
        let mut docs = self.docs.write().await;
        for doc in docs.iter_mut() {
            if matches(doc, &filter) {
                return Ok(u64::from(apply_update(doc, &update)));
            }
        }
        Ok(0)
    }

    async fn update_many(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<u64, RepositoryError> {
        let mut docs = self.docs.write().await;
        let mut modified = 0;
        for doc in docs.iter_mut() {
            if matches(doc, &filter) && apply_update(doc, &update) {
                modified += 1;
            }
        }
        Ok(modified)
    }

    async fn find_one_and_upsert(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<Option<Document>, RepositoryError> {
        let mut docs = self.docs.write().await;
        for doc in docs.iter_mut() {
            if matches(doc, &filter) {
                apply_update(doc, &update);
                return Ok(Some(doc.clone()));
            }
        }

        // Upsert insert: the filter's equality fields are implicitly present.
        let mut inserted = Document::new();
        for (key, value) in &filter {
            if !key.starts_with('$') && !matches!(value, Bson::Document(_)) {
                inserted.insert(key, value.clone());
            }
        }
        apply_update(&mut inserted, &update);
        if let Some(Bson::Document(on_insert)) = update.get("$setOnInsert") {
            for (path, value) in on_insert {
                set_path(&mut inserted, path, value.clone());
            }
        }
        inserted.insert("_id", ObjectId::new());
        docs.push(inserted.clone());
        Ok(Some(inserted))
    }

    async fn delete_many(&self, filter: Document) -> Result<u64, RepositoryError> {
        let mut docs = self.docs.write().await;
        let before = docs.len();
        docs.retain(|doc| !matches(doc, &filter));
        Ok((before - docs.len()) as u64)
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

fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, expected)| {
        if key == "$and" {
            if let Bson::Array(clauses) = expected {
                return clauses.iter().all(|clause| match clause {
                    Bson::Document(clause) => matches(doc, clause),
                    _ => false,
                });
            }
            return false;
        }
        value_matches(lookup_path(doc, key), expected)
    })
}

fn value_matches(actual: Option<&Bson>, expected: &Bson) -> bool {
    if let Bson::Document(spec) = expected {
        if let Some(Bson::Array(options)) = spec.get("$in") {
            return options.iter().any(|option| match option {
                // null matches an absent field, per store semantics
                Bson::Null => actual.is_none() || actual == Some(&Bson::Null),
                other => actual == Some(other),
            });
        }
    }
    match expected {
        Bson::Null => actual.is_none() || actual == Some(&Bson::Null),
        other => actual == Some(other),
    }
}

fn lookup_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut current = doc;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let value = current.get(segment)?;
        if segments.peek().is_none() {
            return Some(value);
        }
        match value {
            Bson::Document(nested) => current = nested,
            _ => return None,
        }
    }
    None
}

fn set_path(doc: &mut Document, path: &str, value: Bson) {
    let mut current = doc;
    let segments: Vec<&str> = path.split('.').collect();
    for (index, segment) in segments.iter().enumerate() {
        if index == segments.len() - 1 {
            current.insert(*segment, value);
            return;
        }
        if !matches!(current.get(*segment), Some(Bson::Document(_))) {
            current.insert(*segment, Document::new());
        }
        match current.get_mut(*segment) {
            Some(Bson::Document(nested)) => current = nested,
            _ => return,
        }
    }
}

/// Applies `$set` and `$addToSet` clauses; returns whether the document
/// changed ($setOnInsert only applies on upsert inserts).
fn apply_update(doc: &mut Document, update: &Document) -> bool {
    let before = doc.clone();

    if let Some(Bson::Document(set)) = update.get("$set") {
        for (path, value) in set {
            set_path(doc, path, value.clone());
        }
    }

    if let Some(Bson::Document(add_to_set)) = update.get("$addToSet") {
        for (path, spec) in add_to_set {
            let values: Vec<Bson> = match spec {
                Bson::Document(each) => match each.get("$each") {
                    Some(Bson::Array(values)) => values.clone(),
                    _ => vec![spec.clone()],
                },
                other => vec![other.clone()],
            };

            let mut current: Vec<Bson> = match lookup_path(doc, path) {
                Some(Bson::Array(existing)) => existing.clone(),
                _ => Vec::new(),
            };
            for value in values {
                if !current.contains(&value) {
                    current.push(value);
                }
            }
            set_path(doc, path, Bson::Array(current));
        }
    }

    *doc != before
}

fn cmp_values(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp_bson(a, b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn cmp_bson(a: &Bson, b: &Bson) -> Ordering {
    match (a, b) {
        (Bson::ObjectId(a), Bson::ObjectId(b)) => a.bytes().cmp(&b.bytes()),
        (Bson::String(a), Bson::String(b)) => a.cmp(b),
        (Bson::Int32(a), Bson::Int32(b)) => a.cmp(b),
        (Bson::Int64(a), Bson::Int64(b)) => a.cmp(b),
        (Bson::DateTime(a), Bson::DateTime(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}
