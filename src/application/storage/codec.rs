/*
Codec Registry

Encode/decode rules between domain entities and stored documents. Purpose-
built codecs registered by the caller take precedence, tried in registration
order with first match winning; a generic structural codec derived from the
entity's serde schema is the catch-all fallback. The built registry is
immutable and is constructed once per store connection.
*/
use std::any::{Any, TypeId};
use std::sync::Arc;

use bson::{Bson, Document};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::entities::Application;
use crate::error::RepositoryError;

/// A paired encode/decode rule for one entity type.
pub trait EntityCodec<T>: Send + Sync {
    fn encode(&self, entity: &T) -> Result<Document, RepositoryError>;

    fn decode(&self, document: Document) -> Result<T, RepositoryError>;
}

/// Assembles the registry: custom codecs first, structural fallback last.
#[derive(Default)]
pub struct CodecRegistryBuilder {
    custom: Vec<(TypeId, Box<dyn Any + Send + Sync>)>,
}

impl CodecRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a purpose-built codec. Registration order is precedence
    /// order; the first codec matching the target type wins.
    pub fn register<T: 'static>(mut self, codec: Arc<dyn EntityCodec<T>>) -> Self {
        self.custom.push((TypeId::of::<T>(), Box::new(codec)));
        self
    }

    pub fn build(self) -> CodecRegistry {
        CodecRegistry {
            custom: self.custom,
        }
    }
}

/// Immutable set of encode/decode rules shared for the lifetime of one
/// store connection.
pub struct CodecRegistry {
    custom: Vec<(TypeId, Box<dyn Any + Send + Sync>)>,
}

impl CodecRegistry {
    fn lookup<T: 'static>(&self) -> Option<&Arc<dyn EntityCodec<T>>> {
        self.custom
            .iter()
            .filter(|(type_id, _)| *type_id == TypeId::of::<T>())
            .find_map(|(_, codec)| codec.downcast_ref::<Arc<dyn EntityCodec<T>>>())
    }

    pub fn encode<T>(&self, entity: &T) -> Result<Document, RepositoryError>
    where
        T: Serialize + 'static,
    {
        if let Some(codec) = self.lookup::<T>() {
            return codec.encode(entity);
        }
        bson::to_document(entity).map_err(|e| RepositoryError::SerializationError(e.to_string()))
    }

    pub fn decode<T>(&self, document: Document) -> Result<T, RepositoryError>
    where
        T: DeserializeOwned + 'static,
    {
        if let Some(codec) = self.lookup::<T>() {
            return codec.decode(document);
        }
        structural_decode(document)
    }
}

fn structural_decode<T: DeserializeOwned>(document: Document) -> Result<T, RepositoryError> {
    bson::from_document(document).map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

/// Purpose-built codec for [`Application`]: legacy rows persisted single
/// tag values as plain strings; decoding normalizes every `tags.<key>` to an
/// array before the structural mapping runs. Encoding is structural.
pub struct AppTagsCodec;

impl EntityCodec<Application> for AppTagsCodec {
    fn encode(&self, app: &Application) -> Result<Document, RepositoryError> {
        bson::to_document(app).map_err(|e| RepositoryError::SerializationError(e.to_string()))
    }

    fn decode(&self, mut document: Document) -> Result<Application, RepositoryError> {
        if let Some(Bson::Document(tags)) = document.get_mut("tags") {
            let keys: Vec<String> = tags.keys().cloned().collect();
            for key in keys {
                if let Some(Bson::String(value)) = tags.get(&key) {
                    let single = value.clone();
                    tags.insert(key, Bson::Array(vec![Bson::String(single)]));
                }
            }
        }
        structural_decode(document)
    }
}

/// Registry used by the configuration service deployment.
pub fn default_registry() -> CodecRegistry {
    CodecRegistryBuilder::new()
        .register::<Application>(Arc::new(AppTagsCodec))
        .build()
}
