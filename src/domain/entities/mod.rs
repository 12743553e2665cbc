pub mod application;
pub mod dynamic_class;
pub mod operation;

pub use application::{AppField, Application};
pub use dynamic_class::{DynamicClassField, DynamicClassRule};
pub use operation::{Operation, OperationBaseInfo, OperationField};

use bson::Bson;

/// Field name of the store-assigned identity on every collection.
pub const ID_FIELD: &str = "_id";
/// Audit timestamp fields carried by every record.
pub const CREATE_TIME_FIELD: &str = "createTime";
pub const MODIFY_TIME_FIELD: &str = "modifyTime";

/// A typed field identifier on an entity: the stored field path plus an
/// accessor reading the current value off the entity. Update expressions are
/// built from these tables instead of runtime reflection, so a partial update
/// can only ever touch fields an entity explicitly declares.
pub trait EntityField<T>: Copy {
    /// Dot-separated field path as stored in the document.
    fn path(&self) -> &'static str;

    /// Current value of this field on the entity.
    fn read(&self, entity: &T) -> Bson;
}

/// Serde adapter between the opaque `Option<String>` identity handle on
/// entities and the ObjectId stored under `_id`.
pub(crate) mod object_id_hex {
    use bson::oid::ObjectId;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(id: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        match id {
            Some(hex) => ObjectId::parse_str(hex)
                .map_err(serde::ser::Error::custom)?
                .serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        let id = Option::<ObjectId>::deserialize(deserializer)?;
        Ok(id.map(|oid| oid.to_hex()))
    }
}
