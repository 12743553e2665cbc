use bson::Bson;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EntityField;

/// A network/service operation exposed by a registered application.
///
/// Natural key: (service_id, operation_name, app_id). Operations are created
/// through upserts keyed on it and are only removed by direct id deletion or
/// by the cascade of their owning application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Operation {
    #[serde(
        rename = "_id",
        with = "super::object_id_hex",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub create_time: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modify_time: DateTime<Utc>,

    pub app_id: String,
    pub service_id: String,
    pub operation_name: String,
    /// Current classification.
    pub operation_type: String,
    /// Accumulating set of every classification ever observed.
    pub operation_types: Vec<String>,
    pub status: i32,
}

impl Operation {
    pub const COLLECTION: &'static str = "ServiceOperation";
}

impl Default for Operation {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: None,
            create_time: now,
            modify_time: now,
            app_id: String::new(),
            service_id: String::new(),
            operation_name: String::new(),
            operation_type: String::new(),
            operation_types: Vec::new(),
            status: 0,
        }
    }
}

/// Projected view returned by base-info queries; carries fewer fields than
/// the full record.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OperationBaseInfo {
    #[serde(
        rename = "_id",
        with = "super::object_id_hex",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub app_id: String,
    pub service_id: String,
    pub operation_name: String,
    pub operation_type: String,
    pub operation_types: Vec<String>,
    pub status: i32,
}

/// Mutable fields of an [`Operation`] addressable by partial updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationField {
    OperationType,
    Status,
}

impl EntityField<Operation> for OperationField {
    fn path(&self) -> &'static str {
        match self {
            OperationField::OperationType => "operationType",
            OperationField::Status => "status",
        }
    }

    fn read(&self, operation: &Operation) -> Bson {
        match self {
            OperationField::OperationType => Bson::String(operation.operation_type.clone()),
            OperationField::Status => Bson::Int32(operation.status),
        }
    }
}
