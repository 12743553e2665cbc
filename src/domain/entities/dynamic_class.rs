use bson::Bson;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EntityField;

/// A dynamic-class instrumentation rule owned by one application: a
/// class/method/parameter-type signature with a key-derivation formula and a
/// rule-type discriminant. Plain CRUD, no special update semantics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DynamicClassRule {
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
    pub full_class_name: String,
    pub method_name: String,
    pub parameter_types: String,
    pub key_formula: String,
    pub config_type: i32,
}

impl DynamicClassRule {
    pub const COLLECTION: &'static str = "DynamicClass";
}

impl Default for DynamicClassRule {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: None,
            create_time: now,
            modify_time: now,
            app_id: String::new(),
            full_class_name: String::new(),
            method_name: String::new(),
            parameter_types: String::new(),
            key_formula: String::new(),
            config_type: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicClassField {
    FullClassName,
    MethodName,
    ParameterTypes,
    KeyFormula,
    ConfigType,
}

impl DynamicClassField {
    pub const UPDATE_FIELDS: &'static [DynamicClassField] = &[
        DynamicClassField::FullClassName,
        DynamicClassField::MethodName,
        DynamicClassField::ParameterTypes,
        DynamicClassField::KeyFormula,
        DynamicClassField::ConfigType,
    ];
}

impl EntityField<DynamicClassRule> for DynamicClassField {
    fn path(&self) -> &'static str {
        match self {
            DynamicClassField::FullClassName => "fullClassName",
            DynamicClassField::MethodName => "methodName",
            DynamicClassField::ParameterTypes => "parameterTypes",
            DynamicClassField::KeyFormula => "keyFormula",
            DynamicClassField::ConfigType => "configType",
        }
    }

    fn read(&self, rule: &DynamicClassRule) -> Bson {
        match self {
            DynamicClassField::FullClassName => Bson::String(rule.full_class_name.clone()),
            DynamicClassField::MethodName => Bson::String(rule.method_name.clone()),
            DynamicClassField::ParameterTypes => Bson::String(rule.parameter_types.clone()),
            DynamicClassField::KeyFormula => Bson::String(rule.key_formula.clone()),
            DynamicClassField::ConfigType => Bson::Int32(rule.config_type),
        }
    }
}
