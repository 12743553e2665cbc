use std::collections::HashMap;

use bson::{Bson, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EntityField;

/// A registered application: the owning entity of the configuration store.
/// Every other record type belongs to exactly one application via `app_id`,
/// and deleting an application cascades to all of them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Application {
    /// Store-assigned identity, immutable once set.
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

    /// Stable external identifier, unique across the system by convention.
    pub app_id: String,
    /// Human label; legacy rows may carry a placeholder repaired at startup.
    pub app_name: String,
    pub group_id: String,
    pub group_name: String,
    pub category: String,
    pub owner: String,
    pub organization_id: String,
    pub organization_name: String,
    pub description: String,
    /// Lifecycle flag.
    pub status: i32,
    /// Feature bitmask.
    pub features: i32,
    pub agent_version: String,
    pub agent_ext_version: String,
    pub recorded_case_count: i32,
    /// Free-form tags: each key maps to an append-only set of values.
    pub tags: HashMap<String, Vec<String>>,
}

impl Application {
    pub const COLLECTION: &'static str = "App";
}

impl Default for Application {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: None,
            create_time: now,
            modify_time: now,
            app_id: String::new(),
            app_name: String::new(),
            group_id: String::new(),
            group_name: String::new(),
            category: String::new(),
            owner: String::new(),
            organization_id: String::new(),
            organization_name: String::new(),
            description: String::new(),
            status: 0,
            features: 0,
            agent_version: String::new(),
            agent_ext_version: String::new(),
            recorded_case_count: 0,
            tags: HashMap::new(),
        }
    }
}

/// Mutable fields of an [`Application`] addressable by partial updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppField {
    AppName,
    AgentVersion,
    AgentExtVersion,
    Status,
    Features,
    Owner,
    Tags,
}

impl AppField {
    /// Conservative allow-list applied by `update` unless a deployment opts
    /// into the extended set.
    pub const DEFAULT_UPDATE_FIELDS: &'static [AppField] = &[
        AppField::AgentVersion,
        AppField::AgentExtVersion,
        AppField::Status,
        AppField::Features,
        AppField::AppName,
    ];

    /// Extended allow-list additionally covering ownership and tags.
    pub const EXTENDED_UPDATE_FIELDS: &'static [AppField] = &[
        AppField::AgentVersion,
        AppField::AgentExtVersion,
        AppField::Status,
        AppField::Features,
        AppField::AppName,
        AppField::Owner,
        AppField::Tags,
    ];
}

impl EntityField<Application> for AppField {
    fn path(&self) -> &'static str {
        match self {
            AppField::AppName => "appName",
            AppField::AgentVersion => "agentVersion",
            AppField::AgentExtVersion => "agentExtVersion",
            AppField::Status => "status",
            AppField::Features => "features",
            AppField::Owner => "owner",
            AppField::Tags => "tags",
        }
    }

    fn read(&self, app: &Application) -> Bson {
        match self {
            AppField::AppName => Bson::String(app.app_name.clone()),
            AppField::AgentVersion => Bson::String(app.agent_version.clone()),
            AppField::AgentExtVersion => Bson::String(app.agent_ext_version.clone()),
            AppField::Status => Bson::Int32(app.status),
            AppField::Features => Bson::Int32(app.features),
            AppField::Owner => Bson::String(app.owner.clone()),
            AppField::Tags => {
                let mut tags = Document::new();
                for (key, values) in &app.tags {
                    let values: Vec<Bson> =
                        values.iter().map(|v| Bson::String(v.clone())).collect();
                    tags.insert(key, Bson::Array(values));
                }
                Bson::Document(tags)
            }
        }
    }
}
