use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::flexible_id;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    #[serde(alias = "_id", deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(default)]
    pub fullname: String,
    pub username: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Driver {
    /// Name shown in tables; falls back to the username for accounts without one.
    pub fn display_name(&self) -> &str {
        if self.fullname.trim().is_empty() {
            &self.username
        } else {
            &self.fullname
        }
    }
}

fn default_role() -> String {
    "driver".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDriver {
    pub fullname: String,
    pub username: String,
    pub phone: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverUpdate {
    pub fullname: String,
    pub username: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}
