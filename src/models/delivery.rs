use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::location::GeoPoint;
use crate::models::{flexible_id, flexible_opt_id};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Assigned,
    Completed,
    Approved,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Assigned => "assigned",
            DeliveryStatus::Completed => "completed",
            DeliveryStatus::Approved => "approved",
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDestination {
    Address(String),
    Full {
        #[serde(default)]
        address: String,
        #[serde(default, alias = "lat")]
        latitude: Option<f64>,
        #[serde(default, alias = "lng")]
        longitude: Option<f64>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "RawDestination")]
pub struct Destination {
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<RawDestination> for Destination {
    fn from(raw: RawDestination) -> Self {
        match raw {
            RawDestination::Address(address) => Destination {
                address,
                latitude: None,
                longitude: None,
            },
            RawDestination::Full {
                address,
                latitude,
                longitude,
            } => Destination {
                address,
                latitude,
                longitude,
            },
        }
    }
}

impl Destination {
    pub fn point(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryItem {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    #[serde(alias = "_id", deserialize_with = "flexible_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub destination: Destination,
    #[serde(default)]
    pub items: Vec<DeliveryItem>,
    pub status: DeliveryStatus,
    #[serde(default, deserialize_with = "flexible_opt_id")]
    pub assigned_driver_id: Option<String>,
    #[serde(default)]
    pub driver_name: Option<String>,
    #[serde(default)]
    pub proof_of_delivery: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Delivery {
    pub fn is_assigned_to(&self, driver_id: &str) -> bool {
        self.status == DeliveryStatus::Assigned
            && self.assigned_driver_id.as_deref() == Some(driver_id)
    }

    /// Most recent lifecycle timestamp, used for "newest first" ordering.
    pub fn touched_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }
}

/// Body for creating or editing a delivery point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryPayload {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub destination: Destination,
    #[serde(default)]
    pub items: Vec<DeliveryItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignDriver {
    pub driver_id: String,
}
