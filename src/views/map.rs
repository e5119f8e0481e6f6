use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::haversine_km;
use crate::models::delivery::{Delivery, DeliveryStatus};
use crate::models::driver::Driver;
use crate::models::location::{GeoPoint, LocationLog};
use crate::views::status::{DriverStatus, Roster, StatusCounts};

pub const DEFAULT_TRAIL_LENGTH: usize = 50;
pub const MAX_TRAIL_LENGTH: usize = 500;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverMarker {
    pub driver_id: String,
    pub name: String,
    pub position: GeoPoint,
    pub speed: Option<f64>,
    pub status: DriverStatus,
    pub last_seen: DateTime<Utc>,
    pub delivery_id: Option<String>,
    pub delivery_title: Option<String>,
    pub distance_to_destination_km: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationMarker {
    pub delivery_id: String,
    pub title: String,
    pub address: String,
    pub position: GeoPoint,
    pub status: DeliveryStatus,
    pub driver_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSnapshot {
    pub generated_at: DateTime<Utc>,
    pub counts: StatusCounts,
    pub drivers: Vec<DriverMarker>,
    pub destinations: Vec<DestinationMarker>,
}

pub fn map_snapshot(drivers: &[Driver], deliveries: &[Delivery], roster: &Roster<'_>) -> MapSnapshot {
    let mut counts = StatusCounts::default();
    let mut markers = Vec::new();

    for driver in drivers {
        let status = roster.status(&driver.id);
        counts.record(status);

        // Drivers that never reported a position have nothing to plot.
        let Some(ping) = roster.last_ping(&driver.id) else {
            continue;
        };
        let position = ping.point();
        let active = roster.active_delivery(&driver.id);

        markers.push(DriverMarker {
            driver_id: driver.id.clone(),
            name: driver.display_name().to_string(),
            position,
            speed: ping.speed,
            status,
            last_seen: ping.timestamp,
            delivery_id: active.map(|delivery| delivery.id.clone()),
            delivery_title: active.map(|delivery| delivery.title.clone()),
            distance_to_destination_km: active
                .and_then(|delivery| delivery.destination.point())
                .map(|target| haversine_km(&position, &target)),
        });
    }

    let destinations = deliveries
        .iter()
        .filter(|delivery| {
            matches!(
                delivery.status,
                DeliveryStatus::Pending | DeliveryStatus::Assigned
            )
        })
        .filter_map(|delivery| {
            let position = delivery.destination.point()?;
            Some(DestinationMarker {
                delivery_id: delivery.id.clone(),
                title: delivery.title.clone(),
                address: delivery.destination.address.clone(),
                position,
                status: delivery.status,
                driver_name: delivery.driver_name.clone(),
            })
        })
        .collect();

    MapSnapshot {
        generated_at: roster.now(),
        counts,
        drivers: markers,
        destinations,
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrailQuery {
    pub limit: Option<usize>,
}

impl TrailQuery {
    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_TRAIL_LENGTH)
            .clamp(1, MAX_TRAIL_LENGTH)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverTrail {
    pub driver_id: String,
    pub distance_km: f64,
    pub points: Vec<LocationLog>,
}

/// Orders the trail oldest first and keeps at most `limit` newest points.
pub fn driver_trail(driver_id: &str, mut logs: Vec<LocationLog>, limit: usize) -> DriverTrail {
    logs.retain(|log| log.driver_id == driver_id);
    logs.sort_by_key(|log| log.timestamp);
    if logs.len() > limit {
        let excess = logs.len() - limit;
        logs.drain(..excess);
    }

    let distance_km = logs
        .windows(2)
        .map(|pair| haversine_km(&pair[0].point(), &pair[1].point()))
        .sum();

    DriverTrail {
        driver_id: driver_id.to_string(),
        distance_km,
        points: logs,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};

    use super::{driver_trail, map_snapshot, TrailQuery, MAX_TRAIL_LENGTH};
    use crate::models::delivery::{Delivery, DeliveryStatus, Destination};
    use crate::models::driver::Driver;
    use crate::models::location::LocationLog;
    use crate::views::status::{DriverStatus, Roster};

    fn driver(id: &str) -> Driver {
        Driver {
            id: id.to_string(),
            fullname: format!("Driver {id}"),
            username: id.to_string(),
            phone: String::new(),
            role: "driver".to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    fn log(driver_id: &str, minute: u32, lat: f64, lng: f64) -> LocationLog {
        LocationLog {
            driver_id: driver_id.to_string(),
            latitude: lat,
            longitude: lng,
            speed: Some(12.5),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 11, minute, 0).unwrap(),
        }
    }

    #[test]
    fn plots_reporting_drivers_with_distance_to_active_destination() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 11, 59, 0).unwrap();
        let drivers = vec![driver("a"), driver("b")];
        let deliveries = vec![
            Delivery {
                id: "x".to_string(),
                title: "Medicine".to_string(),
                description: String::new(),
                destination: Destination {
                    address: "Clinic".to_string(),
                    latitude: Some(-6.9175),
                    longitude: Some(107.6191),
                },
                items: Vec::new(),
                status: DeliveryStatus::Assigned,
                assigned_driver_id: Some("a".to_string()),
                driver_name: Some("Driver a".to_string()),
                proof_of_delivery: Vec::new(),
                created_at: None,
                updated_at: None,
            },
            Delivery {
                id: "y".to_string(),
                title: "No coordinates".to_string(),
                description: String::new(),
                destination: Destination {
                    address: "Somewhere".to_string(),
                    latitude: None,
                    longitude: None,
                },
                items: Vec::new(),
                status: DeliveryStatus::Pending,
                assigned_driver_id: None,
                driver_name: None,
                proof_of_delivery: Vec::new(),
                created_at: None,
                updated_at: None,
            },
        ];
        let locations = vec![log("a", 58, -6.2088, 106.8456)];
        let roster = Roster::new(&deliveries, &locations, now, Duration::from_secs(300));

        let snapshot = map_snapshot(&drivers, &deliveries, &roster);

        assert_eq!(snapshot.drivers.len(), 1);
        let marker = &snapshot.drivers[0];
        assert_eq!(marker.status, DriverStatus::Delivering);
        assert_eq!(marker.delivery_title.as_deref(), Some("Medicine"));
        let distance = marker.distance_to_destination_km.unwrap();
        assert!((distance - 116.0).abs() < 10.0);

        assert_eq!(snapshot.counts.offline, 1);
        assert_eq!(snapshot.destinations.len(), 1);
        assert_eq!(snapshot.destinations[0].delivery_id, "x");
    }

    #[test]
    fn trail_is_chronological_and_capped() {
        let logs = vec![
            log("a", 30, 0.0, 0.2),
            log("a", 10, 0.0, 0.0),
            log("b", 15, 5.0, 5.0),
            log("a", 20, 0.0, 0.1),
        ];

        let trail = driver_trail("a", logs, 2);

        let minutes: Vec<String> = trail
            .points
            .iter()
            .map(|p| p.timestamp.format("%M").to_string())
            .collect();
        assert_eq!(minutes, ["20", "30"]);
        assert!((trail.distance_km - 11.1).abs() < 0.5);
    }

    #[test]
    fn trail_limit_is_clamped() {
        assert_eq!(TrailQuery { limit: Some(0) }.limit(), 1);
        assert_eq!(TrailQuery { limit: Some(10_000) }.limit(), MAX_TRAIL_LENGTH);
        assert_eq!(TrailQuery::default().limit(), 50);
    }
}
