use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::delivery::{Delivery, DeliveryStatus};
use crate::models::location::LocationLog;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DriverStatus {
    Online,
    Offline,
    Delivering,
}

/// A driver is online while its newest ping is younger than `threshold`,
/// and delivering when it is online with an active assignment.
pub fn derive_status(
    last_ping: Option<DateTime<Utc>>,
    has_active_assignment: bool,
    now: DateTime<Utc>,
    threshold: Duration,
) -> DriverStatus {
    let threshold = chrono::Duration::from_std(threshold).unwrap_or(chrono::Duration::MAX);

    let fresh = match last_ping {
        Some(ping) => now.signed_duration_since(ping) < threshold,
        None => false,
    };

    match (fresh, has_active_assignment) {
        (false, _) => DriverStatus::Offline,
        (true, true) => DriverStatus::Delivering,
        (true, false) => DriverStatus::Online,
    }
}

/// Per-driver lookups built once per page load.
pub struct Roster<'a> {
    latest: HashMap<&'a str, &'a LocationLog>,
    active: HashMap<&'a str, &'a Delivery>,
    now: DateTime<Utc>,
    threshold: Duration,
}

impl<'a> Roster<'a> {
    pub fn new(
        deliveries: &'a [Delivery],
        locations: &'a [LocationLog],
        now: DateTime<Utc>,
        threshold: Duration,
    ) -> Self {
        let mut latest: HashMap<&str, &LocationLog> = HashMap::new();
        for log in locations {
            latest
                .entry(log.driver_id.as_str())
                .and_modify(|current| {
                    if log.timestamp > current.timestamp {
                        *current = log;
                    }
                })
                .or_insert(log);
        }

        let mut active: HashMap<&str, &Delivery> = HashMap::new();
        for delivery in deliveries {
            if delivery.status != DeliveryStatus::Assigned {
                continue;
            }
            if let Some(driver_id) = delivery.assigned_driver_id.as_deref() {
                active
                    .entry(driver_id)
                    .and_modify(|current| {
                        if delivery.touched_at() > current.touched_at() {
                            *current = delivery;
                        }
                    })
                    .or_insert(delivery);
            }
        }

        Self {
            latest,
            active,
            now,
            threshold,
        }
    }

    pub fn last_ping(&self, driver_id: &str) -> Option<&'a LocationLog> {
        self.latest.get(driver_id).copied()
    }

    pub fn active_delivery(&self, driver_id: &str) -> Option<&'a Delivery> {
        self.active.get(driver_id).copied()
    }

    pub fn status(&self, driver_id: &str) -> DriverStatus {
        derive_status(
            self.last_ping(driver_id).map(|log| log.timestamp),
            self.active.contains_key(driver_id),
            self.now,
            self.threshold,
        )
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct StatusCounts {
    pub online: usize,
    pub offline: usize,
    pub delivering: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: DriverStatus) {
        match status {
            DriverStatus::Online => self.online += 1,
            DriverStatus::Offline => self.offline += 1,
            DriverStatus::Delivering => self.delivering += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};

    use super::{derive_status, DriverStatus, Roster};
    use crate::models::delivery::{Delivery, DeliveryStatus, Destination};
    use crate::models::location::LocationLog;

    const FIVE_MINUTES: Duration = Duration::from_secs(300);

    fn ping(driver_id: &str, minutes_ago: i64) -> LocationLog {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        LocationLog {
            driver_id: driver_id.to_string(),
            latitude: -6.2,
            longitude: 106.8,
            speed: Some(20.0),
            timestamp: now - chrono::Duration::minutes(minutes_ago),
        }
    }

    fn delivery(id: &str, status: DeliveryStatus, driver: Option<&str>) -> Delivery {
        Delivery {
            id: id.to_string(),
            title: format!("delivery {id}"),
            description: String::new(),
            destination: Destination {
                address: "Jl. Sudirman 1".to_string(),
                latitude: None,
                longitude: None,
            },
            items: Vec::new(),
            status,
            assigned_driver_id: driver.map(str::to_string),
            driver_name: None,
            proof_of_delivery: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn stale_or_missing_ping_is_offline() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let stale = now - chrono::Duration::minutes(5);

        assert_eq!(derive_status(None, false, now, FIVE_MINUTES), DriverStatus::Offline);
        assert_eq!(derive_status(Some(stale), true, now, FIVE_MINUTES), DriverStatus::Offline);
    }

    #[test]
    fn fresh_ping_with_assignment_is_delivering() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let fresh = now - chrono::Duration::seconds(299);

        assert_eq!(derive_status(Some(fresh), false, now, FIVE_MINUTES), DriverStatus::Online);
        assert_eq!(derive_status(Some(fresh), true, now, FIVE_MINUTES), DriverStatus::Delivering);
    }

    #[test]
    fn future_ping_counts_as_fresh() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let ahead = now + chrono::Duration::minutes(2);

        assert_eq!(derive_status(Some(ahead), false, now, FIVE_MINUTES), DriverStatus::Online);
    }

    #[test]
    fn roster_uses_newest_ping_and_only_assigned_deliveries() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let locations = vec![ping("d1", 30), ping("d1", 1), ping("d2", 2)];
        let deliveries = vec![
            delivery("x", DeliveryStatus::Assigned, Some("d1")),
            delivery("y", DeliveryStatus::Completed, Some("d2")),
        ];

        let roster = Roster::new(&deliveries, &locations, now, FIVE_MINUTES);

        assert_eq!(roster.status("d1"), DriverStatus::Delivering);
        assert_eq!(roster.status("d2"), DriverStatus::Online);
        assert_eq!(roster.status("d3"), DriverStatus::Offline);
        assert_eq!(roster.active_delivery("d1").map(|d| d.id.as_str()), Some("x"));
        assert!(roster.active_delivery("d2").is_none());
    }
}
