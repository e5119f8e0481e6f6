use serde::{Deserialize, Serialize};

use crate::models::delivery::{Delivery, DeliveryStatus};
use crate::models::driver::Driver;
use crate::views::deliveries::newest_first;
use crate::views::status::{DriverStatus, Roster};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRequest {
    #[serde(default)]
    pub delivery_id: String,
    #[serde(default)]
    pub driver_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverOption {
    pub id: String,
    pub name: String,
    pub status: DriverStatus,
    pub active_deliveries: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentsPage {
    pub unassigned: Vec<Delivery>,
    pub in_progress: Vec<Delivery>,
    pub drivers: Vec<DriverOption>,
}

fn status_rank(status: DriverStatus) -> u8 {
    match status {
        DriverStatus::Online => 0,
        DriverStatus::Delivering => 1,
        DriverStatus::Offline => 2,
    }
}

/// Driver options are ordered online, delivering, offline, then by name.
pub fn assignments_page(
    drivers: &[Driver],
    deliveries: &[Delivery],
    roster: &Roster<'_>,
) -> AssignmentsPage {
    let mut unassigned: Vec<Delivery> = deliveries
        .iter()
        .filter(|delivery| delivery.status == DeliveryStatus::Pending)
        .cloned()
        .collect();
    newest_first(&mut unassigned);

    let mut in_progress: Vec<Delivery> = deliveries
        .iter()
        .filter(|delivery| delivery.status == DeliveryStatus::Assigned)
        .cloned()
        .collect();
    newest_first(&mut in_progress);

    let mut options: Vec<DriverOption> = drivers
        .iter()
        .map(|driver| DriverOption {
            id: driver.id.clone(),
            name: driver.display_name().to_string(),
            status: roster.status(&driver.id),
            active_deliveries: deliveries
                .iter()
                .filter(|delivery| delivery.is_assigned_to(&driver.id))
                .count(),
        })
        .collect();
    options.sort_by(|a, b| {
        status_rank(a.status)
            .cmp(&status_rank(b.status))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });

    AssignmentsPage {
        unassigned,
        in_progress,
        drivers: options,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};

    use super::assignments_page;
    use crate::models::delivery::{Delivery, DeliveryStatus, Destination};
    use crate::models::driver::Driver;
    use crate::models::location::LocationLog;
    use crate::views::status::{DriverStatus, Roster};

    fn driver(id: &str, fullname: &str) -> Driver {
        Driver {
            id: id.to_string(),
            fullname: fullname.to_string(),
            username: id.to_string(),
            phone: String::new(),
            role: "driver".to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    fn delivery(id: &str, status: DeliveryStatus, driver: Option<&str>) -> Delivery {
        Delivery {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            destination: Destination {
                address: "Depot".to_string(),
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
    fn splits_backlog_and_orders_drivers_idle_first() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let drivers = vec![driver("a", "Zed"), driver("b", "Yuni"), driver("c", "Xavier")];
        let deliveries = vec![
            delivery("p1", DeliveryStatus::Pending, None),
            delivery("s1", DeliveryStatus::Assigned, Some("b")),
            delivery("done", DeliveryStatus::Approved, Some("a")),
        ];
        let locations = vec![
            LocationLog {
                driver_id: "b".to_string(),
                latitude: 0.0,
                longitude: 0.0,
                speed: None,
                timestamp: now,
            },
            LocationLog {
                driver_id: "c".to_string(),
                latitude: 0.0,
                longitude: 0.0,
                speed: None,
                timestamp: now,
            },
        ];
        let roster = Roster::new(&deliveries, &locations, now, Duration::from_secs(300));

        let page = assignments_page(&drivers, &deliveries, &roster);

        assert_eq!(page.unassigned.len(), 1);
        assert_eq!(page.in_progress[0].id, "s1");
        let order: Vec<(&str, DriverStatus)> = page
            .drivers
            .iter()
            .map(|option| (option.id.as_str(), option.status))
            .collect();
        assert_eq!(
            order,
            [
                ("c", DriverStatus::Online),
                ("b", DriverStatus::Delivering),
                ("a", DriverStatus::Offline),
            ]
        );
        assert_eq!(page.drivers[1].active_deliveries, 1);
    }
}
