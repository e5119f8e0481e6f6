use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::delivery::Delivery;
use crate::models::driver::Driver;
use crate::views::deliveries::{newest_first, DeliveryCounts};
use crate::views::status::{Roster, StatusCounts};

pub const RECENT_DELIVERIES: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct DriverSummary {
    pub total: usize,
    #[serde(flatten)]
    pub counts: StatusCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliverySummary {
    pub total: usize,
    #[serde(flatten)]
    pub counts: DeliveryCounts,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPage {
    pub generated_at: DateTime<Utc>,
    pub drivers: DriverSummary,
    pub deliveries: DeliverySummary,
    pub awaiting_approval: usize,
    pub recent_deliveries: Vec<Delivery>,
}

pub fn dashboard_page(
    drivers: &[Driver],
    deliveries: &[Delivery],
    roster: &Roster<'_>,
) -> DashboardPage {
    let mut driver_counts = StatusCounts::default();
    for driver in drivers {
        driver_counts.record(roster.status(&driver.id));
    }

    let counts = DeliveryCounts::tally(deliveries);
    let total = deliveries.len();

    let mut recent = deliveries.to_vec();
    newest_first(&mut recent);
    recent.truncate(RECENT_DELIVERIES);

    DashboardPage {
        generated_at: roster.now(),
        drivers: DriverSummary {
            total: drivers.len(),
            counts: driver_counts,
        },
        awaiting_approval: counts.completed,
        deliveries: DeliverySummary { total, counts },
        recent_deliveries: recent,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};

    use super::{dashboard_page, RECENT_DELIVERIES};
    use crate::models::delivery::{Delivery, DeliveryStatus, Destination};
    use crate::models::driver::Driver;
    use crate::views::status::Roster;

    #[test]
    fn summarises_fleet_and_keeps_latest_deliveries() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let drivers = vec![Driver {
            id: "d1".to_string(),
            fullname: "Rina".to_string(),
            username: "rina".to_string(),
            phone: String::new(),
            role: "driver".to_string(),
            created_at: None,
            updated_at: None,
        }];
        let deliveries: Vec<Delivery> = (0..8u32)
            .map(|n| Delivery {
                id: n.to_string(),
                title: format!("parcel {n}"),
                description: String::new(),
                destination: Destination {
                    address: "Depot".to_string(),
                    latitude: None,
                    longitude: None,
                },
                items: Vec::new(),
                status: if n % 2 == 0 {
                    DeliveryStatus::Completed
                } else {
                    DeliveryStatus::Pending
                },
                assigned_driver_id: None,
                driver_name: None,
                proof_of_delivery: Vec::new(),
                created_at: Some(Utc.with_ymd_and_hms(2024, 4, 1 + n, 9, 0, 0).unwrap()),
                updated_at: None,
            })
            .collect();

        let no_pings = Vec::new();
        let roster = Roster::new(&deliveries, &no_pings, now, Duration::from_secs(300));
        let page = dashboard_page(&drivers, &deliveries, &roster);

        assert_eq!(page.drivers.total, 1);
        assert_eq!(page.drivers.counts.offline, 1);
        assert_eq!(page.deliveries.total, 8);
        assert_eq!(page.awaiting_approval, 4);
        assert_eq!(page.recent_deliveries.len(), RECENT_DELIVERIES);
        assert_eq!(page.recent_deliveries[0].id, "7");
    }
}
