use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::driver::Driver;
use crate::views::status::{DriverStatus, Roster, StatusCounts};

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum DriverSort {
    #[default]
    Name,
    Username,
    LastSeen,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DriverQuery {
    pub search: Option<String>,
    pub status: Option<DriverStatus>,
    #[serde(default)]
    pub sort: DriverSort,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverRow {
    #[serde(flatten)]
    pub driver: Driver,
    pub status: DriverStatus,
    pub last_seen: Option<DateTime<Utc>>,
    pub active_delivery: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DriversPage {
    pub total: usize,
    pub counts: StatusCounts,
    pub drivers: Vec<DriverRow>,
}

pub fn driver_rows(drivers: &[Driver], roster: &Roster<'_>) -> Vec<DriverRow> {
    drivers
        .iter()
        .map(|driver| {
            let status = roster.status(&driver.id);
            let last_seen = roster.last_ping(&driver.id).map(|log| log.timestamp);
            let active_delivery = roster
                .active_delivery(&driver.id)
                .map(|delivery| delivery.title.clone());

            DriverRow {
                driver: driver.clone(),
                status,
                last_seen,
                active_delivery,
            }
        })
        .collect()
}

/// Counts are taken over the whole roster, before the query narrows it.
pub fn drivers_page(rows: Vec<DriverRow>, query: &DriverQuery) -> DriversPage {
    let total = rows.len();
    let mut counts = StatusCounts::default();
    for row in &rows {
        counts.record(row.status);
    }

    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|needle| !needle.is_empty())
        .map(str::to_lowercase);

    let mut drivers: Vec<DriverRow> = rows
        .into_iter()
        .filter(|row| query.status.is_none_or(|status| row.status == status))
        .filter(|row| match &needle {
            Some(needle) => matches_search(&row.driver, needle),
            None => true,
        })
        .collect();

    drivers.sort_by(|a, b| compare_rows(a, b, query.sort));

    DriversPage {
        total,
        counts,
        drivers,
    }
}

fn matches_search(driver: &Driver, needle: &str) -> bool {
    [&driver.fullname, &driver.username, &driver.phone]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

fn compare_rows(a: &DriverRow, b: &DriverRow, sort: DriverSort) -> Ordering {
    match sort {
        DriverSort::Name => a
            .driver
            .display_name()
            .to_lowercase()
            .cmp(&b.driver.display_name().to_lowercase()),
        DriverSort::Username => a
            .driver
            .username
            .to_lowercase()
            .cmp(&b.driver.username.to_lowercase()),
        // Most recent first; never-seen drivers sink to the bottom.
        DriverSort::LastSeen => match (a.last_seen, b.last_seen) {
            (Some(a_seen), Some(b_seen)) => b_seen.cmp(&a_seen),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{drivers_page, DriverQuery, DriverRow, DriverSort};
    use crate::models::driver::Driver;
    use crate::views::status::DriverStatus;

    fn row(id: &str, fullname: &str, phone: &str, status: DriverStatus, seen_hour: Option<u32>) -> DriverRow {
        DriverRow {
            driver: Driver {
                id: id.to_string(),
                fullname: fullname.to_string(),
                username: fullname.to_lowercase().replace(' ', "."),
                phone: phone.to_string(),
                role: "driver".to_string(),
                created_at: None,
                updated_at: None,
            },
            status,
            last_seen: seen_hour.map(|h| Utc.with_ymd_and_hms(2024, 5, 1, h, 0, 0).unwrap()),
            active_delivery: None,
        }
    }

    fn roster() -> Vec<DriverRow> {
        vec![
            row("1", "Wayan Putra", "0811", DriverStatus::Online, Some(9)),
            row("2", "ani Lestari", "0822", DriverStatus::Offline, None),
            row("3", "Budi Santoso", "0833", DriverStatus::Delivering, Some(11)),
        ]
    }

    #[test]
    fn search_matches_phone_and_name_case_insensitively() {
        let query = DriverQuery {
            search: Some("  SANTOSO ".to_string()),
            ..DriverQuery::default()
        };
        let page = drivers_page(roster(), &query);
        assert_eq!(page.drivers.len(), 1);
        assert_eq!(page.drivers[0].driver.id, "3");

        let query = DriverQuery {
            search: Some("0822".to_string()),
            ..DriverQuery::default()
        };
        assert_eq!(drivers_page(roster(), &query).drivers[0].driver.id, "2");
    }

    #[test]
    fn status_filter_keeps_counts_for_whole_roster() {
        let query = DriverQuery {
            status: Some(DriverStatus::Offline),
            ..DriverQuery::default()
        };
        let page = drivers_page(roster(), &query);

        assert_eq!(page.total, 3);
        assert_eq!(page.counts.online, 1);
        assert_eq!(page.counts.delivering, 1);
        assert_eq!(page.drivers.len(), 1);
    }

    #[test]
    fn name_sort_ignores_case_and_last_seen_puts_unseen_last() {
        let page = drivers_page(roster(), &DriverQuery::default());
        let ids: Vec<&str> = page.drivers.iter().map(|r| r.driver.id.as_str()).collect();
        assert_eq!(ids, ["2", "3", "1"]);

        let query = DriverQuery {
            sort: DriverSort::LastSeen,
            ..DriverQuery::default()
        };
        let page = drivers_page(roster(), &query);
        let ids: Vec<&str> = page.drivers.iter().map(|r| r.driver.id.as_str()).collect();
        assert_eq!(ids, ["3", "1", "2"]);
    }

    #[test]
    fn username_sort_ignores_case() {
        let mut rows = roster();
        rows[0].driver.username = "Zulkifli".to_string();
        rows[1].driver.username = "ani".to_string();
        rows[2].driver.username = "Budi".to_string();

        let query = DriverQuery {
            sort: DriverSort::Username,
            ..DriverQuery::default()
        };
        let page = drivers_page(rows, &query);
        let ids: Vec<&str> = page.drivers.iter().map(|r| r.driver.id.as_str()).collect();
        assert_eq!(ids, ["2", "3", "1"]);
    }
}
