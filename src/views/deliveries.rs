use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::models::delivery::{Delivery, DeliveryStatus};

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DeliveryCounts {
    pub pending: usize,
    pub assigned: usize,
    pub completed: usize,
    pub approved: usize,
}

impl DeliveryCounts {
    pub fn tally(deliveries: &[Delivery]) -> Self {
        let mut counts = Self::default();
        for delivery in deliveries {
            match delivery.status {
                DeliveryStatus::Pending => counts.pending += 1,
                DeliveryStatus::Assigned => counts.assigned += 1,
                DeliveryStatus::Completed => counts.completed += 1,
                DeliveryStatus::Approved => counts.approved += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryQuery {
    pub search: Option<String>,
    pub status: Option<DeliveryStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryPointsPage {
    pub total: usize,
    pub counts: DeliveryCounts,
    pub deliveries: Vec<Delivery>,
}

pub fn delivery_points_page(deliveries: Vec<Delivery>, query: &DeliveryQuery) -> DeliveryPointsPage {
    let total = deliveries.len();
    let counts = DeliveryCounts::tally(&deliveries);

    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|needle| !needle.is_empty())
        .map(str::to_lowercase);

    let mut deliveries: Vec<Delivery> = deliveries
        .into_iter()
        .filter(|delivery| query.status.is_none_or(|status| delivery.status == status))
        .filter(|delivery| match &needle {
            Some(needle) => matches_search(delivery, needle),
            None => true,
        })
        .collect();
    newest_first(&mut deliveries);

    DeliveryPointsPage {
        total,
        counts,
        deliveries,
    }
}

fn matches_search(delivery: &Delivery, needle: &str) -> bool {
    let driver_name = delivery.driver_name.as_deref().unwrap_or_default();
    [
        delivery.title.as_str(),
        delivery.description.as_str(),
        delivery.destination.address.as_str(),
        driver_name,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

/// Undated deliveries go last; ties keep backend order.
pub fn newest_first(deliveries: &mut [Delivery]) {
    deliveries.sort_by_key(|delivery| Reverse(delivery.touched_at()));
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewQuery {
    pub status: Option<DeliveryStatus>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReview {
    #[serde(flatten)]
    pub delivery: Delivery,
    pub has_proof: bool,
    pub can_approve: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryStatusPage {
    pub status: DeliveryStatus,
    pub counts: DeliveryCounts,
    pub deliveries: Vec<DeliveryReview>,
}

/// Defaults to deliveries awaiting approval.
pub fn delivery_status_page(deliveries: Vec<Delivery>, query: &ReviewQuery) -> DeliveryStatusPage {
    let status = query.status.unwrap_or(DeliveryStatus::Completed);
    let counts = DeliveryCounts::tally(&deliveries);

    let mut selected: Vec<Delivery> = deliveries
        .into_iter()
        .filter(|delivery| delivery.status == status)
        .collect();
    newest_first(&mut selected);

    let deliveries = selected
        .into_iter()
        .map(|delivery| DeliveryReview {
            has_proof: !delivery.proof_of_delivery.is_empty(),
            can_approve: delivery.status == DeliveryStatus::Completed,
            delivery,
        })
        .collect();

    DeliveryStatusPage {
        status,
        counts,
        deliveries,
    }
}
