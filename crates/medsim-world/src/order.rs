//! Supply orders shared between pharmacies, hospitals and suppliers.

use chrono::{DateTime, Utc};
use medsim_types::{Criticality, OrderId, OrderStatus, Requester, Urgency};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// A request for `quantity` units of `item`, tracked from request to delivery.
///
/// The same [`OrderId`] appears in the requester's pending list and in the
/// supplier's active list, so both sides can follow one shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier.
    pub id: OrderId,
    /// Medicine or equipment item.
    pub item: String,
    /// Units requested, or shipped once dispatched.
    pub quantity: u32,
    /// Destination zone.
    pub zone: String,
    /// Who raised the order.
    pub requester: Requester,
    /// Supplier handling the order, once known.
    pub supplier_id: Option<String>,
    /// How soon the requester needs it.
    pub urgency: Urgency,
    /// Clinical criticality of the item.
    pub criticality: Criticality,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// When the order was raised.
    pub created_at: DateTime<Utc>,
    /// Expected arrival, set on dispatch.
    pub eta: Option<DateTime<Utc>>,
    /// Arrival time, set on delivery.
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Create a new order in the `Requested` status.
    pub fn request(
        item: impl Into<String>,
        quantity: u32,
        zone: impl Into<String>,
        requester: Requester,
        urgency: Urgency,
        criticality: Criticality,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OrderId::new(),
            item: item.into(),
            quantity,
            zone: zone.into(),
            requester,
            supplier_id: None,
            urgency,
            criticality,
            status: OrderStatus::Requested,
            created_at: now,
            eta: None,
            delivered_at: None,
        }
    }

    /// Move the order one step forward.
    ///
    /// Only `Requested -> Dispatched` and `Dispatched -> Delivered` are
    /// accepted. Reaching `Delivered` stamps `delivered_at` with `now`.
    pub fn advance(&mut self, to: OrderStatus, now: DateTime<Utc>) -> Result<(), WorldError> {
        if self.status.next() != Some(to) {
            return Err(WorldError::InvalidTransition {
                order: self.id,
                from: self.status,
                to,
            });
        }
        self.status = to;
        if to == OrderStatus::Delivered {
            self.delivered_at = Some(now);
        }
        Ok(())
    }

    /// Whether the order is still waiting for a vehicle or in transit.
    pub fn is_open(&self) -> bool {
        self.status != OrderStatus::Delivered
    }
}
