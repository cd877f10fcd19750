//! Identifiers and entity references.
//!
//! Seeded entities (hospitals, labs, pharmacies, suppliers, zones) are
//! keyed by the stable string ids of the seed snapshot. Orders are created
//! at runtime and get a UUID v7 (time-ordered) identifier.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::enums::RequesterKind;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_id! {
    /// Unique identifier for a supply order.
    ///
    /// A pharmacy's pending order and the supplier's matching active order
    /// share the same id.
    OrderId
}

/// Reference to the entity that raised an order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Requester {
    /// Hospital or pharmacy.
    pub kind: RequesterKind,
    /// Seed id of the requesting entity.
    pub id: String,
}

impl Requester {
    /// Reference a pharmacy by id.
    pub fn pharmacy(id: impl Into<String>) -> Self {
        Self {
            kind: RequesterKind::Pharmacy,
            id: id.into(),
        }
    }

    /// Reference a hospital by id.
    pub fn hospital(id: impl Into<String>) -> Self {
        Self {
            kind: RequesterKind::Hospital,
            id: id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_ids_are_unique() {
        assert_ne!(OrderId::new(), OrderId::new());
    }

    #[test]
    fn id_display_matches_uuid() {
        let id = OrderId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }

    #[test]
    fn requester_constructors_set_kind() {
        assert_eq!(Requester::pharmacy("P1").kind, RequesterKind::Pharmacy);
        assert_eq!(Requester::hospital("H1").kind, RequesterKind::Hospital);
    }
}
