//! Status enums for various entities.
//!
//! Every status serializes as its `snake_case` name, parses from the same
//! string (used by admin filter query parameters) and carries a human label.

use serde::{Deserialize, Serialize};

/// Error returned when a status string is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct InvalidStatus {
    /// Which status type was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => ($text:literal, $label:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// All variants, in display order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The machine name used in URLs and serialized data.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }

            /// The human-readable label.
            #[must_use]
            pub const fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = InvalidStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(InvalidStatus {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

status_enum! {
    /// Catalog visibility of a product.
    ProductStatus, "product status" {
        /// Listed on the storefront.
        Active => ("active", "Active"),
        /// Being prepared; hidden from the storefront.
        Draft => ("draft", "Draft"),
        /// Retired; hidden from the storefront.
        Archived => ("archived", "Archived"),
    }
}

status_enum! {
    /// Order lifecycle status.
    OrderStatus, "order status" {
        Pending => ("pending", "Pending"),
        Processing => ("processing", "Processing"),
        Shipped => ("shipped", "Shipped"),
        Delivered => ("delivered", "Delivered"),
        Cancelled => ("cancelled", "Cancelled"),
    }
}

status_enum! {
    /// Return request status.
    ReturnStatus, "return status" {
        Requested => ("requested", "Requested"),
        Approved => ("approved", "Approved"),
        Rejected => ("rejected", "Rejected"),
        Refunded => ("refunded", "Refunded"),
    }
}

status_enum! {
    /// Email campaign status.
    CampaignStatus, "campaign status" {
        Draft => ("draft", "Draft"),
        Scheduled => ("scheduled", "Scheduled"),
        Sent => ("sent", "Sent"),
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl OrderStatus {
    /// Whether an order in this status may move to `next`.
    ///
    /// Orders move forward one fulfilment stage at a time; anything not yet
    /// shipped may be cancelled. Delivered and cancelled orders are final.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing | Self::Cancelled)
                | (Self::Processing, Self::Shipped | Self::Cancelled)
                | (Self::Shipped, Self::Delivered)
        )
    }
}

impl ReturnStatus {
    /// Whether a return in this status may move to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Requested, Self::Approved | Self::Rejected) | (Self::Approved, Self::Refunded)
        )
    }
}
