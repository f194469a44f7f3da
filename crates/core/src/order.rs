//! Placed orders and return requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::checkout::{Address, PaymentMethod, ShippingOption};
use crate::totals::OrderTotals;
use crate::types::{OrderNumber, OrderStatus, Price, ReturnId, ReturnStatus};

/// Errors changing the state of an order or return.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusChangeError {
    #[error("cannot move order from {from} to {to}")]
    Order { from: OrderStatus, to: OrderStatus },
    #[error("cannot move return from {from} to {to}")]
    Return { from: ReturnStatus, to: ReturnStatus },
}

/// A placed order. Totals are frozen at placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub number: OrderNumber,
    pub items: Vec<CartItem>,
    pub shipping_address: Address,
    pub shipping_option: ShippingOption,
    pub payment: PaymentMethod,
    pub totals: OrderTotals,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    pub placed_at: DateTime<Utc>,
}

impl Order {
    /// Name on the shipping address.
    #[must_use]
    pub fn customer_name(&self) -> &str {
        &self.shipping_address.full_name
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Move the order to `next`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is not allowed.
    pub fn update_status(&mut self, next: OrderStatus) -> Result<(), StatusChangeError> {
        if !self.status.can_transition_to(next) {
            return Err(StatusChangeError::Order {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

/// A customer's request to send items back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub id: ReturnId,
    pub order_number: OrderNumber,
    pub customer: String,
    pub reason: String,
    pub item_count: u32,
    pub refund_amount: Price,
    pub status: ReturnStatus,
    pub requested_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ReturnRequest {
    /// Move the return to `next`, stamping `resolved_at` when it closes.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is not allowed.
    pub fn update_status(
        &mut self,
        next: ReturnStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StatusChangeError> {
        if !self.status.can_transition_to(next) {
            return Err(StatusChangeError::Return {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        if matches!(next, ReturnStatus::Rejected | ReturnStatus::Refunded) {
            self.resolved_at = Some(now);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn request() -> ReturnRequest {
        ReturnRequest {
            id: ReturnId::new(1),
            order_number: OrderNumber::parse("ORD1717243200000042").unwrap(),
            customer: "Ada Lovelace".to_string(),
            reason: "Wrong size".to_string(),
            item_count: 1,
            refund_amount: Price::from_cents(4_800),
            status: ReturnStatus::Requested,
            requested_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
            resolved_at: None,
        }
    }

    #[test]
    fn test_return_lifecycle() {
        let now = Utc.with_ymd_and_hms(2025, 6, 3, 0, 0, 0).unwrap();
        let mut ret = request();
        assert!(ret.update_status(ReturnStatus::Refunded, now).is_err());
        ret.update_status(ReturnStatus::Approved, now).unwrap();
        assert_eq!(ret.resolved_at, None);
        ret.update_status(ReturnStatus::Refunded, now).unwrap();
        assert_eq!(ret.resolved_at, Some(now));
    }

    #[test]
    fn test_rejected_return_is_final() {
        let now = Utc.with_ymd_and_hms(2025, 6, 3, 0, 0, 0).unwrap();
        let mut ret = request();
        ret.update_status(ReturnStatus::Rejected, now).unwrap();
        assert_eq!(
            ret.update_status(ReturnStatus::Approved, now),
            Err(StatusChangeError::Return {
                from: ReturnStatus::Rejected,
                to: ReturnStatus::Approved,
            })
        );
    }
}
