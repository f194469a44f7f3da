//! Order and return repository.

use chrono::{DateTime, Utc};

use meridian_core::order::{Order, ReturnRequest};
use meridian_core::{OrderNumber, OrderStatus, ReturnId, ReturnStatus};

use super::{AdminStore, RepositoryError, Result, find, find_mut};

impl AdminStore {
    /// All orders, newest first.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Orders matching a search term and status, newest first.
    ///
    /// The search matches the order number, customer name and city.
    #[must_use]
    pub fn search_orders(&self, search: Option<&str>, status: Option<OrderStatus>) -> Vec<&Order> {
        let needle = search.map(|s| s.trim().to_lowercase()).unwrap_or_default();
        self.orders
            .iter()
            .filter(|o| status.is_none_or(|status| o.status == status))
            .filter(|o| {
                needle.is_empty()
                    || o.number.as_str().to_lowercase().contains(&needle)
                    || o.customer_name().to_lowercase().contains(&needle)
                    || o.shipping_address.city.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Get an order by number.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no order has this number.
    pub fn order(&self, number: &OrderNumber) -> Result<&Order> {
        self.orders
            .iter()
            .find(|o| &o.number == number)
            .ok_or_else(|| RepositoryError::not_found("order", number))
    }

    /// Move an order to `status`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown order and `InvalidState` if the
    /// transition is not allowed.
    pub fn update_order_status(&mut self, number: &OrderNumber, status: OrderStatus) -> Result<()> {
        let order = self
            .orders
            .iter_mut()
            .find(|o| &o.number == number)
            .ok_or_else(|| RepositoryError::not_found("order", number))?;
        order
            .update_status(status)
            .map_err(|e| RepositoryError::InvalidState(e.to_string()))
    }

    /// Return requests, optionally filtered by status, newest first.
    #[must_use]
    pub fn returns(&self, status: Option<ReturnStatus>) -> Vec<&ReturnRequest> {
        let mut returns: Vec<&ReturnRequest> = self
            .returns
            .iter()
            .filter(|r| status.is_none_or(|status| r.status == status))
            .collect();
        returns.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        returns
    }

    /// Get a return request by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no return has this id.
    pub fn return_request(&self, id: ReturnId) -> Result<&ReturnRequest> {
        find(&self.returns, id)
    }

    /// Return requests waiting for a decision.
    #[must_use]
    pub fn pending_returns(&self) -> usize {
        self.returns
            .iter()
            .filter(|r| r.status == ReturnStatus::Requested)
            .count()
    }

    /// Move a return request to `status`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown return and `InvalidState` if the
    /// transition is not allowed.
    pub fn update_return_status(
        &mut self,
        id: ReturnId,
        status: ReturnStatus,
        now: DateTime<Utc>,
    ) -> Result<()> {
        find_mut(&mut self.returns, id)?
            .update_status(status, now)
            .map_err(|e| RepositoryError::InvalidState(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::tests::store;
    use super::*;

    #[test]
    fn test_search_orders() {
        let store = store();
        assert_eq!(store.search_orders(None, None).len(), store.orders().len());

        let by_name = store.search_orders(Some("maya"), None);
        assert_eq!(by_name.len(), 1);

        let cancelled = store.search_orders(None, Some(OrderStatus::Cancelled));
        assert!(cancelled.iter().all(|o| o.status == OrderStatus::Cancelled));
    }

    #[test]
    fn test_order_status_transitions() {
        let mut store = store();
        let number = OrderNumber::parse("ORD1748867540221903").unwrap();
        store
            .update_order_status(&number, OrderStatus::Processing)
            .unwrap();
        assert_eq!(store.order(&number).unwrap().status, OrderStatus::Processing);

        let err = store
            .update_order_status(&number, OrderStatus::Delivered)
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidState(_)));

        let missing = OrderNumber::parse("ORD12").unwrap();
        assert!(matches!(
            store.update_order_status(&missing, OrderStatus::Shipped),
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_return_decisions() {
        let mut store = store();
        assert_eq!(store.pending_returns(), 1);

        store
            .update_return_status(ReturnId::new(2), ReturnStatus::Approved, Utc::now())
            .unwrap();
        assert_eq!(store.pending_returns(), 0);

        let err = store
            .update_return_status(ReturnId::new(1), ReturnStatus::Approved, Utc::now())
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidState(_)));
    }
}
