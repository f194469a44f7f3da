//! Marketing repository: banners, coupons, discounts and email campaigns.

use chrono::{DateTime, Utc};

use meridian_core::marketing::{
    Banner, Coupon, Discount, DiscountScope, DiscountValue, EmailCampaign,
};
use meridian_core::{
    BannerId, CampaignId, CampaignStatus, CouponId, DiscountId, Email, Price,
};

use super::{
    AdminStore, RepositoryError, Result, find_mut, remove, set_active, toggle,
};

/// A banner to create.
#[derive(Debug, Clone)]
pub struct NewBanner {
    pub title: String,
    pub subtitle: Option<String>,
    pub image: String,
    pub link: String,
    pub placement: String,
    pub active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// A coupon to create.
#[derive(Debug, Clone)]
pub struct NewCoupon {
    pub code: String,
    pub description: String,
    pub value: DiscountValue,
    pub min_subtotal: Option<Price>,
    pub usage_limit: Option<u32>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// An automatic discount to create.
#[derive(Debug, Clone)]
pub struct NewDiscount {
    pub name: String,
    pub value: DiscountValue,
    pub scope: DiscountScope,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// An email campaign draft to create.
#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub name: String,
    pub subject: String,
    pub from: Email,
    pub segment: String,
    pub recipients: u32,
}

// =============================================================================
// Banners
// =============================================================================

impl AdminStore {
    /// All banners.
    #[must_use]
    pub fn banners(&self) -> &[Banner] {
        &self.banners
    }

    /// Create a banner.
    pub fn create_banner(&mut self, new: NewBanner) -> BannerId {
        let id = BannerId::new(self.sequences.banners.issue());
        self.banners.push(Banner {
            id,
            title: new.title,
            subtitle: new.subtitle,
            image: new.image,
            link: new.link,
            placement: new.placement,
            active: new.active,
            starts_at: new.starts_at,
            ends_at: new.ends_at,
        });
        id
    }

    /// Flip a banner on or off, returning the new state.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no banner has this id.
    pub fn toggle_banner(&mut self, id: BannerId) -> Result<bool> {
        toggle(&mut self.banners, id)
    }

    /// Switch a banner on or off.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no banner has this id.
    pub fn set_banner_active(&mut self, id: BannerId, active: bool) -> Result<()> {
        set_active(&mut self.banners, id, active)
    }

    /// Delete a banner.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no banner has this id.
    pub fn delete_banner(&mut self, id: BannerId) -> Result<Banner> {
        remove(&mut self.banners, id)
    }
}

// =============================================================================
// Coupons
// =============================================================================

impl AdminStore {
    /// All coupons.
    #[must_use]
    pub fn coupons(&self) -> &[Coupon] {
        &self.coupons
    }

    /// Create a coupon. Codes are stored upper-case.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if another coupon already uses the code.
    pub fn create_coupon(&mut self, new: NewCoupon) -> Result<CouponId> {
        let code = Coupon::normalize_code(&new.code);
        if self.coupons.iter().any(|c| c.code == code) {
            return Err(RepositoryError::Conflict(format!(
                "coupon code {code} already exists"
            )));
        }
        let id = CouponId::new(self.sequences.coupons.issue());
        self.coupons.push(Coupon {
            id,
            code,
            description: new.description,
            value: new.value,
            min_subtotal: new.min_subtotal,
            usage_limit: new.usage_limit,
            usage_count: 0,
            active: true,
            expires_at: new.expires_at,
        });
        Ok(id)
    }

    /// Flip a coupon on or off, returning the new state.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no coupon has this id.
    pub fn toggle_coupon(&mut self, id: CouponId) -> Result<bool> {
        toggle(&mut self.coupons, id)
    }

    /// Switch a coupon on or off.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no coupon has this id.
    pub fn set_coupon_active(&mut self, id: CouponId, active: bool) -> Result<()> {
        set_active(&mut self.coupons, id, active)
    }

    /// Delete a coupon.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no coupon has this id.
    pub fn delete_coupon(&mut self, id: CouponId) -> Result<Coupon> {
        remove(&mut self.coupons, id)
    }
}

// =============================================================================
// Discounts
// =============================================================================

impl AdminStore {
    /// All automatic discounts.
    #[must_use]
    pub fn discounts(&self) -> &[Discount] {
        &self.discounts
    }

    /// Create an automatic discount, active from `starts_at`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if it would end before it starts, or if it is
    /// scoped to an unknown category.
    pub fn create_discount(&mut self, new: NewDiscount) -> Result<DiscountId> {
        if new.ends_at.is_some_and(|end| end <= new.starts_at) {
            return Err(RepositoryError::InvalidState(
                "end date must be after the start date".to_string(),
            ));
        }
        if let DiscountScope::Category(slug) = &new.scope
            && !self.categories.iter().any(|c| &c.slug == slug)
        {
            return Err(RepositoryError::InvalidState(format!(
                "unknown category: {slug}"
            )));
        }
        let id = DiscountId::new(self.sequences.discounts.issue());
        self.discounts.push(Discount {
            id,
            name: new.name,
            value: new.value,
            scope: new.scope,
            active: true,
            starts_at: new.starts_at,
            ends_at: new.ends_at,
        });
        Ok(id)
    }

    /// Flip a discount on or off, returning the new state.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no discount has this id.
    pub fn toggle_discount(&mut self, id: DiscountId) -> Result<bool> {
        toggle(&mut self.discounts, id)
    }

    /// Switch a discount on or off.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no discount has this id.
    pub fn set_discount_active(&mut self, id: DiscountId, active: bool) -> Result<()> {
        set_active(&mut self.discounts, id, active)
    }

    /// Delete a discount.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no discount has this id.
    pub fn delete_discount(&mut self, id: DiscountId) -> Result<Discount> {
        remove(&mut self.discounts, id)
    }
}

// =============================================================================
// Email campaigns
// =============================================================================

impl AdminStore {
    /// Campaigns, optionally filtered by status, newest first.
    #[must_use]
    pub fn campaigns(&self, status: Option<CampaignStatus>) -> Vec<&EmailCampaign> {
        let mut campaigns: Vec<&EmailCampaign> = self
            .campaigns
            .iter()
            .filter(|c| status.is_none_or(|status| c.status == status))
            .collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        campaigns
    }

    /// Campaigns that are scheduled and not yet sent.
    #[must_use]
    pub fn active_campaigns(&self) -> usize {
        self.campaigns
            .iter()
            .filter(|c| c.status == CampaignStatus::Scheduled)
            .count()
    }

    /// Create a campaign draft.
    pub fn create_campaign(&mut self, new: NewCampaign, now: DateTime<Utc>) -> CampaignId {
        let id = CampaignId::new(self.sequences.campaigns.issue());
        self.campaigns.push(EmailCampaign {
            id,
            name: new.name,
            subject: new.subject,
            from: new.from,
            segment: new.segment,
            status: CampaignStatus::Draft,
            recipients: new.recipients,
            scheduled_at: None,
            sent_at: None,
            open_rate: None,
            created_at: now,
        });
        id
    }

    /// Schedule a draft campaign for `at`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown campaign and `InvalidState` if it is
    /// not a draft or `at` is not in the future.
    pub fn schedule_campaign(
        &mut self,
        id: CampaignId,
        at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        find_mut(&mut self.campaigns, id)?
            .schedule(at, now)
            .map_err(|e| RepositoryError::InvalidState(e.to_string()))
    }

    /// Mark a campaign as sent.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown campaign and `InvalidState` if it
    /// was already sent.
    pub fn send_campaign(&mut self, id: CampaignId, now: DateTime<Utc>) -> Result<()> {
        find_mut(&mut self.campaigns, id)?
            .mark_sent(now)
            .map_err(|e| RepositoryError::InvalidState(e.to_string()))
    }

    /// Delete a campaign.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no campaign has this id.
    pub fn delete_campaign(&mut self, id: CampaignId) -> Result<EmailCampaign> {
        remove(&mut self.campaigns, id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use rust_decimal::Decimal;

    use super::super::tests::store;
    use super::*;

    fn coupon(code: &str) -> NewCoupon {
        NewCoupon {
            code: code.to_string(),
            description: "Test".to_string(),
            value: DiscountValue::Percentage(Decimal::from(5)),
            min_subtotal: None,
            usage_limit: None,
            expires_at: None,
        }
    }

    #[test]
    fn test_create_coupon_normalizes_and_rejects_duplicates() {
        let mut store = store();
        let id = store.create_coupon(coupon(" summer5 ")).unwrap();
        assert_eq!(id, CouponId::new(4));
        assert!(store.coupons().iter().any(|c| c.code == "SUMMER5" && c.active));

        let err = store.create_coupon(coupon("welcome10")).unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[test]
    fn test_deleted_coupon_id_is_not_reused() {
        let mut store = store();
        let id = store.create_coupon(coupon("spring")).unwrap();
        store.delete_coupon(id).unwrap();
        let next = store.create_coupon(coupon("autumn")).unwrap();
        assert_ne!(next, id);
        assert_eq!(next, CouponId::new(id.as_i32() + 1));
    }

    #[test]
    fn test_toggle_banner() {
        let mut store = store();
        let active = store.toggle_banner(BannerId::new(3)).unwrap();
        assert!(active);
        assert!(!store.toggle_banner(BannerId::new(3)).unwrap());
        assert!(store.toggle_banner(BannerId::new(99)).is_err());
    }

    #[test]
    fn test_discount_validation() {
        let mut store = store();
        let now = Utc::now();
        let new = NewDiscount {
            name: "Bad".to_string(),
            value: DiscountValue::Percentage(Decimal::from(10)),
            scope: DiscountScope::Category("garden".to_string()),
            starts_at: now,
            ends_at: None,
        };
        assert!(store.create_discount(new.clone()).is_err());

        let backwards = NewDiscount {
            scope: DiscountScope::All,
            ends_at: Some(now - Duration::days(1)),
            ..new.clone()
        };
        assert!(store.create_discount(backwards).is_err());

        let ok = NewDiscount {
            scope: DiscountScope::Category("home".to_string()),
            ..new
        };
        assert!(store.create_discount(ok).is_ok());
    }

    #[test]
    fn test_campaign_lifecycle() {
        let mut store = store();
        let now = Utc::now();
        let id = store.create_campaign(
            NewCampaign {
                name: "Restock".to_string(),
                subject: "Back in stock".to_string(),
                from: Email::parse("hello@meridian.example").unwrap(),
                segment: "All subscribers".to_string(),
                recipients: 100,
            },
            now,
        );
        assert_eq!(store.campaigns(Some(CampaignStatus::Draft)).len(), 2);

        assert!(store.schedule_campaign(id, now - Duration::hours(1), now).is_err());
        store
            .schedule_campaign(id, now + Duration::hours(1), now)
            .unwrap();
        assert_eq!(store.active_campaigns(), 2);

        store.send_campaign(id, now).unwrap();
        assert!(store.send_campaign(id, now).is_err());
        store.delete_campaign(id).unwrap();
        assert!(store.delete_campaign(id).is_err());
    }
}
