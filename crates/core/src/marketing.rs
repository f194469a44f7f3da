//! Marketing entities: banners, coupons, automatic discounts and email campaigns.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{
    BannerId, CampaignId, CampaignStatus, CouponId, DiscountId, Email, Price,
};

/// How much a coupon or discount takes off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DiscountValue {
    /// Whole-number percentage of the subtotal, e.g. `15` for 15%.
    Percentage(Decimal),
    /// Fixed amount off the subtotal.
    FixedAmount(Price),
}

/// Errors validating a [`DiscountValue`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscountValueError {
    #[error("percentage must be between 0 and 100")]
    PercentageOutOfRange,
    #[error("discount value must be a number")]
    NotANumber,
    #[error("unknown discount type: {0}")]
    UnknownType(String),
}

impl DiscountValue {
    /// Build a value from admin form input (`percentage` or `fixed_amount`).
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown type, a non-numeric value, or a
    /// percentage outside `(0, 100]`.
    pub fn parse(kind: &str, value: &str) -> Result<Self, DiscountValueError> {
        match kind {
            "percentage" => {
                let pct: Decimal = value
                    .trim()
                    .trim_end_matches('%')
                    .parse()
                    .map_err(|_| DiscountValueError::NotANumber)?;
                if pct <= Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
                    return Err(DiscountValueError::PercentageOutOfRange);
                }
                Ok(Self::Percentage(pct))
            }
            "fixed_amount" => Price::parse(value)
                .map(Self::FixedAmount)
                .map_err(|_| DiscountValueError::NotANumber),
            other => Err(DiscountValueError::UnknownType(other.to_string())),
        }
    }

    /// The amount this value takes off `subtotal`, never more than the subtotal.
    #[must_use]
    pub fn amount_off(&self, subtotal: Price) -> Price {
        let off = match self {
            Self::Percentage(pct) => subtotal
                .scale(*pct / Decimal::ONE_HUNDRED)
                .round_to_cents(),
            Self::FixedAmount(amount) => *amount,
        };
        off.min(subtotal)
    }

    /// Short description, e.g. `15% off` or `$10.00 off`.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Percentage(pct) => format!("{}% off", pct.normalize()),
            Self::FixedAmount(amount) => format!("{} off", amount.display()),
        }
    }

    /// Form type value.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Percentage(_) => "percentage",
            Self::FixedAmount(_) => "fixed_amount",
        }
    }
}

/// A promotional banner shown on the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub image: String,
    pub link: String,
    /// Where the banner renders, e.g. `hero` or `announcement`.
    pub placement: String,
    pub active: bool,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

impl Banner {
    /// Whether the banner should render at `now`.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.active
            && self.starts_at.is_none_or(|start| start <= now)
            && self.ends_at.is_none_or(|end| now < end)
    }
}

/// Reasons a coupon cannot be applied.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CouponError {
    #[error("coupon code not recognised")]
    NotFound,
    #[error("this coupon is no longer active")]
    Inactive,
    #[error("this coupon has expired")]
    Expired,
    #[error("this coupon has reached its usage limit")]
    UsageLimitReached,
    #[error("spend at least {minimum} to use this coupon")]
    BelowMinimum {
        /// Formatted minimum subtotal.
        minimum: String,
    },
}

/// A code visitors type in to get money off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
    /// Upper-case code.
    pub code: String,
    pub description: String,
    pub value: DiscountValue,
    #[serde(default)]
    pub min_subtotal: Option<Price>,
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub usage_count: u32,
    pub active: bool,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Coupon {
    /// Normalise a code as typed by a visitor.
    #[must_use]
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_uppercase()
    }

    /// Check the coupon against `subtotal` at `now` and return the amount off.
    ///
    /// # Errors
    ///
    /// Returns why the coupon cannot be used.
    pub fn discount_for(&self, subtotal: Price, now: DateTime<Utc>) -> Result<Price, CouponError> {
        if !self.active {
            return Err(CouponError::Inactive);
        }
        if self.expires_at.is_some_and(|expires| expires <= now) {
            return Err(CouponError::Expired);
        }
        if self.usage_limit.is_some_and(|limit| self.usage_count >= limit) {
            return Err(CouponError::UsageLimitReached);
        }
        if let Some(minimum) = self.min_subtotal
            && subtotal < minimum
        {
            return Err(CouponError::BelowMinimum {
                minimum: minimum.display(),
            });
        }
        Ok(self.value.amount_off(subtotal))
    }

    /// Usage summary, e.g. `12/100 uses`.
    #[must_use]
    pub fn usage(&self) -> String {
        self.usage_limit.map_or_else(
            || format!("{} uses", self.usage_count),
            |limit| format!("{}/{} uses", self.usage_count, limit),
        )
    }
}

/// Find a coupon by code, case-insensitively.
///
/// # Errors
///
/// Returns `CouponError::NotFound` if no coupon has this code.
pub fn find_coupon<'a>(coupons: &'a [Coupon], code: &str) -> Result<&'a Coupon, CouponError> {
    let code = Coupon::normalize_code(code);
    coupons
        .iter()
        .find(|coupon| coupon.code == code)
        .ok_or(CouponError::NotFound)
}

/// Count one redemption of the coupon with `code`.
///
/// # Errors
///
/// Returns `NotFound` if no coupon has this code.
pub fn record_redemption(coupons: &mut [Coupon], code: &str) -> Result<u32, CouponError> {
    let code = Coupon::normalize_code(code);
    let coupon = coupons
        .iter_mut()
        .find(|coupon| coupon.code == code)
        .ok_or(CouponError::NotFound)?;
    coupon.usage_count = coupon.usage_count.saturating_add(1);
    Ok(coupon.usage_count)
}

/// Which products an automatic discount covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DiscountScope {
    /// Every product.
    All,
    /// Products in one category slug.
    Category(String),
}

impl DiscountScope {
    /// Short description for listings.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::All => "All products".to_string(),
            Self::Category(slug) => format!("Category: {slug}"),
        }
    }
}

/// A store-wide or category promotion applied without a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub id: DiscountId,
    pub name: String,
    pub value: DiscountValue,
    pub scope: DiscountScope,
    pub active: bool,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

impl Discount {
    /// Scheduling state at `now`: `Scheduled`, `Active`, `Expired` or `Paused`.
    #[must_use]
    pub fn state(&self, now: DateTime<Utc>) -> &'static str {
        if !self.active {
            "Paused"
        } else if now < self.starts_at {
            "Scheduled"
        } else if self.ends_at.is_some_and(|end| end <= now) {
            "Expired"
        } else {
            "Active"
        }
    }
}

/// Errors moving a campaign between states.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CampaignError {
    #[error("cannot {action} a campaign that is {status}")]
    InvalidTransition {
        /// Attempted action.
        action: &'static str,
        /// Current status.
        status: CampaignStatus,
    },
    #[error("scheduled time must be in the future")]
    ScheduleInPast,
}

/// An email campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailCampaign {
    pub id: CampaignId,
    pub name: String,
    pub subject: String,
    pub from: Email,
    /// Audience segment name.
    pub segment: String,
    pub status: CampaignStatus,
    /// Recipients in the segment (mock count).
    pub recipients: u32,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    /// Share of recipients that opened, 0.0 to 1.0, once sent.
    #[serde(default)]
    pub open_rate: Option<f32>,
    pub created_at: DateTime<Utc>,
}

impl EmailCampaign {
    /// Schedule a draft for `at`.
    ///
    /// # Errors
    ///
    /// Fails unless the campaign is a draft and `at` is after `now`.
    pub fn schedule(&mut self, at: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), CampaignError> {
        if self.status != CampaignStatus::Draft {
            return Err(CampaignError::InvalidTransition {
                action: "schedule",
                status: self.status,
            });
        }
        if at <= now {
            return Err(CampaignError::ScheduleInPast);
        }
        self.status = CampaignStatus::Scheduled;
        self.scheduled_at = Some(at);
        Ok(())
    }

    /// Mark the campaign sent. Nothing is delivered.
    ///
    /// # Errors
    ///
    /// Fails if the campaign was already sent.
    pub fn mark_sent(&mut self, now: DateTime<Utc>) -> Result<(), CampaignError> {
        if self.status == CampaignStatus::Sent {
            return Err(CampaignError::InvalidTransition {
                action: "send",
                status: self.status,
            });
        }
        self.status = CampaignStatus::Sent;
        self.sent_at = Some(now);
        Ok(())
    }
}
