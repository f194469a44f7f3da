//! Payment method selection.
//!
//! Nothing is charged or tokenised. For card payments only the last four
//! digits and the cardholder name are kept; the full number is discarded as
//! soon as the last four are extracted.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors found while building a [`PaymentMethod`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// The payment type is not offered.
    #[error("unknown payment type: {0}")]
    UnknownType(String),
    /// The card number is not 12 to 19 digits.
    #[error("card number must be 12 to 19 digits")]
    InvalidCardNumber,
    /// No cardholder name was given for a card payment.
    #[error("cardholder name is required")]
    MissingCardholderName,
}

/// Kind of payment, as chosen on the payment step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentKind {
    CreditCard,
    DebitCard,
    Paypal,
    ApplePay,
    GooglePay,
}

impl PaymentKind {
    /// All payment kinds, in the order they are offered.
    pub const ALL: &'static [Self] = &[
        Self::CreditCard,
        Self::DebitCard,
        Self::Paypal,
        Self::ApplePay,
        Self::GooglePay,
    ];

    /// Form value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreditCard => "credit-card",
            Self::DebitCard => "debit-card",
            Self::Paypal => "paypal",
            Self::ApplePay => "apple-pay",
            Self::GooglePay => "google-pay",
        }
    }

    /// Display name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CreditCard => "Credit Card",
            Self::DebitCard => "Debit Card",
            Self::Paypal => "PayPal",
            Self::ApplePay => "Apple Pay",
            Self::GooglePay => "Google Pay",
        }
    }

    /// Whether this kind needs card details.
    #[must_use]
    pub const fn is_card(self) -> bool {
        matches!(self, Self::CreditCard | Self::DebitCard)
    }
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentKind {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| PaymentError::UnknownType(s.to_string()))
    }
}

/// A chosen payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PaymentMethod {
    CreditCard {
        last_four: String,
        cardholder_name: String,
    },
    DebitCard {
        last_four: String,
        cardholder_name: String,
    },
    Paypal,
    ApplePay,
    GooglePay,
}

impl PaymentMethod {
    /// Build a payment method from the payment form.
    ///
    /// `card_number` and `cardholder_name` are only read for card kinds.
    /// Spaces and dashes in the card number are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error for card kinds with a malformed number or no name.
    pub fn new(
        kind: PaymentKind,
        card_number: Option<&str>,
        cardholder_name: Option<&str>,
    ) -> Result<Self, PaymentError> {
        if !kind.is_card() {
            return Ok(match kind {
                PaymentKind::Paypal => Self::Paypal,
                PaymentKind::ApplePay => Self::ApplePay,
                _ => Self::GooglePay,
            });
        }

        let digits: String = card_number
            .unwrap_or_default()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-'))
            .collect();
        if !(12..=19).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(PaymentError::InvalidCardNumber);
        }
        let last_four = digits
            .get(digits.len() - 4..)
            .ok_or(PaymentError::InvalidCardNumber)?
            .to_string();

        let cardholder_name = cardholder_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(PaymentError::MissingCardholderName)?
            .to_string();

        Ok(if kind == PaymentKind::CreditCard {
            Self::CreditCard {
                last_four,
                cardholder_name,
            }
        } else {
            Self::DebitCard {
                last_four,
                cardholder_name,
            }
        })
    }

    /// The kind of this method.
    #[must_use]
    pub const fn kind(&self) -> PaymentKind {
        match self {
            Self::CreditCard { .. } => PaymentKind::CreditCard,
            Self::DebitCard { .. } => PaymentKind::DebitCard,
            Self::Paypal => PaymentKind::Paypal,
            Self::ApplePay => PaymentKind::ApplePay,
            Self::GooglePay => PaymentKind::GooglePay,
        }
    }

    /// Summary for the review step, e.g. `Credit Card ending in 4242`.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::CreditCard { last_four, .. } | Self::DebitCard { last_four, .. } => {
                format!("{} ending in {last_four}", self.kind().label())
            }
            _ => self.kind().label().to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_card_keeps_only_last_four() {
        let method = PaymentMethod::new(
            PaymentKind::CreditCard,
            Some("4242 4242-4242 4242"),
            Some(" Ada Lovelace "),
        )
        .unwrap();
        assert_eq!(
            method,
            PaymentMethod::CreditCard {
                last_four: "4242".to_string(),
                cardholder_name: "Ada Lovelace".to_string(),
            }
        );
        assert_eq!(method.summary(), "Credit Card ending in 4242");
    }

    #[test]
    fn test_card_validation() {
        assert_eq!(
            PaymentMethod::new(PaymentKind::DebitCard, Some("1234"), Some("A")),
            Err(PaymentError::InvalidCardNumber)
        );
        assert_eq!(
            PaymentMethod::new(PaymentKind::DebitCard, Some("4000 0000 0000 0002"), None),
            Err(PaymentError::MissingCardholderName)
        );
    }

    #[test]
    fn test_wallets_need_no_details() {
        let method = PaymentMethod::new(PaymentKind::ApplePay, None, None).unwrap();
        assert_eq!(method, PaymentMethod::ApplePay);
        assert_eq!(method.summary(), "Apple Pay");
    }

    #[test]
    fn test_serde_tag() {
        let json = serde_json::to_value(PaymentMethod::GooglePay).unwrap();
        assert_eq!(json["type"], "google-pay");
        let card: PaymentMethod = serde_json::from_str(
            r#"{"type":"debit-card","last_four":"0002","cardholder_name":"Ada"}"#,
        )
        .unwrap();
        assert_eq!(card.kind(), PaymentKind::DebitCard);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("paypal".parse::<PaymentKind>(), Ok(PaymentKind::Paypal));
        assert_eq!(
            "cash".parse::<PaymentKind>(),
            Err(PaymentError::UnknownType("cash".to_string()))
        );
    }
}
