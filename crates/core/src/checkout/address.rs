//! Shipping address captured at checkout.

use serde::{Deserialize, Serialize};

/// Errors found while validating an [`Address`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// A required field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),
    /// The phone number has too few digits to be dialable.
    #[error("phone number must contain at least {min} digits")]
    InvalidPhone {
        /// Minimum number of digits.
        min: usize,
    },
}

/// A postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub full_name: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
}

impl Address {
    /// Minimum digits in a phone number.
    pub const MIN_PHONE_DIGITS: usize = 7;

    /// Trim every field and drop a blank second address line.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            address_line1: self.address_line1.trim().to_string(),
            address_line2: self
                .address_line2
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty()),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            country: self.country.trim().to_string(),
            phone: self.phone.trim().to_string(),
        }
    }

    /// Check that every required field is present.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, in form order.
    pub fn validate(&self) -> Result<(), AddressError> {
        let required = [
            ("Full name", &self.full_name),
            ("Address", &self.address_line1),
            ("City", &self.city),
            ("State", &self.state),
            ("Postal code", &self.postal_code),
            ("Country", &self.country),
            ("Phone", &self.phone),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(AddressError::MissingField(*field));
        }

        let digits = self.phone.chars().filter(char::is_ascii_digit).count();
        if digits < Self::MIN_PHONE_DIGITS {
            return Err(AddressError::InvalidPhone {
                min: Self::MIN_PHONE_DIGITS,
            });
        }
        Ok(())
    }

    /// Single-line summary, e.g. for the review step.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.address_line1.as_str()];
        if let Some(line2) = self.address_line2.as_deref() {
            parts.push(line2);
        }
        format!(
            "{}, {}, {} {}, {}",
            parts.join(" "),
            self.city,
            self.state,
            self.postal_code,
            self.country
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn valid() -> Address {
        Address {
            full_name: "Ada Lovelace".to_string(),
            address_line1: "12 Analytical Row".to_string(),
            address_line2: None,
            city: "Portland".to_string(),
            state: "OR".to_string(),
            postal_code: "97201".to_string(),
            country: "US".to_string(),
            phone: "(503) 555-0199".to_string(),
        }
    }

    #[test]
    fn test_valid_address() {
        assert_eq!(valid().validate(), Ok(()));
    }

    #[test]
    fn test_missing_field() {
        let mut address = valid();
        address.city = "   ".to_string();
        assert_eq!(address.validate(), Err(AddressError::MissingField("City")));
    }

    #[test]
    fn test_short_phone() {
        let mut address = valid();
        address.phone = "555-01".to_string();
        assert_eq!(
            address.validate(),
            Err(AddressError::InvalidPhone { min: 7 })
        );
    }

    #[test]
    fn test_normalized_drops_blank_line2() {
        let mut address = valid();
        address.full_name = "  Ada Lovelace ".to_string();
        address.address_line2 = Some("  ".to_string());
        let address = address.normalized();
        assert_eq!(address.full_name, "Ada Lovelace");
        assert_eq!(address.address_line2, None);
        assert_eq!(
            address.one_line(),
            "12 Analytical Row, Portland, OR 97201, US"
        );
    }
}
