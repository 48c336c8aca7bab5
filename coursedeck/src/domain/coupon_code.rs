use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MIN_LEN: usize = 3;
const MAX_LEN: usize = 20;

/// A coupon code, normalized to uppercase on parse.
/// Lookups are therefore case-insensitive from the caller's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CouponCode(String);

impl AsRef<str> for CouponCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CouponCode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim().to_uppercase();

        if value.len() < MIN_LEN {
            return Err(Error::ParsingError("Coupon code too short".into()));
        }
        if value.len() > MAX_LEN {
            return Err(Error::ParsingError("Coupon code too long".into()));
        }
        if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(Error::ParsingError(
                "Coupon code contains invalid characters".into(),
            ));
        }
        Ok(Self(value))
    }
}

impl TryFrom<String> for CouponCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CouponCode> for String {
    fn from(value: CouponCode) -> Self {
        value.0
    }
}
