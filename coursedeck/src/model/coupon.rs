use chrono::{DateTime, Utc};

use rust_decimal::Decimal;

use serde::{Deserialize, Serialize};

use uuid::Uuid;

use crate::domain::CouponCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

/// Why a coupon cannot be applied. The first failing check wins; no
/// partial discount is ever reported.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CouponRejection {
    #[error("Invalid coupon code")]
    InvalidCode,
    #[error("Coupon is not active")]
    Inactive,
    #[error("Coupon is not yet valid")]
    NotYetValid,
    #[error("Coupon has expired")]
    Expired,
    #[error("Coupon usage limit reached")]
    UsageLimitReached,
    #[error("Minimum purchase amount is {0}")]
    BelowMinimum(Decimal),
    #[error("Coupon is not valid for this course")]
    NotValidForCourse,
}

impl CouponRejection {
    /// Stable machine-readable code for API envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCode => "INVALID_CODE",
            Self::Inactive => "INACTIVE",
            Self::NotYetValid => "NOT_YET_VALID",
            Self::Expired => "EXPIRED",
            Self::UsageLimitReached => "USAGE_LIMIT_REACHED",
            Self::BelowMinimum(_) => "BELOW_MINIMUM",
            Self::NotValidForCourse => "NOT_VALID_FOR_COURSE",
        }
    }
}

/// Stored coupon record, along with the ids of the courses it is
/// restricted to (empty means valid for all courses).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub max_uses: Option<i32>,
    pub max_uses_per_user: Option<i32>,
    pub min_purchase_amount: Option<Decimal>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
    pub current_uses: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub course_ids: Vec<Uuid>,
}

impl Coupon {
    /// Decide whether this coupon applies to a purchase of `amount` for
    /// `course_id` at `now`, and compute the discount if it does.
    ///
    /// Advisory only: usage is not reserved here. The authoritative
    /// usage-limit enforcement is the conditional increment inside the
    /// entitlement writer's transaction.
    pub fn evaluate(
        &self,
        course_id: Uuid,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Decimal, CouponRejection> {
        if !self.is_active {
            return Err(CouponRejection::Inactive);
        }
        if self.valid_from > now {
            return Err(CouponRejection::NotYetValid);
        }
        if let Some(valid_until) = self.valid_until {
            if valid_until < now {
                return Err(CouponRejection::Expired);
            }
        }
        if let Some(max_uses) = self.max_uses {
            if self.current_uses >= max_uses {
                return Err(CouponRejection::UsageLimitReached);
            }
        }
        if let Some(minimum) = self.min_purchase_amount {
            if amount < minimum {
                return Err(CouponRejection::BelowMinimum(minimum));
            }
        }
        if !self.course_ids.is_empty() && !self.course_ids.contains(&course_id) {
            return Err(CouponRejection::NotValidForCourse);
        }

        Ok(self.discount(amount))
    }

    /// PERCENTAGE discounts round to cents; FIXED discounts never exceed
    /// the purchase amount.
    fn discount(&self, amount: Decimal) -> Decimal {
        match self.discount_type {
            DiscountType::Percentage => {
                (amount * self.discount_value / Decimal::ONE_HUNDRED).round_dp(2)
            }
            DiscountType::Fixed => self.discount_value.min(amount),
        }
    }
}

/// Payload for creating a coupon from the back office.
#[derive(Debug, Deserialize)]
pub struct NewCoupon {
    pub code: CouponCode,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub max_uses: Option<i32>,
    pub max_uses_per_user: Option<i32>,
    pub min_purchase_amount: Option<Decimal>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub course_ids: Vec<Uuid>,
}
