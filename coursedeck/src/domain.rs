mod coupon_code;
mod email_address;
mod role;

pub use coupon_code::CouponCode;
pub use email_address::EmailAddress;
pub use role::Role;
