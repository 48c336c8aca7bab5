mod coupon;
mod course;
mod enrollment;
mod payment;
mod user;

pub use coupon::{Coupon, CouponRejection, DiscountType, NewCoupon};
pub use course::{Course, CourseStatus, NewCourse};
pub use enrollment::Enrollment;
pub use payment::{NewPendingPayment, Payment, PaymentStatus};
pub use user::{NewUser, User};
