mod coupons;
mod courses;
mod enrollments;
mod payments;
mod users;

pub use coupons::CouponsRepo;
pub use courses::CoursesRepo;
pub use enrollments::EnrollmentsRepo;
pub use payments::PaymentsRepo;
pub use users::{UserCredentials, UsersRepo};
