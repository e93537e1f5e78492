pub mod email;
pub mod jwt;
pub mod password;
pub mod rating;

pub use email::{HiringNotice, Notifier};
pub use jwt::JwtService;
pub use rating::{NewReview, RatingService};
