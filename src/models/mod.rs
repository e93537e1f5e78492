pub mod auth;
pub mod employer;
pub mod hiring;
pub mod housekeeper;
pub mod review;

pub use auth::*;
pub use employer::*;
pub use hiring::*;
pub use housekeeper::*;
pub use review::*;

use mongodb::bson::DateTime;

/// Renders a stored timestamp for JSON responses.
pub(crate) fn to_rfc3339(value: DateTime) -> String {
    value.try_to_rfc3339_string().unwrap_or_default()
}
