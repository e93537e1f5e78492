use mongodb::bson::oid::ObjectId;
use regex::Regex;
use validator::ValidationError;

use super::ApiError;

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let matches = Regex::new(r"^\+?[0-9][0-9 \-]{6,18}$")
        .map(|re| re.is_match(phone.trim()))
        .unwrap_or(false);

    if matches {
        Ok(())
    } else {
        Err(ValidationError::new("phone_number"))
    }
}

/// Path identifiers must be 24-character hex object ids.
pub fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("Invalid {} ID", what)))
}
