use mongodb::bson::{Document, oid::ObjectId, DateTime, doc};
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Employer {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub password: String, // bcrypt hash
    pub address: String,
    pub phone_number: String,
    pub religion_preference: Option<String>,
    pub place_of_birth_preference: Option<String>,
    pub family_size: Option<i32>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Employer {
    pub fn register(dto: RegisterEmployerDto, password_hash: String) -> Self {
        let now = DateTime::now();
        Employer {
            id: None,
            name: dto.name,
            email: dto.email,
            password: password_hash,
            address: dto.address,
            phone_number: dto.phone_number,
            religion_preference: dto.religion_preference,
            place_of_birth_preference: dto.place_of_birth_preference,
            family_size: dto.family_size,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct RegisterEmployerDto {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(custom = "crate::utils::validate_phone")]
    pub phone_number: String,
    pub religion_preference: Option<String>,
    pub place_of_birth_preference: Option<String>,
    #[validate(range(min = 1))]
    pub family_size: Option<i32>,
}

/// Profile fields an employer may change after registration.
#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
pub struct EmployerUpdate {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub address: Option<String>,
    #[validate(custom = "crate::utils::validate_phone")]
    pub phone_number: Option<String>,
    pub religion_preference: Option<String>,
    pub place_of_birth_preference: Option<String>,
    #[validate(range(min = 1))]
    pub family_size: Option<i32>,
}

impl EmployerUpdate {
    /// `$set` document for the present fields, or `None` when nothing changes.
    pub fn to_update_document(&self) -> Option<Document> {
        let mut set = Document::new();

        if let Some(ref name) = self.name {
            set.insert("name", name);
        }
        if let Some(ref address) = self.address {
            set.insert("address", address);
        }
        if let Some(ref phone) = self.phone_number {
            set.insert("phone_number", phone);
        }
        if let Some(ref religion) = self.religion_preference {
            set.insert("religion_preference", religion);
        }
        if let Some(ref place) = self.place_of_birth_preference {
            set.insert("place_of_birth_preference", place);
        }
        if let Some(size) = self.family_size {
            set.insert("family_size", size);
        }

        if set.is_empty() {
            return None;
        }
        set.insert("updated_at", DateTime::now());
        Some(doc! { "$set": set })
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct EmployerResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub address: String,
    pub phone_number: String,
    pub religion_preference: Option<String>,
    pub place_of_birth_preference: Option<String>,
    pub family_size: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Employer> for EmployerResponse {
    fn from(employer: Employer) -> Self {
        EmployerResponse {
            id: employer.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: employer.name,
            email: employer.email,
            address: employer.address,
            phone_number: employer.phone_number,
            religion_preference: employer.religion_preference,
            place_of_birth_preference: employer.place_of_birth_preference,
            family_size: employer.family_size,
            created_at: super::to_rfc3339(employer.created_at),
            updated_at: super::to_rfc3339(employer.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_update_is_rejected_as_no_op() {
        assert!(EmployerUpdate::default().to_update_document().is_none());
    }

    #[test]
    fn update_only_sets_present_fields() {
        let update = EmployerUpdate {
            address: Some("Bole, Addis Ababa".to_string()),
            family_size: Some(4),
            ..EmployerUpdate::default()
        };
        let document = update.to_update_document().unwrap();
        let set = document.get_document("$set").unwrap();

        assert_eq!(set.get_str("address").unwrap(), "Bole, Addis Ababa");
        assert_eq!(set.get_i32("family_size").unwrap(), 4);
        assert!(set.contains_key("updated_at"));
        assert!(!set.contains_key("name"));
        assert!(!set.contains_key("password"));
    }

    #[test]
    fn response_never_carries_the_password_hash() {
        let dto: RegisterEmployerDto = serde_json::from_value(serde_json::json!({
            "name": "Abebe",
            "email": "abebe@example.com",
            "password": "secret",
            "address": "Piassa",
            "phone_number": "+251911000000"
        }))
        .unwrap();
        assert!(dto.validate().is_ok());

        let employer = Employer::register(dto, "$2b$hash".to_string());
        let body = serde_json::to_value(EmployerResponse::from(employer)).unwrap();
        assert!(body.get("password").is_none());
        assert_eq!(body["email"], "abebe@example.com");
    }
}
