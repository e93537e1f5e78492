use mongodb::bson::{Document, oid::ObjectId, DateTime, doc};
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    #[serde(alias = "GENERAL")]
    Normal,
    ChildCare,
    #[serde(alias = "CLEANER")]
    Cleaning,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Normal => "NORMAL",
            Category::ChildCare => "CHILD_CARE",
            Category::Cleaning => "CLEANING",
        }
    }

    /// Every spelling a stored document may carry for this category.
    pub fn stored_spellings(&self) -> &'static [&'static str] {
        match self {
            Category::Normal => &["NORMAL", "GENERAL"],
            Category::ChildCare => &["CHILD_CARE"],
            Category::Cleaning => &["CLEANING", "CLEANER"],
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "NORMAL" | "GENERAL" => Ok(Category::Normal),
            "CHILD_CARE" => Ok(Category::ChildCare),
            "CLEANING" | "CLEANER" => Ok(Category::Cleaning),
            other => Err(format!(
                "Invalid category '{}'. Expected NORMAL, CHILD_CARE or CLEANING",
                other
            )),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentType {
    LiveIn,
    LiveOut,
}

impl EmploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::LiveIn => "LIVE_IN",
            EmploymentType::LiveOut => "LIVE_OUT",
        }
    }
}

impl FromStr for EmploymentType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "LIVE_IN" => Ok(EmploymentType::LiveIn),
            "LIVE_OUT" => Ok(EmploymentType::LiveOut),
            other => Err(format!(
                "Invalid employment type '{}'. Expected LIVE_IN or LIVE_OUT",
                other
            )),
        }
    }
}

impl fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn available_by_default() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Housekeeper {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub password: String, // bcrypt hash
    pub age: i32,
    #[serde(default)]
    pub experience: i32,
    pub category: Category,
    pub employment_type: EmploymentType,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    pub photo_url: Option<String>,
    pub religion: Option<String>,
    pub place_of_birth: Option<String>,
    pub location: String,
    pub phone_number: String,
    // Mean of the housekeeper's reviews; written only by the rating aggregator.
    #[serde(default)]
    pub rating: f64,
    #[serde(default = "available_by_default")]
    pub is_available: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Housekeeper {
    /// New profile from a registration body. Rating and availability always
    /// start at their defaults whatever the client sent.
    pub fn register(dto: RegisterHousekeeperDto, password_hash: String) -> Self {
        let now = DateTime::now();
        Housekeeper {
            id: None,
            name: dto.name,
            email: dto.email,
            password: password_hash,
            age: dto.age,
            experience: dto.experience.unwrap_or(0),
            category: dto.category,
            employment_type: dto.employment_type,
            skills: dto.skills,
            certifications: dto.certifications,
            photo_url: dto.photo_url,
            religion: dto.religion,
            place_of_birth: dto.place_of_birth,
            location: dto.location,
            phone_number: dto.phone_number,
            rating: 0.0,
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct RegisterHousekeeperDto {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[validate(range(min = 1, max = 120))]
    pub age: i32,
    #[validate(range(min = 0))]
    pub experience: Option<i32>,
    pub category: Category,
    pub employment_type: EmploymentType,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[validate(url)]
    pub photo_url: Option<String>,
    pub religion: Option<String>,
    pub place_of_birth: Option<String>,
    #[validate(length(min = 1))]
    pub location: String,
    #[validate(custom = "crate::utils::validate_phone")]
    pub phone_number: String,
}

/// Profile fields that may change after registration. `rating` is derived
/// data and has no field here.
#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
pub struct HousekeeperUpdate {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(range(min = 1, max = 120))]
    pub age: Option<i32>,
    #[validate(range(min = 0))]
    pub experience: Option<i32>,
    pub category: Option<Category>,
    pub employment_type: Option<EmploymentType>,
    pub skills: Option<Vec<String>>,
    pub certifications: Option<Vec<String>>,
    #[validate(url)]
    pub photo_url: Option<String>,
    pub religion: Option<String>,
    pub place_of_birth: Option<String>,
    #[validate(length(min = 1))]
    pub location: Option<String>,
    #[validate(custom = "crate::utils::validate_phone")]
    pub phone_number: Option<String>,
    pub is_available: Option<bool>,
}

impl HousekeeperUpdate {
    /// `$set` document for the present fields, or `None` when nothing changes.
    pub fn to_update_document(&self) -> Option<Document> {
        let mut set = Document::new();

        if let Some(ref name) = self.name {
            set.insert("name", name);
        }
        if let Some(age) = self.age {
            set.insert("age", age);
        }
        if let Some(experience) = self.experience {
            set.insert("experience", experience);
        }
        if let Some(category) = self.category {
            set.insert("category", category.as_str());
        }
        if let Some(employment_type) = self.employment_type {
            set.insert("employment_type", employment_type.as_str());
        }
        if let Some(ref skills) = self.skills {
            set.insert("skills", skills.clone());
        }
        if let Some(ref certifications) = self.certifications {
            set.insert("certifications", certifications.clone());
        }
        if let Some(ref photo_url) = self.photo_url {
            set.insert("photo_url", photo_url);
        }
        if let Some(ref religion) = self.religion {
            set.insert("religion", religion);
        }
        if let Some(ref place) = self.place_of_birth {
            set.insert("place_of_birth", place);
        }
        if let Some(ref location) = self.location {
            set.insert("location", location);
        }
        if let Some(ref phone) = self.phone_number {
            set.insert("phone_number", phone);
        }
        if let Some(available) = self.is_available {
            set.insert("is_available", available);
        }

        if set.is_empty() {
            return None;
        }
        set.insert("updated_at", DateTime::now());
        Some(doc! { "$set": set })
    }
}

#[derive(Debug, FromForm, Deserialize, JsonSchema)]
pub struct HousekeeperQuery {
    pub category: Option<String>,
    pub employment_type: Option<String>,
    pub location: Option<String>,
}

/// Listing filter. Only available housekeepers are ever listed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct HousekeeperFilter {
    pub category: Option<Category>,
    pub employment_type: Option<EmploymentType>,
    pub location: Option<String>,
}

impl HousekeeperFilter {
    pub fn to_document(&self) -> Document {
        let mut filter = doc! { "is_available": true };

        if let Some(category) = self.category {
            filter.insert("category", doc! { "$in": category.stored_spellings() });
        }
        if let Some(employment_type) = self.employment_type {
            filter.insert("employment_type", employment_type.as_str());
        }
        if let Some(ref location) = self.location {
            filter.insert("location", location);
        }

        filter
    }

    pub fn sort_document() -> Document {
        doc! { "rating": -1 }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<HousekeeperQuery> for HousekeeperFilter {
    type Error = String;

    fn try_from(query: HousekeeperQuery) -> Result<Self, Self::Error> {
        Ok(HousekeeperFilter {
            category: non_empty(query.category)
                .map(|c| c.parse())
                .transpose()?,
            employment_type: non_empty(query.employment_type)
                .map(|e| e.parse())
                .transpose()?,
            location: non_empty(query.location),
        })
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct HousekeeperResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub experience: i32,
    pub category: Category,
    pub employment_type: EmploymentType,
    pub skills: Vec<String>,
    pub certifications: Vec<String>,
    pub photo_url: Option<String>,
    pub religion: Option<String>,
    pub place_of_birth: Option<String>,
    pub location: String,
    pub phone_number: String,
    pub rating: f64,
    pub is_available: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Housekeeper> for HousekeeperResponse {
    fn from(housekeeper: Housekeeper) -> Self {
        HousekeeperResponse {
            id: housekeeper.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: housekeeper.name,
            email: housekeeper.email,
            age: housekeeper.age,
            experience: housekeeper.experience,
            category: housekeeper.category,
            employment_type: housekeeper.employment_type,
            skills: housekeeper.skills,
            certifications: housekeeper.certifications,
            photo_url: housekeeper.photo_url,
            religion: housekeeper.religion,
            place_of_birth: housekeeper.place_of_birth,
            location: housekeeper.location,
            phone_number: housekeeper.phone_number,
            rating: housekeeper.rating,
            is_available: housekeeper.is_available,
            created_at: super::to_rfc3339(housekeeper.created_at),
            updated_at: super::to_rfc3339(housekeeper.updated_at),
        }
    }
}
