use chrono::{NaiveDate, TimeZone, Utc};
use mongodb::bson::{oid::ObjectId, DateTime};
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HiringStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Cannot change hiring status from {from} to {to}")]
pub struct TransitionError {
    pub from: HiringStatus,
    pub to: HiringStatus,
}

impl HiringStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HiringStatus::Pending => "PENDING",
            HiringStatus::Approved => "APPROVED",
            HiringStatus::Rejected => "REJECTED",
            HiringStatus::Completed => "COMPLETED",
        }
    }

    /// pending → approved | rejected, approved → completed. Nothing else.
    pub fn can_transition_to(self, next: HiringStatus) -> bool {
        matches!(
            (self, next),
            (HiringStatus::Pending, HiringStatus::Approved)
                | (HiringStatus::Pending, HiringStatus::Rejected)
                | (HiringStatus::Approved, HiringStatus::Completed)
        )
    }

    pub fn transition(self, next: HiringStatus) -> Result<HiringStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError { from: self, to: next })
        }
    }
}

impl fmt::Display for HiringStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Hiring {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub employer_id: ObjectId,
    pub housekeeper_id: ObjectId,
    pub status: HiringStatus,
    #[serde(default)]
    pub requirements: String,
    pub salary_offer: f64,
    pub start_date: DateTime,
    #[serde(default)]
    pub delivery_type: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct CreateHiringDto {
    pub employer_id: String,
    pub housekeeper_id: String,
    #[serde(default)]
    pub requirements: String,
    #[validate(range(min = 0.0))]
    pub salary_offer: f64,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub start_date: String,
    #[serde(default)]
    pub delivery_type: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateHiringStatusDto {
    pub status: HiringStatus,
}

pub fn parse_start_date(raw: &str) -> Result<DateTime, String> {
    let raw = raw.trim();
    if let Ok(timestamp) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(DateTime::from_millis(timestamp.timestamp_millis()));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("Invalid start_date '{}'. Use YYYY-MM-DD", raw))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("Invalid start_date '{}'", raw))?;

    Ok(DateTime::from_millis(
        Utc.from_utc_datetime(&midnight).timestamp_millis(),
    ))
}

pub(crate) fn format_date(value: DateTime) -> String {
    chrono::DateTime::<Utc>::from_timestamp_millis(value.timestamp_millis())
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct HiringResponse {
    pub id: String,
    pub employer_id: String,
    pub housekeeper_id: String,
    pub status: HiringStatus,
    pub requirements: String,
    pub salary_offer: f64,
    pub start_date: String,
    pub delivery_type: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Hiring> for HiringResponse {
    fn from(hiring: Hiring) -> Self {
        HiringResponse {
            id: hiring.id.map(|id| id.to_hex()).unwrap_or_default(),
            employer_id: hiring.employer_id.to_hex(),
            housekeeper_id: hiring.housekeeper_id.to_hex(),
            status: hiring.status,
            requirements: hiring.requirements,
            salary_offer: hiring.salary_offer,
            start_date: format_date(hiring.start_date),
            delivery_type: hiring.delivery_type,
            created_at: super::to_rfc3339(hiring.created_at),
            updated_at: super::to_rfc3339(hiring.updated_at),
        }
    }
}
