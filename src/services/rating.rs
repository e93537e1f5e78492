//! Maintains each housekeeper's `rating` as the mean of their reviews.
//!
//! A submission inserts the review, recomputes the mean over every review of
//! the same housekeeper and writes it back, all inside one store unit. Any
//! failure after the unit begins aborts it, so a review never becomes visible
//! without the matching rating update.

use log::{error, warn};
use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime};
use mongodb::options::{Acknowledgment, ReadConcern, TransactionOptions, WriteConcern};
use mongodb::{ClientSession, Collection};
use rocket::fairing::AdHoc;
use std::fmt;
use thiserror::Error;

use crate::db::Db;
use crate::models::{Housekeeper, Review, MAX_RATING, MIN_RATING};
use crate::utils::ApiError;

#[derive(Debug, Error)]
#[error("{step} failed: {message}")]
pub struct StoreError {
    pub step: &'static str,
    message: String,
}

impl StoreError {
    pub fn new(step: &'static str, err: impl fmt::Display) -> Self {
        StoreError {
            step,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RatingError {
    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(f64),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<RatingError> for ApiError {
    fn from(err: RatingError) -> Self {
        match err {
            RatingError::InvalidRating(_) => ApiError::bad_request(err.to_string()),
            RatingError::Store(e) => ApiError::storage("Failed to submit review", e),
        }
    }
}

/// One atomic unit of work. Nothing written through it is visible to other
/// readers until `commit`.
#[rocket::async_trait]
pub trait ReviewUnit: Send {
    async fn insert_review(&mut self, review: &Review) -> Result<ObjectId, StoreError>;

    /// Mean `rating` over every review of the housekeeper, including writes
    /// made earlier in this unit. `None` when there are no reviews.
    async fn average_rating(&mut self, housekeeper_id: ObjectId) -> Result<Option<f64>, StoreError>;

    async fn set_rating(&mut self, housekeeper_id: ObjectId, rating: f64) -> Result<(), StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;

    async fn abort(&mut self) -> Result<(), StoreError>;
}

#[rocket::async_trait]
pub trait ReviewStore: Send + Sync {
    type Unit: ReviewUnit;

    async fn begin(&self) -> Result<Self::Unit, StoreError>;
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub employer_id: ObjectId,
    pub housekeeper_id: ObjectId,
    pub rating: f64,
    pub comment: Option<String>,
}

pub fn validate_rating(rating: f64) -> Result<(), RatingError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(RatingError::InvalidRating(rating))
    }
}

pub struct RatingAggregator<S> {
    store: S,
}

/// The aggregator as managed by Rocket.
pub type RatingService = RatingAggregator<MongoReviewStore>;

impl<S: ReviewStore> RatingAggregator<S> {
    pub fn new(store: S) -> Self {
        RatingAggregator { store }
    }

    /// Records the review and refreshes the housekeeper's rating atomically.
    /// Out-of-range ratings are refused before the store is touched.
    pub async fn submit_review(&self, new_review: NewReview) -> Result<ObjectId, RatingError> {
        validate_rating(new_review.rating)?;

        let review = Review {
            id: None,
            employer_id: new_review.employer_id,
            housekeeper_id: new_review.housekeeper_id,
            rating: new_review.rating,
            comment: new_review.comment,
            created_at: DateTime::now(),
        };

        let mut unit = self.store.begin().await?;
        match record(&mut unit, &review).await {
            Ok(review_id) => {
                unit.commit().await?;
                Ok(review_id)
            }
            Err(e) => {
                if let Err(abort_err) = unit.abort().await {
                    warn!("Aborting review unit after '{}' also failed: {}", e, abort_err);
                }
                Err(e.into())
            }
        }
    }
}

async fn record<U: ReviewUnit>(unit: &mut U, review: &Review) -> Result<ObjectId, StoreError> {
    let review_id = unit.insert_review(review).await?;

    // The review just inserted always matches, so `None` cannot normally
    // happen; it leaves the rating untouched.
    if let Some(mean) = unit.average_rating(review.housekeeper_id).await? {
        unit.set_rating(review.housekeeper_id, mean).await?;
    }

    Ok(review_id)
}

/* ----------------------------- MongoDB ----------------------------- */

/// Runs each unit as a multi-document transaction. Requires a replica set
/// or sharded cluster.
pub struct MongoReviewStore {
    db: Db,
}

impl MongoReviewStore {
    pub fn new(db: Db) -> Self {
        MongoReviewStore { db }
    }
}

pub struct MongoReviewUnit {
    session: ClientSession,
    reviews: Collection<Review>,
    housekeepers: Collection<Housekeeper>,
}

#[rocket::async_trait]
impl ReviewStore for MongoReviewStore {
    type Unit = MongoReviewUnit;

    async fn begin(&self) -> Result<MongoReviewUnit, StoreError> {
        let mut session = self
            .db
            .client()
            .start_session(None)
            .await
            .map_err(|e| StoreError::new("start session", e))?;

        let options = TransactionOptions::builder()
            .read_concern(ReadConcern::snapshot())
            .write_concern(WriteConcern::builder().w(Acknowledgment::Majority).build())
            .build();
        session
            .start_transaction(options)
            .await
            .map_err(|e| StoreError::new("start transaction", e))?;

        Ok(MongoReviewUnit {
            session,
            reviews: self.db.reviews(),
            housekeepers: self.db.housekeepers(),
        })
    }
}

#[rocket::async_trait]
impl ReviewUnit for MongoReviewUnit {
    async fn insert_review(&mut self, review: &Review) -> Result<ObjectId, StoreError> {
        let result = self
            .reviews
            .insert_one_with_session(review, None, &mut self.session)
            .await
            .map_err(|e| StoreError::new("insert review", e))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| StoreError::new("insert review", "inserted id is not an ObjectId"))
    }

    async fn average_rating(&mut self, housekeeper_id: ObjectId) -> Result<Option<f64>, StoreError> {
        let pipeline = vec![
            doc! { "$match": { "housekeeper_id": housekeeper_id } },
            doc! { "$group": { "_id": Bson::Null, "average_rating": { "$avg": "$rating" } } },
        ];

        let mut cursor = self
            .reviews
            .aggregate_with_session(pipeline, None, &mut self.session)
            .await
            .map_err(|e| StoreError::new("average rating", e))?;

        match cursor.next(&mut self.session).await {
            Some(Ok(group)) => Ok(group.get("average_rating").and_then(Bson::as_f64)),
            Some(Err(e)) => Err(StoreError::new("average rating", e)),
            None => Ok(None),
        }
    }

    async fn set_rating(&mut self, housekeeper_id: ObjectId, rating: f64) -> Result<(), StoreError> {
        self.housekeepers
            .update_one_with_session(
                doc! { "_id": housekeeper_id },
                doc! { "$set": { "rating": rating } },
                None,
                &mut self.session,
            )
            .await
            .map_err(|e| StoreError::new("update housekeeper rating", e))?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.session
            .commit_transaction()
            .await
            .map_err(|e| StoreError::new("commit transaction", e))
    }

    async fn abort(&mut self) -> Result<(), StoreError> {
        self.session
            .abort_transaction()
            .await
            .map_err(|e| StoreError::new("abort transaction", e))
    }
}

pub fn init() -> AdHoc {
    AdHoc::try_on_ignite("Rating aggregator", |rocket| async move {
        let db = rocket.state::<Db>().cloned();
        match db {
            Some(db) => Ok(rocket.manage(RatingAggregator::new(MongoReviewStore::new(db)))),
            None => {
                error!("✗ Rating aggregator needs the MongoDB handle");
                Err(rocket)
            }
        }
    })
}
