#[macro_use]
extern crate rocket;

mod config;
mod db;
mod guards;
mod models;
mod routes;
mod services;
mod utils;

use dotenvy::dotenv;
use rocket::fairing::{AdHoc, Fairing, Info, Kind};
use rocket::http::Header;
use rocket::serde::json::Json;
use rocket::{Build, Request, Response, Rocket};
use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::{SwaggerUIConfig, make_swagger_ui};

use crate::config::AppConfig;
use crate::services::JwtService;
use crate::utils::{ErrorBody, GuardFailure};

/* ----------------------------- CORS ----------------------------- */

pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        if let Some(origin) = request.headers().get_one("Origin") {
            response.set_header(Header::new("Access-Control-Allow-Origin", origin));
        }

        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, OPTIONS",
        ));

        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization",
        ));

        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

/* ----------------------------- OPTIONS ----------------------------- */

#[options("/<_..>")]
fn options_handler() {}

/* ----------------------------- ERRORS ----------------------------- */

#[catch(400)]
fn bad_request(req: &Request) -> Json<ErrorBody> {
    Json(ErrorBody::new(GuardFailure::message(req, "Bad request")))
}

#[catch(401)]
fn unauthorized(req: &Request) -> Json<ErrorBody> {
    Json(ErrorBody::new(GuardFailure::message(req, "Unauthorized")))
}

#[catch(404)]
fn not_found() -> Json<ErrorBody> {
    Json(ErrorBody::new("Resource not found (check /api/v1 prefix)"))
}

#[catch(422)]
fn unprocessable(req: &Request) -> Json<ErrorBody> {
    Json(ErrorBody::new(GuardFailure::message(req, "Invalid request")))
}

#[catch(500)]
fn internal_error() -> Json<ErrorBody> {
    Json(ErrorBody::new("Internal server error"))
}

/* ----------------------------- SWAGGER ----------------------------- */

fn swagger_config() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/api/v1/openapi.json".to_string(),
        ..Default::default()
    }
}

/* ----------------------------- ROUTES ----------------------------- */

/// Mounts every route and catcher. Collaborators are expected in managed
/// state already.
fn app(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .attach(CORS)
        .mount("/", routes![options_handler])
        .mount(
            "/api/v1",
            openapi_get_routes![
                // Auth
                routes::auth::register_housekeeper,
                routes::auth::register_employer,
                routes::auth::login,
                // Housekeepers
                routes::housekeeper::list_housekeepers,
                routes::housekeeper::get_housekeeper,
                routes::housekeeper::update_housekeeper,
                routes::housekeeper::delete_housekeeper,
                // Employers
                routes::employer::get_employer,
                routes::employer::update_employer,
                // Hiring
                routes::hiring::create_hiring,
                routes::hiring::get_hiring,
                routes::hiring::update_hiring_status,
                routes::hiring::get_employer_hirings,
                // Ratings
                routes::review::create_review,
                routes::review::get_housekeeper_reviews,
            ],
        )
        .mount("/api/docs", make_swagger_ui(&swagger_config()))
        .register(
            "/",
            catchers![bad_request, unauthorized, not_found, unprocessable, internal_error],
        )
}

/* ----------------------------- LAUNCH ----------------------------- */

#[launch]
fn rocket() -> Rocket<Build> {
    dotenv().ok();
    env_logger::init();

    log::info!("Agazh API starting, Swagger UI at /api/docs");

    let rocket = rocket::custom(config::figment())
        .attach(AdHoc::config::<AppConfig>())
        .attach(JwtService::fairing())
        .attach(db::init())
        .attach(services::rating::init())
        .attach(services::email::init());

    app(rocket)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;
    use crate::models::{Category, EmploymentType, Housekeeper, UserRole};
    use crate::services::rating::{MongoReviewStore, RatingAggregator};
    use crate::services::Notifier;
    use mongodb::bson::{doc, oid::ObjectId, DateTime};
    use rocket::figment::providers::Serialized;
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;

    const SECRET: &str = "test-secret";

    /// Full route table over a database handle that never connects. Only
    /// requests rejected before any query are meaningful here.
    async fn client() -> Client {
        let settings = AppConfig::default();
        let db = Db::lazy(&settings).await.expect("lazy db");
        client_over(settings, db).await
    }

    async fn client_over(settings: AppConfig, db: Db) -> Client {
        let (notifier, _rx) = Notifier::channel(4);

        let rocket = rocket::custom(config::figment().merge(Serialized::global("log_level", "off")))
            .manage(JwtService::new(SECRET, 3600))
            .manage(RatingAggregator::new(MongoReviewStore::new(db.clone())))
            .manage(db)
            .manage(notifier)
            .manage(settings);

        Client::untracked(app(rocket)).await.expect("valid rocket")
    }

    fn bearer() -> Header<'static> {
        let token = JwtService::new(SECRET, 3600)
            .issue_token(&ObjectId::new(), UserRole::Employer)
            .unwrap();
        Header::new("Authorization", format!("Bearer {}", token))
    }

    async fn error_of(response: rocket::local::asynchronous::LocalResponse<'_>) -> String {
        let body: serde_json::Value = response.into_json().await.expect("json body");
        body["error"].as_str().unwrap_or_default().to_string()
    }

    #[rocket::async_test]
    async fn protected_route_without_header_is_401() {
        let client = client().await;
        let response = client.get("/api/v1/housekeepers").dispatch().await;

        assert_eq!(response.status(), Status::Unauthorized);
        assert_eq!(error_of(response).await, "Authorization header is required");
    }

    #[rocket::async_test]
    async fn token_from_another_secret_is_401() {
        let client = client().await;
        let token = JwtService::new("other-secret", 3600)
            .issue_token(&ObjectId::new(), UserRole::Employer)
            .unwrap();

        let response = client
            .get("/api/v1/housekeepers")
            .header(Header::new("Authorization", format!("Bearer {}", token)))
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Unauthorized);
        assert_eq!(error_of(response).await, "Invalid or expired token");
    }

    #[rocket::async_test]
    async fn mutation_without_header_is_401() {
        let client = client().await;
        let response = client
            .delete(format!("/api/v1/housekeepers/{}", ObjectId::new()))
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn malformed_id_is_400() {
        let client = client().await;
        let response = client
            .get("/api/v1/housekeepers/not-an-id")
            .header(bearer())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(error_of(response).await, "Invalid housekeeper ID");
    }

    #[rocket::async_test]
    async fn unknown_category_filter_is_400() {
        let client = client().await;
        let response = client
            .get("/api/v1/housekeepers?category=GARDENING")
            .header(bearer())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
    }

    #[rocket::async_test]
    async fn out_of_range_rating_is_400() {
        let client = client().await;
        for rating in [0.0, 6.0] {
            let response = client
                .post("/api/v1/ratings")
                .header(bearer())
                .header(ContentType::JSON)
                .body(
                    serde_json::json!({
                        "employer_id": ObjectId::new().to_hex(),
                        "housekeeper_id": ObjectId::new().to_hex(),
                        "rating": rating,
                        "comment": "ok",
                    })
                    .to_string(),
                )
                .dispatch()
                .await;

            assert_eq!(response.status(), Status::BadRequest);
            assert!(error_of(response).await.starts_with("Rating must be between 1 and 5"));
        }
    }

    #[rocket::async_test]
    async fn hiring_with_malformed_employer_id_is_400() {
        let client = client().await;
        let response = client
            .post("/api/v1/hiring")
            .header(bearer())
            .header(ContentType::JSON)
            .body(
                serde_json::json!({
                    "employer_id": "nope",
                    "housekeeper_id": ObjectId::new().to_hex(),
                    "salary_offer": 3000.0,
                    "start_date": "2024-10-01",
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(error_of(response).await, "Invalid employer ID");
    }

    #[rocket::async_test]
    async fn empty_update_is_400() {
        let client = client().await;
        let response = client
            .put(format!("/api/v1/housekeepers/{}", ObjectId::new()))
            .header(bearer())
            .header(ContentType::JSON)
            .body("{}")
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(error_of(response).await, "No fields to update");
    }

    #[rocket::async_test]
    async fn login_with_unknown_user_type_is_400() {
        let client = client().await;
        let response = client
            .post("/api/v1/auth/login")
            .header(ContentType::JSON)
            .body(r#"{"email":"a@b.co","password":"pw","user_type":"admin"}"#)
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
        assert!(error_of(response).await.starts_with("Invalid request body"));
    }

    #[rocket::async_test]
    async fn malformed_json_is_400() {
        let client = client().await;
        let response = client
            .post("/api/v1/auth/register/employer")
            .header(ContentType::JSON)
            .body("{not json")
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
    }

    #[rocket::async_test]
    async fn invalid_registration_fields_are_named() {
        let client = client().await;
        let response = client
            .post("/api/v1/auth/register/employer")
            .header(ContentType::JSON)
            .body(
                serde_json::json!({
                    "name": "Selam",
                    "email": "not-an-email",
                    "password": "pw",
                    "address": "Bole",
                    "phone_number": "+251911000111",
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(error_of(response).await, "Invalid or missing fields: email");
    }

    #[rocket::async_test]
    async fn openapi_document_is_served() {
        let client = client().await;
        let response = client.get("/api/v1/openapi.json").dispatch().await;

        assert_eq!(response.status(), Status::Ok);
        let doc: serde_json::Value = response.into_json().await.unwrap();
        let paths = doc["paths"].as_object().expect("paths object");
        let ratings = paths
            .iter()
            .find(|(path, _)| path.ends_with("/ratings"))
            .map(|(_, item)| item)
            .expect("ratings path");
        assert!(ratings["post"]["responses"]["201"].is_object());
    }

    #[rocket::async_test]
    async fn cors_headers_echo_origin() {
        let client = client().await;
        let response = client
            .options("/api/v1/housekeepers")
            .header(Header::new("Origin", "http://localhost:3000"))
            .dispatch()
            .await;

        assert_eq!(
            response.headers().get_one("Access-Control-Allow-Origin"),
            Some("http://localhost:3000")
        );
    }

    #[rocket::async_test]
    async fn unknown_route_is_json_404() {
        let client = client().await;
        let response = client.get("/nowhere").dispatch().await;

        assert_eq!(response.status(), Status::NotFound);
        assert!(!error_of(response).await.is_empty());
    }

    /* ------------------- live MongoDB (TEST_MONGO_URI) ------------------- */

    async fn live() -> Option<(Client, Db)> {
        let uri = std::env::var("TEST_MONGO_URI").ok()?;
        let settings = AppConfig {
            mongo_uri: uri,
            mongo_database: "agazh_test".to_string(),
            ..Default::default()
        };
        let db = Db::connect(&settings).await.expect("test database");
        Some((client_over(settings, db.clone()).await, db))
    }

    fn housekeeper(
        name: &str,
        category: Category,
        employment_type: EmploymentType,
        location: &str,
        rating: f64,
        is_available: bool,
    ) -> Housekeeper {
        let now = DateTime::now();
        Housekeeper {
            id: None,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            password: "$2b$hash".to_string(),
            age: 30,
            experience: 5,
            category,
            employment_type,
            skills: vec![],
            certifications: vec![],
            photo_url: None,
            religion: None,
            place_of_birth: None,
            location: location.to_string(),
            phone_number: "+251911000333".to_string(),
            rating,
            is_available,
            created_at: now,
            updated_at: now,
        }
    }

    #[rocket::async_test]
    async fn hiring_for_unknown_employer_is_400_and_inserts_nothing() {
        let Some((client, db)) = live().await else {
            return;
        };
        let employer_id = ObjectId::new();
        let housekeeper_id = db
            .housekeepers()
            .insert_one(
                housekeeper("Hana", Category::Normal, EmploymentType::LiveOut, "Adama", 0.0, true),
                None,
            )
            .await
            .unwrap()
            .inserted_id
            .as_object_id()
            .unwrap();

        let response = client
            .post("/api/v1/hiring")
            .header(bearer())
            .header(ContentType::JSON)
            .body(
                serde_json::json!({
                    "employer_id": employer_id.to_hex(),
                    "housekeeper_id": housekeeper_id.to_hex(),
                    "salary_offer": 3000.0,
                    "start_date": "2024-10-01",
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(error_of(response).await, "Employer not found");

        let stored = db
            .hirings()
            .count_documents(doc! { "employer_id": employer_id }, None)
            .await
            .unwrap();
        assert_eq!(stored, 0);

        db.housekeepers()
            .delete_one(doc! { "_id": housekeeper_id }, None)
            .await
            .unwrap();
    }

    #[rocket::async_test]
    async fn listing_returns_available_matches_best_rated_first() {
        let Some((client, db)) = live().await else {
            return;
        };
        // Unique location keeps this run's documents apart from anything else.
        let location = ObjectId::new().to_hex();

        let seeded = vec![
            housekeeper("Mid", Category::Cleaning, EmploymentType::LiveIn, &location, 3.5, true),
            housekeeper("Top", Category::Cleaning, EmploymentType::LiveIn, &location, 4.8, true),
            housekeeper("Away", Category::Cleaning, EmploymentType::LiveIn, &location, 5.0, false),
            housekeeper("Out", Category::Cleaning, EmploymentType::LiveOut, &location, 4.9, true),
            housekeeper("Nanny", Category::ChildCare, EmploymentType::LiveIn, &location, 4.7, true),
        ];
        db.housekeepers().insert_many(seeded, None).await.unwrap();

        // Stored before CLEANING became the canonical spelling.
        let mut legacy = mongodb::bson::to_document(&housekeeper(
            "Legacy",
            Category::Cleaning,
            EmploymentType::LiveIn,
            &location,
            4.0,
            true,
        ))
        .unwrap();
        legacy.insert("category", "CLEANER");
        db.client()
            .database("agazh_test")
            .collection::<mongodb::bson::Document>(crate::db::HOUSEKEEPERS)
            .insert_one(legacy, None)
            .await
            .unwrap();

        let response = client
            .get(format!(
                "/api/v1/housekeepers?category=CLEANING&employment_type=LIVE_IN&location={}",
                location
            ))
            .header(bearer())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        let body: serde_json::Value = response.into_json().await.unwrap();
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|h| h["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Top", "Legacy", "Mid"]);

        db.housekeepers()
            .delete_many(doc! { "location": &location }, None)
            .await
            .unwrap();
    }
}
