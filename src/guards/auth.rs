use mongodb::bson::oid::ObjectId;
use rocket::http::Status;
use rocket::request::{self, FromRequest, Outcome, Request};

// === OpenAPI (compatible with rocket_okapi 0.8.0 / 0.8.1) ===
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{Object, SecurityRequirement, SecurityScheme, SecuritySchemeData};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};

use crate::models::UserRole;
use crate::services::JwtService;
use crate::utils::GuardFailure;

/// Bearer-token guard for every protected route.
pub struct AuthGuard {
    pub user_id: ObjectId,
    pub role: UserRole,
}

fn reject(req: &Request<'_>, status: Status, message: &str) -> request::Outcome<AuthGuard, ()> {
    GuardFailure::record(req, message);
    Outcome::Error((status, ()))
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthGuard {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let Some(jwt) = req.rocket().state::<JwtService>() else {
            log::error!("AuthGuard used without a managed JwtService");
            return reject(req, Status::InternalServerError, "Internal server error");
        };

        let Some(header) = req.headers().get_one("Authorization") else {
            return reject(req, Status::Unauthorized, "Authorization header is required");
        };

        let Some(token) = header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty()) else {
            return reject(req, Status::Unauthorized, "Authorization header must be 'Bearer <token>'");
        };

        match jwt.verify_token(token) {
            Ok(claims) => match ObjectId::parse_str(&claims.sub) {
                Ok(user_id) => Outcome::Success(AuthGuard {
                    user_id,
                    role: claims.role,
                }),
                Err(_) => reject(req, Status::Unauthorized, "Invalid token subject"),
            },
            Err(_) => reject(req, Status::Unauthorized, "Invalid or expired token"),
        }
    }
}

/// === OpenAPI Integration ===
/// Documents the bearer requirement on every operation that takes the guard.
impl<'a> OpenApiFromRequest<'a> for AuthGuard {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        let scheme = SecurityScheme {
            description: Some("`Authorization: Bearer <token>` issued by /auth/login".to_owned()),
            data: SecuritySchemeData::Http {
                scheme: "bearer".to_owned(),
                bearer_format: Some("JWT".to_owned()),
            },
            extensions: Object::default(),
        };

        let mut requirement = SecurityRequirement::new();
        requirement.insert("BearerAuth".to_owned(), Vec::new());

        Ok(RequestHeaderInput::Security("BearerAuth".to_owned(), scheme, requirement))
    }
}
