use rocket::data::{self, Data, FromData};
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::serde::json::{Error as JsonError, Json};
use rocket::Request;
use rocket_okapi::okapi::openapi3::RequestBody;
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::request::OpenApiFromData;
use serde::de::DeserializeOwned;
use validator::Validate;

use super::{ApiError, GuardFailure};

/// `Json<T>` that answers malformed or incomplete bodies with `400` and an
/// `{error}` body instead of Rocket's default `422`.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<T> JsonBody<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Validate> JsonBody<T> {
    /// Unwraps the body after running its `#[validate]` rules.
    pub fn validated(self) -> Result<T, ApiError> {
        self.0.validate()?;
        Ok(self.0)
    }
}

#[rocket::async_trait]
impl<'r, T: DeserializeOwned + Send> FromData<'r> for JsonBody<T> {
    type Error = String;

    async fn from_data(req: &'r Request<'_>, data: Data<'r>) -> data::Outcome<'r, Self> {
        match Json::<T>::from_data(req, data).await {
            Outcome::Success(Json(value)) => Outcome::Success(JsonBody(value)),
            Outcome::Error((_, err)) => {
                let detail = match err {
                    JsonError::Io(e) => e.to_string(),
                    JsonError::Parse(_, e) => e.to_string(),
                };
                let message = format!("Invalid request body: {}", detail);
                GuardFailure::record(req, message.clone());
                Outcome::Error((Status::BadRequest, message))
            }
            Outcome::Forward(forward) => Outcome::Forward(forward),
        }
    }
}

impl<'r, T: JsonSchema + DeserializeOwned + Send> OpenApiFromData<'r> for JsonBody<T> {
    fn request_body(generator: &mut OpenApiGenerator) -> rocket_okapi::Result<RequestBody> {
        <Json<T> as OpenApiFromData<'r>>::request_body(generator)
    }
}
