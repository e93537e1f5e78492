use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::{error, warn};
use mongodb::bson::oid::ObjectId;
use rocket::fairing::AdHoc;
use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, DEFAULT_JWT_SECRET};
use crate::models::UserRole;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // account id
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}

/// Issues and verifies HS256 bearer tokens with a server-held secret.
pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry: i64,
}

impl JwtService {
    pub fn new(secret: &str, expiry: i64) -> Self {
        JwtService {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        if config.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("JWT_SECRET is not set; tokens are signed with the built-in default secret");
        }
        Self::new(&config.jwt_secret, config.jwt_expiry)
    }

    pub fn fairing() -> AdHoc {
        AdHoc::try_on_ignite("JWT", |rocket| async move {
            let jwt = rocket.state::<AppConfig>().map(JwtService::from_config);
            match jwt {
                Some(jwt) => Ok(rocket.manage(jwt)),
                None => {
                    error!("✗ JWT fairing ran before configuration was loaded");
                    Err(rocket)
                }
            }
        })
    }

    pub fn issue_token(
        &self,
        subject: &ObjectId,
        role: UserRole,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now().timestamp();
        self.encode_claims(&Claims {
            sub: subject.to_hex(),
            role,
            exp: now + self.expiry,
            iat: now,
        })
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::default(), claims, &self.encoding)
    }

    /// Rejects bad signatures, malformed payloads and expired tokens.
    pub fn verify_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_carries_subject_and_role() {
        let jwt = JwtService::new("test-secret", 3600);
        let id = ObjectId::new();

        let token = jwt.issue_token(&id, UserRole::Employer).unwrap();
        let claims = jwt.verify_token(&token).unwrap();

        assert_eq!(claims.sub, id.to_hex());
        assert_eq!(claims.role, UserRole::Employer);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let issuer = JwtService::new("secret-a", 3600);
        let verifier = JwtService::new("secret-b", 3600);

        let token = issuer.issue_token(&ObjectId::new(), UserRole::Housekeeper).unwrap();
        assert!(verifier.verify_token(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = JwtService::new("test-secret", 3600);
        let now = chrono::Utc::now().timestamp();
        let token = jwt
            .encode_claims(&Claims {
                sub: ObjectId::new().to_hex(),
                role: UserRole::Employer,
                exp: now - 3600,
                iat: now - 7200,
            })
            .unwrap();

        assert!(jwt.verify_token(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let jwt = JwtService::new("test-secret", 3600);
        assert!(jwt.verify_token("not.a.token").is_err());
        assert!(jwt.verify_token("").is_err());
    }
}
