use rocket::Config as RocketConfig;
use rocket::figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::env;

/// Environment keys read verbatim (without the `ROCKET_` prefix).
const RAW_ENV_KEYS: &[&str] = &[
    "port",
    "mongo_uri",
    "mongo_database",
    "mongo_connect_timeout_secs",
    "jwt_secret",
    "jwt_expiry",
    "smtp_host",
    "smtp_port",
    "smtp_username",
    "smtp_password",
    "smtp_from",
    "admin_email",
    "notify_queue_capacity",
];

pub const DEFAULT_JWT_SECRET: &str = "default-secret";

/// Application settings, extracted once during ignition and handed to every
/// collaborator through managed state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_mongo_uri")]
    pub mongo_uri: String,
    #[serde(default = "default_mongo_database")]
    pub mongo_database: String,
    #[serde(default = "default_connect_timeout")]
    pub mongo_connect_timeout_secs: u64,

    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expiry")]
    pub jwt_expiry: i64,

    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: String,
    #[serde(default)]
    pub smtp_password: String,
    #[serde(default)]
    pub smtp_from: Option<String>,
    #[serde(default)]
    pub admin_email: Option<String>,
    #[serde(default = "default_queue_capacity")]
    pub notify_queue_capacity: usize,
}

fn default_mongo_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_mongo_database() -> String {
    "agazh".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_jwt_expiry() -> i64 {
    24 * 60 * 60
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_queue_capacity() -> usize {
    64
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            mongo_uri: default_mongo_uri(),
            mongo_database: default_mongo_database(),
            mongo_connect_timeout_secs: default_connect_timeout(),
            jwt_secret: default_jwt_secret(),
            jwt_expiry: default_jwt_expiry(),
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            smtp_from: None,
            admin_email: None,
            notify_queue_capacity: default_queue_capacity(),
        }
    }
}

impl AppConfig {
    /// Sender address for outgoing mail; falls back to the relay username.
    pub fn mail_from(&self) -> &str {
        self.smtp_from
            .as_deref()
            .filter(|from| !from.is_empty())
            .unwrap_or(&self.smtp_username)
    }

    pub fn is_mail_configured(&self) -> bool {
        !self.smtp_username.is_empty()
            && !self.smtp_password.is_empty()
            && self.admin_email.as_deref().is_some_and(|to| !to.is_empty())
    }
}

/// Layered configuration: Rocket defaults, our defaults (port 8080 on all
/// interfaces), `Rocket.toml`, `ROCKET_*` variables, then the raw keys above.
pub fn figment() -> Figment {
    let profile = env::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());

    Figment::from(RocketConfig::default())
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(("port", 8080))
        .merge(("address", "0.0.0.0"))
        .merge(Toml::file("Rocket.toml").nested())
        .select(&profile)
        .merge(Env::prefixed("ROCKET_").global())
        .merge(Env::raw().only(RAW_ENV_KEYS).global())
}
