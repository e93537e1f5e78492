use log::{error, info};
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use rocket::fairing::AdHoc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::models::{Employer, Hiring, Housekeeper, Review};

pub const EMPLOYERS: &str = "employers";
pub const HOUSEKEEPERS: &str = "housekeepers";
pub const HIRINGS: &str = "hirings";
pub const REVIEWS: &str = "reviews";

/// The one database handle of the process. Cloning is cheap; every clone
/// shares the driver's connection pool.
#[derive(Debug, Clone)]
pub struct Db {
    client: Client,
    database: Database,
}

impl Db {
    /// Connects and pings once, bounded by the configured timeout.
    pub async fn connect(config: &AppConfig) -> mongodb::error::Result<Db> {
        let db = Self::lazy(config).await?;
        db.database.run_command(doc! { "ping": 1 }, None).await?;
        Ok(db)
    }

    /// Builds the handle without contacting the server.
    pub async fn lazy(config: &AppConfig) -> mongodb::error::Result<Db> {
        let timeout = Duration::from_secs(config.mongo_connect_timeout_secs);

        let mut options = ClientOptions::parse(&config.mongo_uri).await?;
        options.app_name = Some("agazh-server".to_string());
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);

        let client = Client::with_options(options)?;
        let database = client.database(&config.mongo_database);
        Ok(Db { client, database })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn employers(&self) -> Collection<Employer> {
        self.database.collection(EMPLOYERS)
    }

    pub fn housekeepers(&self) -> Collection<Housekeeper> {
        self.database.collection(HOUSEKEEPERS)
    }

    pub fn hirings(&self) -> Collection<Hiring> {
        self.database.collection(HIRINGS)
    }

    pub fn reviews(&self) -> Collection<Review> {
        self.database.collection(REVIEWS)
    }
}

pub fn init() -> AdHoc {
    AdHoc::try_on_ignite("MongoDB", |rocket| async move {
        let Some(config) = rocket.state::<AppConfig>().cloned() else {
            error!("✗ MongoDB fairing ran before configuration was loaded");
            return Err(rocket);
        };

        match Db::connect(&config).await {
            Ok(db) => {
                info!("✓ MongoDB connected ({})", config.mongo_database);
                Ok(rocket.manage(db))
            }
            Err(e) => {
                error!("✗ Failed to connect to MongoDB: {}", e);
                Err(rocket)
            }
        }
    })
}
