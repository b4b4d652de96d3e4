use std::sync::Arc;

use chrono::Duration;
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::clock::{Clock, SystemClock};
use crate::service::{ResultsAggregator, VotingService};
use crate::store::{MongoStore, Store};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    auth_ttl: u32,
    email_domain: String,
    leaderboard_delay: u32,
    admin_email: String,
    admin_name: String,
    // secrets
    jwt_secret: String,
    admin_password: String,
}

impl Config {
    /// Valid lifetime of auth token cookies in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Students must register with an address at this domain (or a subdomain).
    pub fn email_domain(&self) -> &str {
        &self.email_domain
    }

    /// Hours after first boot before the leaderboard opens, unless an admin
    /// picks a time.
    pub fn leaderboard_delay(&self) -> i64 {
        self.leaderboard_delay.into()
    }

    /// Login of the admin account created on first boot.
    pub fn admin_email(&self) -> &str {
        &self.admin_email
    }

    /// Display name of the admin account created on first boot.
    pub fn admin_name(&self) -> &str {
        &self.admin_name
    }

    /// Secret key used to encrypt JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Initial password of the admin account created on first boot.
    pub fn admin_password(&self) -> &str {
        &self.admin_password
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the other fairings and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Where records are kept.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local; lost on restart.
    #[default]
    Memory,
    MongoDb,
}

/// Configuration for the storage layer.
#[derive(Deserialize)]
struct StoreConfig {
    // non-secrets
    #[serde(default)]
    storage: StorageBackend,
    // secrets
    db_uri: Option<String>,
}

/// A fairing that loads the storage config, connects to the chosen backend,
/// seeds any missing defaults, and places the [`Store`] and the services built
/// on it into managed state.
///
/// Must be attached after [`ConfigFairing`].
pub struct StoreFairing;

#[rocket::async_trait]
impl Fairing for StoreFairing {
    fn info(&self) -> Info {
        Info {
            name: "Store",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<StoreConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load storage config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        let store = match config.storage {
            StorageBackend::Memory => {
                warn!("Using in-memory storage; votes will be lost on restart");
                Store::memory()
            }
            StorageBackend::MongoDb => {
                let Some(db_uri) = config.db_uri else {
                    error!("`db_uri` must be set to use MongoDB storage");
                    return Err(rocket);
                };
                info!("Loaded database config, connecting...");
                let client = match MongoClient::with_uri_str(db_uri).await {
                    Ok(client) => client,
                    Err(e) => {
                        error!("Failed to connect to database: {e}");
                        return Err(rocket);
                    }
                };
                let db = client.database(DATABASE_NAME);
                if let Err(e) = MongoStore::prepare(&db).await {
                    error!("Failed to prepare database: {e}");
                    return Err(rocket);
                }
                info!("...database connection online!");
                Store::mongodb(&db)
            }
        };

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let seeded = match rocket.state::<Config>() {
            Some(app_config) => store.ensure_defaults(app_config, clock.as_ref()).await,
            None => {
                error!("Application config must be loaded before the store");
                return Err(rocket);
            }
        };
        if let Err(e) = seeded {
            error!("Failed to seed default data: {e}");
            return Err(rocket);
        }

        Ok(manage_services(rocket, store, clock))
    }
}

/// Place the store, the clock and the services built on them into managed state.
pub(crate) fn manage_services(
    rocket: Rocket<Build>,
    store: Store,
    clock: Arc<dyn Clock>,
) -> Rocket<Build> {
    rocket
        .manage(VotingService::new(store.clone(), clock.clone()))
        .manage(ResultsAggregator::new(store.clone(), clock.clone()))
        .manage(store)
        .manage(clock)
}

/// Name of the MongoDB database holding the election.
const DATABASE_NAME: &str = "studentvote";
