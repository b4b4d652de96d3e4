#[macro_use]
extern crate rocket;
#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use std::sync::Arc;

use rocket::{Build, Rocket};

use crate::clock::Clock;
use crate::config::{ConfigFairing, StoreFairing};
use crate::logging::LoggerFairing;
use crate::store::Store;

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

/// Build the server, connecting to whichever store `Rocket.toml` selects.
/// Every route lives under `/api`.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .attach(ConfigFairing)
        .attach(StoreFairing)
        .attach(LoggerFairing)
        .mount("/", api::routes())
}

/// Build the server around an existing store and clock, skipping the
/// [`StoreFairing`]. The caller is responsible for seeding defaults.
pub fn rocket_for_store(store: Store, clock: Arc<dyn Clock>) -> Rocket<Build> {
    let rocket = rocket::build()
        .attach(ConfigFairing)
        .attach(LoggerFairing)
        .mount("/", api::routes());
    config::manage_services(rocket, store, clock)
}
