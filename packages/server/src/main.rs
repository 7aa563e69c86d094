#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone entry point for the bike-share dashboard API server.
//!
//! Reads the dashboard config from `BIKESHARE_CONFIG` when set, otherwise
//! uses the defaults, loads the data, and serves it on `BIND_ADDR`/`PORT`.

use std::path::Path;

use bikeshare_dashboard::{DashboardConfig, DashboardState};
use bikeshare_server::ServerConfig;
use bikeshare_trip::progress::null_progress;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = match std::env::var("BIKESHARE_CONFIG") {
        Ok(path) => DashboardConfig::load(Path::new(&path))?,
        Err(_) => DashboardConfig::default(),
    };

    log::info!("Loading dashboard data...");
    let state = DashboardState::load(config, &null_progress())?;

    bikeshare_server::run_server(state, &ServerConfig::from_env()).await?;
    Ok(())
}
