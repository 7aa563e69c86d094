#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web JSON API for the bike-share dashboard.
//!
//! Serves the four visualization queries plus the selectable control
//! values. The dashboard state is loaded once before the server starts
//! and shared read-only across workers.

mod handlers;
pub mod interactive;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, error::InternalError, middleware, web};
use bikeshare_dashboard::DashboardState;
use bikeshare_server_models::ApiError;

/// Address used when `BIND_ADDR` is unset.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";

/// Port used when `PORT` is unset or not a port number.
pub const DEFAULT_PORT: u16 = 8080;

/// Shared application state.
pub struct AppState {
    /// Loaded trips and neighborhood-joined events.
    pub dashboard: DashboardState,
}

/// Where the server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind.
    pub bind_addr: String,
    /// TCP port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Reads `BIND_ADDR` and `PORT`, falling back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(std::env::var("BIND_ADDR").ok(), std::env::var("PORT").ok())
    }

    /// Builds a config from raw variable values. An unparseable port is
    /// logged and replaced by [`DEFAULT_PORT`].
    #[must_use]
    pub fn from_vars(bind_addr: Option<String>, port: Option<String>) -> Self {
        let port = port.map_or(DEFAULT_PORT, |p| {
            p.parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid PORT '{p}', using {DEFAULT_PORT}");
                DEFAULT_PORT
            })
        });
        Self {
            bind_addr: bind_addr
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            port,
        }
    }
}

/// Registers every API route under `/api`.
///
/// Query strings that fail to deserialize are answered with a 400 and an
/// [`ApiError`] body.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ApiError::new(&err));
        InternalError::from_response(err, response).into()
    }))
    .service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/options", web::get().to(handlers::options))
            .route("/flow", web::get().to(handlers::flow))
            .route("/top-stations", web::get().to(handlers::top_stations))
            .route("/station-usage", web::get().to(handlers::station_usage))
            .route("/duration", web::get().to(handlers::duration)),
    );
}

/// Starts the dashboard API server over an already-loaded state.
///
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(dashboard: DashboardState, config: &ServerConfig) -> std::io::Result<()> {
    let state = web::Data::new(AppState { dashboard });

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_from_vars() {
        assert_eq!(ServerConfig::from_vars(None, None), ServerConfig::default());
        assert_eq!(
            ServerConfig::from_vars(Some("0.0.0.0".to_string()), Some("9090".to_string())),
            ServerConfig {
                bind_addr: "0.0.0.0".to_string(),
                port: 9090,
            }
        );
    }

    #[test]
    fn invalid_port_falls_back_to_default() {
        let config = ServerConfig::from_vars(Some(" ".to_string()), Some("http".to_string()));
        assert_eq!(config, ServerConfig::default());
    }
}
