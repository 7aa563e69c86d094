//! Prompt-driven startup for the dashboard API.

use bikeshare_dashboard::DashboardState;
use dialoguer::{Confirm, Input};

use crate::{ServerConfig, run_server};

/// Asks for the listen address, offering `defaults` as the answers.
///
/// A failed prompt (e.g. no terminal) keeps the default.
#[must_use]
pub fn prompt_config(defaults: &ServerConfig) -> ServerConfig {
    let bind_addr = Input::<String>::new()
        .with_prompt("Bind address")
        .default(defaults.bind_addr.clone())
        .validate_with(|addr: &String| {
            if addr.trim().is_empty() {
                Err("bind address cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .map_or_else(
            |_| defaults.bind_addr.clone(),
            |addr| addr.trim().to_string(),
        );

    let port = Input::<u16>::new()
        .with_prompt("Port")
        .default(defaults.port)
        .interact_text()
        .unwrap_or(defaults.port);

    ServerConfig { bind_addr, port }
}

/// Summarizes the loaded data, prompts for the listen address, and serves
/// once the user confirms.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the server fails to bind or stops
/// with a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run(dashboard: DashboardState, defaults: &ServerConfig) -> std::io::Result<()> {
    println!(
        "Bike-share dashboard API: {} trips, {} neighborhoods with stations",
        dashboard.trips().len(),
        dashboard.geo().neighborhoods().len()
    );

    let config = prompt_config(defaults);
    let url = format!("http://{}:{}/api", config.bind_addr, config.port);

    let start = Confirm::new()
        .with_prompt(format!("Serve the dashboard at {url}?"))
        .default(true)
        .interact()
        .unwrap_or(true);
    if !start {
        println!("Server not started.");
        return Ok(());
    }

    run_server(dashboard, &config).await
}
