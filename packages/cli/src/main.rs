#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the bike-share dashboard.
//!
//! ```text
//! bikeshare_cli serve [--bind-addr 0.0.0.0] [--port 8080]
//! bikeshare_cli flow --years 2022,2023
//! bikeshare_cli top-stations --from 2022-08-01 --to 2022-08-31
//! bikeshare_cli station-usage --neighborhood Fenway [--from ..] [--to ..]
//! bikeshare_cli duration --start "MIT Vassar St" --end "Central Square"
//! bikeshare_cli options
//! bikeshare_cli reproject --output data/neighborhoods_3857.geojson
//! ```
//!
//! Running with no subcommand enters interactive mode. Query results are
//! printed as pretty JSON.
//!
//! Uses `indicatif-log-bridge` (via [`bikeshare_cli_utils::init_logger`])
//! so that log lines and the load progress bar never fight for the
//! terminal.

mod interactive;

use std::path::{Path, PathBuf};

use bikeshare_cli_utils::{IndicatifProgress, MultiProgress};
use bikeshare_dashboard::{
    DashboardConfig, DashboardState, flow_for_years, options, reproject_boundaries,
    resolve_window, resolve_years, station_map, top_start_stations, trip_duration,
};
use bikeshare_server::{DEFAULT_BIND_ADDR, DEFAULT_PORT, ServerConfig};
use bikeshare_server_models::ApiDuration;
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "bikeshare_cli",
    about = "Explore bike-share trips by year, station, and neighborhood"
)]
struct Cli {
    /// Dashboard config file (TOML). Built-in defaults apply when omitted
    #[arg(long, global = true, env = "BIKESHARE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the JSON API server
    Serve {
        /// Interface to bind
        #[arg(long, env = "BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
        bind_addr: String,
        /// TCP port
        #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Flow diagram of the configured columns for some years
    Flow {
        /// Comma-separated years (default: the earliest year in the data)
        #[arg(long)]
        years: Option<String>,
    },
    /// Most frequent start stations in a date range
    TopStations {
        /// Inclusive start date or timestamp
        #[arg(long)]
        from: Option<String>,
        /// Inclusive end date or timestamp
        #[arg(long)]
        to: Option<String>,
    },
    /// Per-station visit counts within a neighborhood
    StationUsage {
        /// Neighborhood name
        #[arg(long)]
        neighborhood: String,
        /// Inclusive start date or timestamp
        #[arg(long)]
        from: Option<String>,
        /// Inclusive end date or timestamp
        #[arg(long)]
        to: Option<String>,
    },
    /// Average trip duration between two stations
    Duration {
        /// Start station name
        #[arg(long)]
        start: String,
        /// End station name
        #[arg(long)]
        end: String,
    },
    /// List selectable years, neighborhoods, stations, and date bounds
    Options,
    /// Write the neighborhood boundaries (`GeoJSON` or shapefile) reprojected
    /// to the target CRS as `GeoJSON`
    Reproject {
        /// Output `GeoJSON` path
        #[arg(long)]
        output: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<DashboardConfig, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    })
}

fn load_state(
    config: DashboardConfig,
    multi: &MultiProgress,
) -> Result<DashboardState, Box<dyn std::error::Error>> {
    let progress = IndicatifProgress::file_bar(multi, "Reading trips");
    Ok(DashboardState::load(config, &progress)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn reproject(config: &DashboardConfig, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let written = reproject_boundaries(config, output)?;
    println!(
        "Wrote {} boundaries ({}) to {}",
        written.len(),
        written.crs(),
        output.display()
    );
    Ok(())
}

fn serve(state: DashboardState, config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    actix_web::rt::System::new().block_on(bikeshare_server::run_server(state, config))?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = bikeshare_cli_utils::init_logger();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let Some(command) = cli.command else {
        return interactive::run(config, &multi);
    };

    match command {
        Commands::Serve { bind_addr, port } => {
            let server = ServerConfig { bind_addr, port };
            serve(load_state(config, &multi)?, &server)?;
        }
        Commands::Reproject { output } => reproject(&config, &output)?,
        Commands::Flow { years } => {
            let state = load_state(config, &multi)?;
            let years = resolve_years(&state, years.as_deref());
            print_json(&flow_for_years(&state, &years)?)?;
        }
        Commands::TopStations { from, to } => {
            let state = load_state(config, &multi)?;
            let (from, to) = resolve_window(from.as_deref(), to.as_deref(), state.trip_dates())?;
            print_json(&top_start_stations(&state, from, to)?)?;
        }
        Commands::StationUsage {
            neighborhood,
            from,
            to,
        } => {
            let state = load_state(config, &multi)?;
            let (from, to) = resolve_window(from.as_deref(), to.as_deref(), state.event_dates())?;
            print_json(&station_map(&state, &neighborhood, from, to)?)?;
        }
        Commands::Duration { start, end } => {
            let state = load_state(config, &multi)?;
            let lookup = trip_duration(&state, &start, &end);
            print_json(&ApiDuration::new(&start, &end, lookup))?;
        }
        Commands::Options => {
            let state = load_state(config, &multi)?;
            print_json(&options(&state))?;
        }
    }

    Ok(())
}
