//! Interactive menu for the dashboard CLI.
//!
//! Guides the user through one query with `dialoguer` prompts whose
//! choices come from the loaded data.

use std::path::PathBuf;

use bikeshare_analytics_models::Selection;
use bikeshare_cli_utils::MultiProgress;
use bikeshare_dashboard::{
    DashboardConfig, DashboardState, DateBounds, flow_for_years, options, parse_date_bound,
    resolve_window, resolve_years, station_map, top_start_stations, trip_duration,
};
use bikeshare_server::ServerConfig;
use bikeshare_server_models::ApiDuration;
use chrono::NaiveDateTime;
use dialoguer::{Input, MultiSelect, Select};

/// Top-level tool selection.
enum Tool {
    Flow,
    TopStations,
    StationUsage,
    Duration,
    Options,
    Serve,
    Reproject,
}

impl Tool {
    const ALL: &[Self] = &[
        Self::Flow,
        Self::TopStations,
        Self::StationUsage,
        Self::Duration,
        Self::Options,
        Self::Serve,
        Self::Reproject,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Flow => "Flow diagram by year",
            Self::TopStations => "Top start stations",
            Self::StationUsage => "Station usage in a neighborhood",
            Self::Duration => "Average trip duration between stations",
            Self::Options => "Show available years, neighborhoods, and stations",
            Self::Serve => "Start server",
            Self::Reproject => "Reproject neighborhood boundaries",
        }
    }
}

/// Runs the interactive menu.
///
/// # Errors
///
/// Returns an error if loading the data, a prompt, or the chosen query
/// fails.
pub fn run(
    config: DashboardConfig,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Bike-share Dashboard");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Flow => handle_flow(&crate::load_state(config, multi)?)?,
        Tool::TopStations => {
            let state = crate::load_state(config, multi)?;
            let (from, to) = prompt_window(state.trip_dates())?;
            crate::print_json(&top_start_stations(&state, from, to)?)?;
        }
        Tool::StationUsage => handle_station_usage(&crate::load_state(config, multi)?)?,
        Tool::Duration => handle_duration(&crate::load_state(config, multi)?)?,
        Tool::Options => crate::print_json(&options(&crate::load_state(config, multi)?))?,
        Tool::Serve => {
            let state = crate::load_state(config, multi)?;
            let defaults = ServerConfig::from_env();
            actix_web::rt::System::new()
                .block_on(bikeshare_server::interactive::run(state, &defaults))?;
        }
        Tool::Reproject => handle_reproject(&config)?,
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Prompts for an output path and writes the reprojected boundaries.
fn handle_reproject(config: &DashboardConfig) -> Result<(), Box<dyn std::error::Error>> {
    let default_output = format!(
        "data/neighborhoods_{}.geojson",
        config.target_crs.code().replace(':', "_").to_lowercase()
    );
    let output: String = Input::new()
        .with_prompt("Output path")
        .default(default_output)
        .interact_text()?;
    crate::reproject(config, &PathBuf::from(output))
}

/// Picks years (earliest pre-checked) and prints the flow diagram.
fn handle_flow(state: &DashboardState) -> Result<(), Box<dyn std::error::Error>> {
    let years: Vec<String> = options(state).years.iter().map(ToString::to_string).collect();
    let defaults: Vec<bool> = (0..years.len()).map(|i| i == 0).collect();

    let picked = MultiSelect::new()
        .with_prompt("Years (space to toggle)")
        .items(&years)
        .defaults(&defaults)
        .interact()?;

    let selection = if picked.is_empty() {
        resolve_years(state, None)
    } else {
        Selection::Many(picked.into_iter().map(|i| years[i].clone()).collect())
    };

    crate::print_json(&flow_for_years(state, &selection)?)
}

fn handle_station_usage(state: &DashboardState) -> Result<(), Box<dyn std::error::Error>> {
    let opts = options(state);
    if opts.neighborhoods.is_empty() {
        println!("No station falls inside any neighborhood.");
        return Ok(());
    }

    let idx = Select::new()
        .with_prompt("Neighborhood")
        .items(&opts.neighborhoods)
        .default(0)
        .interact()?;

    let (from, to) = prompt_window(state.event_dates())?;
    crate::print_json(&station_map(state, &opts.neighborhoods[idx], from, to)?)
}

fn handle_duration(state: &DashboardState) -> Result<(), Box<dyn std::error::Error>> {
    let stations = options(state).stations;
    if stations.is_empty() {
        println!("No trips loaded.");
        return Ok(());
    }

    let start = Select::new()
        .with_prompt("Start station")
        .items(&stations)
        .default(0)
        .interact()?;
    let end = Select::new()
        .with_prompt("End station")
        .items(&stations)
        .default(0)
        .interact()?;

    let (start, end) = (&stations[start], &stations[end]);
    let lookup = trip_duration(state, start, end);
    println!("{lookup}");
    crate::print_json(&ApiDuration::new(start, end, lookup))
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// Prompts for one window bound, pre-filled from the data.
fn prompt_bound(prompt: &str, default: Option<String>) -> Result<String, dialoguer::Error> {
    let mut input = Input::<String>::new()
        .with_prompt(prompt)
        .validate_with(|s: &String| parse_date_bound(s).map(|_| ()).map_err(|e| e.to_string()));
    if let Some(default) = default {
        input = input.default(default);
    }
    input.interact_text()
}

/// Prompts for an inclusive date window.
fn prompt_window(
    bounds: Option<DateBounds>,
) -> Result<(NaiveDateTime, NaiveDateTime), Box<dyn std::error::Error>> {
    let from = prompt_bound("From", bounds.map(|b| b.min.to_string()))?;
    let to = prompt_bound("To", bounds.map(|b| b.max.to_string()))?;
    Ok(resolve_window(Some(&from), Some(&to), bounds)?)
}
