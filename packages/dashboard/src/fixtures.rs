//! Small Boston dataset shared by the crate's tests.

use std::path::Path;

use bikeshare_spatial::BoundarySet;
use bikeshare_trip::progress::null_progress;
use bikeshare_trip::read_trips;

use crate::config::DashboardConfig;
use crate::state::DashboardState;

pub const TRIPS: &str = "\
tripduration,starttime,stoptime,start station name,start station latitude,start station longitude,end station name,end station latitude,end station longitude,usertype
600,2022-08-01 08:00:00,2022-08-01 08:10:00,Fenway Park,42.345,-71.085,Brigham Circle,42.325,-71.10,Subscriber
1200,2022-08-02 09:00:00,2022-08-02 09:20:00,Fenway Park,42.345,-71.085,Brigham Circle,42.325,-71.10,Customer
300,2022-08-15 12:00:00,2022-08-15 12:05:00,Brigham Circle,42.325,-71.10,Fenway Park,42.345,-71.085,Subscriber
900,2023-07-04 10:00:00,2023-07-04 10:15:00,Fenway Park,42.345,-71.085,Kendall T,42.362,-71.086,Subscriber
1800,2023-07-05 18:00:00,2023-07-05 18:30:00,Kendall T,42.362,-71.086,Fenway Park,42.345,-71.085,Customer
";

pub const NEIGHBORHOODS: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "properties": { "BlockGr202": "Fenway" },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-71.11, 42.33], [-71.08, 42.33], [-71.08, 42.35], [-71.11, 42.35], [-71.11, 42.33]]]
            }
        },
        {
            "type": "Feature",
            "properties": { "BlockGr202": "Mission Hill" },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-71.11, 42.32], [-71.09, 42.32], [-71.09, 42.33], [-71.11, 42.33], [-71.11, 42.32]]]
            }
        },
        {
            "type": "Feature",
            "properties": { "BlockGr202": "Harbor Islands" },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-70.95, 42.30], [-70.90, 42.30], [-70.90, 42.33], [-70.95, 42.33], [-70.95, 42.30]]]
            }
        }
    ]
}"#;

pub fn state_with(config: DashboardConfig) -> DashboardState {
    let trips = read_trips(TRIPS.as_bytes(), &null_progress()).unwrap();
    let boundaries =
        BoundarySet::from_geojson_str(NEIGHBORHOODS, &config.neighborhood_property).unwrap();
    DashboardState::from_parts(config, trips, &boundaries).unwrap()
}

pub fn state() -> DashboardState {
    state_with(DashboardConfig::default())
}

/// Writes both fixture files into `dir` and returns a config pointing at
/// them.
pub fn config_in(dir: &Path) -> DashboardConfig {
    let trips_path = dir.join("tripdata.csv");
    let boundaries_path = dir.join("neighborhoods.geojson");
    std::fs::write(&trips_path, TRIPS).unwrap();
    std::fs::write(&boundaries_path, NEIGHBORHOODS).unwrap();
    DashboardConfig {
        trips_path,
        boundaries_path,
        ..DashboardConfig::default()
    }
}
