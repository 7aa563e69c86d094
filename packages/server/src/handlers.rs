//! HTTP handler functions for the dashboard API.

use std::fmt::Display;

use actix_web::{HttpResponse, web};
use bikeshare_dashboard::{DashboardError, queries, resolve_window, resolve_years};
use bikeshare_server_models::{
    ApiDuration, ApiError, ApiHealth, DateRangeParams, DurationParams, FlowQueryParams,
    StationUsageParams,
};

use crate::AppState;

fn bad_request(e: impl Display) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiError::new(e))
}

fn internal_error(what: &str, e: &DashboardError) -> HttpResponse {
    log::error!("Failed to {what}: {e}");
    HttpResponse::InternalServerError().json(ApiError::new(format!("Failed to {what}")))
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/options`
///
/// Returns the years, neighborhoods, stations, and date bounds the
/// dashboard controls can offer.
pub async fn options(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(queries::options(&state.dashboard))
}

/// `GET /api/flow?years=2022,2023`
///
/// Flow diagram of rider category to month for the selected years.
pub async fn flow(
    state: web::Data<AppState>,
    params: web::Query<FlowQueryParams>,
) -> HttpResponse {
    let years = resolve_years(&state.dashboard, params.years.as_deref());

    match queries::flow_for_years(&state.dashboard, &years) {
        Ok(diagram) => HttpResponse::Ok().json(diagram),
        Err(e) => internal_error("build flow diagram", &e),
    }
}

/// `GET /api/top-stations?from=..&to=..`
pub async fn top_stations(
    state: web::Data<AppState>,
    params: web::Query<DateRangeParams>,
) -> HttpResponse {
    let bounds = state.dashboard.trip_dates();
    let (from, to) = match resolve_window(params.from.as_deref(), params.to.as_deref(), bounds) {
        Ok(range) => range,
        Err(e) => return bad_request(e),
    };

    match queries::top_start_stations(&state.dashboard, from, to) {
        Ok(ranked) => HttpResponse::Ok().json(ranked),
        Err(e) => internal_error("rank start stations", &e),
    }
}

/// `GET /api/station-usage?neighborhood=..&from=..&to=..`
pub async fn station_usage(
    state: web::Data<AppState>,
    params: web::Query<StationUsageParams>,
) -> HttpResponse {
    let bounds = state.dashboard.event_dates();
    let (from, to) = match resolve_window(params.from.as_deref(), params.to.as_deref(), bounds) {
        Ok(range) => range,
        Err(e) => return bad_request(e),
    };

    match queries::station_map(&state.dashboard, &params.neighborhood, from, to) {
        Ok(map) => HttpResponse::Ok().json(map),
        Err(e) => internal_error("count station usage", &e),
    }
}

/// `GET /api/duration?start=..&end=..`
pub async fn duration(
    state: web::Data<AppState>,
    params: web::Query<DurationParams>,
) -> HttpResponse {
    let result = queries::trip_duration(&state.dashboard, &params.start, &params.end);
    HttpResponse::Ok().json(ApiDuration::new(&params.start, &params.end, result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};
    use bikeshare_dashboard::{DashboardConfig, DashboardState};
    use bikeshare_spatial::BoundarySet;
    use bikeshare_trip::progress::null_progress;
    use bikeshare_trip::read_trips;

    const TRIPS: &str = "\
tripduration,starttime,stoptime,start station name,start station latitude,start station longitude,end station name,end station latitude,end station longitude,usertype
100,2022-08-01 08:00:00,2022-08-01 08:01:40,Fenway Park,42.345,-71.085,Brigham Circle,42.325,-71.10,Subscriber
300,2022-08-02 09:00:00,2022-08-02 09:05:00,Fenway Park,42.345,-71.085,Brigham Circle,42.325,-71.10,Customer
";

    const NEIGHBORHOODS: &str = r#"{"type": "FeatureCollection", "features": [{
        "type": "Feature",
        "properties": { "BlockGr202": "Fenway" },
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[-71.11, 42.33], [-71.08, 42.33], [-71.08, 42.35], [-71.11, 42.35], [-71.11, 42.33]]]
        }
    }]}"#;

    fn app_state() -> web::Data<AppState> {
        let trips = read_trips(TRIPS.as_bytes(), &null_progress()).unwrap();
        let boundaries = BoundarySet::from_geojson_str(NEIGHBORHOODS, "BlockGr202").unwrap();
        let dashboard =
            DashboardState::from_parts(DashboardConfig::default(), trips, &boundaries).unwrap();
        web::Data::new(AppState { dashboard })
    }

    #[actix_web::test]
    async fn duration_endpoint_returns_average() {
        let app = App::new().app_data(app_state()).configure(crate::configure);
        let app = test::init_service(app).await;
        let req = test::TestRequest::get()
            .uri("/api/duration?start=Fenway%20Park&end=Brigham%20Circle")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "0 hrs, 3 mins, 20 secs");
        assert_eq!(body["result"]["trips"], 2);
    }

    #[actix_web::test]
    async fn flow_defaults_to_earliest_year() {
        let app = App::new().app_data(app_state()).configure(crate::configure);
        let app = test::init_service(app).await;
        let req = test::TestRequest::get().uri("/api/flow").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body["labels"],
            serde_json::json!(["August", "Customer", "Subscriber"])
        );
        assert_eq!(body["nodeThickness"], 50);
    }

    #[actix_web::test]
    async fn malformed_date_is_a_bad_request() {
        let app = App::new().app_data(app_state()).configure(crate::configure);
        let app = test::init_service(app).await;
        let req = test::TestRequest::get()
            .uri("/api/top-stations?from=yesterday")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ApiError = test::read_body_json(resp).await;
        assert_eq!(body.error, "Invalid date 'yesterday'");
    }

    #[actix_web::test]
    async fn missing_query_parameter_is_a_json_bad_request() {
        let app = App::new().app_data(app_state()).configure(crate::configure);
        let app = test::init_service(app).await;

        for uri in ["/api/duration?start=A", "/api/station-usage"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");

            let body: ApiError = test::read_body_json(resp).await;
            assert!(!body.error.is_empty(), "{uri}");
        }
    }

    #[actix_web::test]
    async fn station_usage_uses_event_bounds_by_default() {
        let app = App::new().app_data(app_state()).configure(crate::configure);
        let app = test::init_service(app).await;
        let req = test::TestRequest::get()
            .uri("/api/station-usage?neighborhood=Fenway")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["stations"][0]["stationName"], "Fenway Park");
        assert_eq!(body["stations"][0]["usageCount"], 2);
    }
}
