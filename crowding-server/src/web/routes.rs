//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

use crate::domain::{FlowReading, LineCode, NewFlowReading, StationCode};
use crate::engine::{CleanupReport, ContextReport, EngineError};
use crate::reference::StationInfo;
use crate::resolver::StationTrains;
use crate::store::FlowQuery;

use super::dto::*;
use super::state::AppState;

/// Readings returned by a listing when no limit is given.
const DEFAULT_LIST_LIMIT: usize = 100;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/context", get(context))
        .route("/api/stations", get(list_stations))
        .route("/api/stations/:code", get(get_station))
        .route("/api/stations/:code/trains", get(station_trains))
        .route("/api/flow", get(list_flow).post(create_flow))
        .route("/api/flow/latest/:code", get(latest_flow))
        .route("/api/flow/snapshot/:code", post(snapshot_flow))
        .route("/api/flow/cleanup", delete(cleanup_flow))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: state.engine.now(),
    })
}

/// Current holiday, weather and hour.
async fn context(State(state): State<AppState>) -> Json<ContextReport> {
    Json(state.engine.current_context().await)
}

/// Every station in the reference table, ordered by code.
async fn list_stations(State(state): State<AppState>) -> Json<Vec<StationInfo>> {
    let stations = state.engine.reference().stations();
    Json(stations.into_iter().cloned().collect())
}

/// One station and the lines serving it.
async fn get_station(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<StationInfo>, AppError> {
    let station = parse_station(&code)?;
    state
        .engine
        .reference()
        .station(station)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound {
            message: format!("Station not found: {station}"),
        })
}

/// Live arrivals for every line at a station.
async fn station_trains(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<StationTrains>, AppError> {
    let station = parse_station(&code)?;
    Ok(Json(state.engine.station_trains(station).await))
}

/// List stored readings, newest first.
async fn list_flow(
    State(state): State<AppState>,
    Query(params): Query<FlowListParams>,
) -> Result<Json<Vec<FlowReading>>, AppError> {
    let station = params
        .station_code
        .as_deref()
        .map(parse_station)
        .transpose()?;
    let start = params
        .start_time
        .as_deref()
        .map(|s| parse_time("start_time", s))
        .transpose()?;
    let end = params
        .end_time
        .as_deref()
        .map(|s| parse_time("end_time", s))
        .transpose()?;

    let query = FlowQuery {
        station,
        start,
        end,
        limit: params.limit.unwrap_or(DEFAULT_LIST_LIMIT),
    };
    Ok(Json(state.engine.history(query).await?))
}

/// Store one reading, classifying it when no level is given.
async fn create_flow(
    State(state): State<AppState>,
    Json(req): Json<CreateFlowRequest>,
) -> Result<Json<FlowReading>, AppError> {
    let station_code = parse_station(&req.station_code)?;
    let line_code = req
        .line_code
        .as_deref()
        .map(|l| {
            LineCode::parse_normalized(l).map_err(|_| AppError::BadRequest {
                message: format!("Invalid line code: {l}"),
            })
        })
        .transpose()?;

    let new = NewFlowReading {
        station_code,
        line_code,
        timestamp: req.timestamp.unwrap_or_else(|| state.engine.now()),
        crowding_level: req.crowding_level,
        train_frequency: req.train_frequency,
        next_train_minutes: req.next_train_minutes,
        is_delay: req.is_delay,
    };
    Ok(Json(state.engine.record(new).await?))
}

/// Station-wide reading combining the latest reading of each line.
async fn latest_flow(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<FlowReading>, AppError> {
    let station = parse_station(&code)?;
    Ok(Json(state.engine.latest(station).await?))
}

/// Snapshot a station's live schedules and store one reading per line.
async fn snapshot_flow(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<FlowReading>>, AppError> {
    let station = parse_station(&code)?;
    Ok(Json(state.engine.record_snapshot(station).await?))
}

/// Delete readings older than the given age.
async fn cleanup_flow(
    State(state): State<AppState>,
    Query(params): Query<CleanupParams>,
) -> Result<Json<CleanupReport>, AppError> {
    let hours = params.hours.unwrap_or(state.retention_hours);
    Ok(Json(state.engine.cleanup(hours).await?))
}

fn parse_station(code: &str) -> Result<StationCode, AppError> {
    StationCode::parse_normalized(code).map_err(|_| AppError::BadRequest {
        message: format!("Invalid station code: {code}"),
    })
}

fn parse_time(field: &str, value: &str) -> Result<chrono::NaiveDateTime, AppError> {
    parse_timestamp(value).ok_or_else(|| AppError::BadRequest {
        message: format!("Invalid {field}: {value}"),
    })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    /// A backing service is down; the request may succeed later.
    Unavailable { message: String },
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::NotFound(_) | EngineError::NoLineData(_) => AppError::NotFound {
                message: e.to_string(),
            },
            EngineError::InvalidCleanupAge(_) => AppError::BadRequest {
                message: e.to_string(),
            },
            EngineError::Store(_) => AppError::Unavailable {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Unavailable { message } => (StatusCode::SERVICE_UNAVAILABLE, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::domain::CrowdingLevel;
    use crate::engine::{CrowdingEngine, EngineConfig};
    use crate::feeds::{
        CachedScheduleClient, FeedError, HolidayCache, HolidayCacheConfig, HolidayFeed,
        ScheduleCacheConfig, ScheduleFeed, ScheduleResponse, WeatherFeed, WeatherReport,
        WeatherService,
    };
    use crate::reference::ReferenceData;
    use crate::resolver::ScheduleResolver;
    use crate::store::{FlowStore, InMemoryFlowStore, StoreError};
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::collections::HashSet;
    use std::sync::Arc;

    /// Every upstream is down.
    struct Offline;

    fn offline() -> FeedError {
        FeedError::Unsuccessful {
            message: "offline".into(),
        }
    }

    #[async_trait]
    impl ScheduleFeed for Offline {
        async fn fetch_schedule(
            &self,
            _line: LineCode,
            _station: StationCode,
        ) -> Result<ScheduleResponse, FeedError> {
            Err(offline())
        }
    }

    #[async_trait]
    impl HolidayFeed for Offline {
        async fn fetch_holidays(&self) -> Result<HashSet<NaiveDate>, FeedError> {
            Err(offline())
        }
    }

    #[async_trait]
    impl WeatherFeed for Offline {
        async fn fetch_weather(&self) -> Result<WeatherReport, FeedError> {
            Err(offline())
        }
    }

    /// Store that refuses every operation.
    struct BrokenStore;

    #[async_trait]
    impl FlowStore for BrokenStore {
        async fn query(&self, _query: &FlowQuery) -> Result<Vec<FlowReading>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn insert(&self, _reading: FlowReading) -> Result<FlowReading, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn delete_older_than(&self, _cutoff: NaiveDateTime) -> Result<usize, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 15)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap()
    }

    fn state_with(store: Arc<dyn FlowStore>) -> AppState {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(now()));
        let feed = Arc::new(Offline);
        let schedules = Arc::new(CachedScheduleClient::new(
            feed.clone(),
            clock.clone(),
            &ScheduleCacheConfig::default(),
        ));
        let resolver = ScheduleResolver::new(
            schedules,
            Arc::new(ReferenceData::builtin().unwrap()),
            clock.clone(),
        );
        let holidays = Arc::new(HolidayCache::new(
            feed.clone(),
            clock.clone(),
            &HolidayCacheConfig::default(),
        ));
        let engine = CrowdingEngine::new(
            resolver,
            holidays,
            WeatherService::new(feed),
            store,
            clock,
            EngineConfig::default(),
        );
        AppState::new(engine, 24)
    }

    fn state() -> AppState {
        state_with(Arc::new(InMemoryFlowStore::new()))
    }

    fn create_request(station: &str) -> CreateFlowRequest {
        CreateFlowRequest {
            station_code: station.into(),
            line_code: Some("isl".into()),
            timestamp: None,
            crowding_level: None,
            train_frequency: Some(2.0),
            next_train_minutes: None,
            is_delay: None,
        }
    }

    fn status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[tokio::test]
    async fn create_then_latest() {
        let state = state();

        let Json(created) = create_flow(State(state.clone()), Json(create_request("cen")))
            .await
            .unwrap();
        assert_eq!(created.station_code.as_str(), "CEN");
        assert_eq!(created.timestamp, now());
        // 13:00 is off-peak: 2 minutes is below 3.
        assert_eq!(created.crowding_level, CrowdingLevel::Medium);

        let Json(latest) = latest_flow(State(state), Path("CEN".into())).await.unwrap();
        assert_eq!(latest.crowding_level, CrowdingLevel::Medium);
    }

    #[tokio::test]
    async fn bad_codes_are_bad_requests() {
        let err = create_flow(State(state()), Json(create_request("central")))
            .await
            .unwrap_err();
        assert_eq!(status(err), StatusCode::BAD_REQUEST);

        let err = latest_flow(State(state()), Path("C1".into()))
            .await
            .unwrap_err();
        assert_eq!(status(err), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn latest_without_data_is_not_found() {
        let err = latest_flow(State(state()), Path("ADM".into()))
            .await
            .unwrap_err();
        assert_eq!(status(err), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn store_failure_is_unavailable() {
        let state = state_with(Arc::new(BrokenStore));
        let err = create_flow(State(state), Json(create_request("CEN")))
            .await
            .unwrap_err();
        assert_eq!(status(err), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn trains_with_feeds_down_is_empty() {
        let Json(trains) = station_trains(State(state()), Path("adm".into()))
            .await
            .unwrap();
        assert_eq!(trains.station_name, "Admiralty");
        assert!(trains.lines.is_empty());
        assert_eq!(trains.timestamp, now());
    }

    #[tokio::test]
    async fn list_rejects_bad_time() {
        let params = FlowListParams {
            start_time: Some("noon".into()),
            ..FlowListParams::default()
        };
        let err = list_flow(State(state()), Query(params)).await.unwrap_err();
        assert_eq!(status(err), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn cleanup_uses_retention_default() {
        let Json(report) = cleanup_flow(State(state()), Query(CleanupParams::default()))
            .await
            .unwrap();
        assert_eq!(report.deleted_count, 0);
        assert_eq!(report.cutoff_time, now() - chrono::Duration::hours(24));

        for hours in [-1, i64::MAX] {
            let params = CleanupParams { hours: Some(hours) };
            let err = cleanup_flow(State(state()), Query(params))
                .await
                .unwrap_err();
            assert_eq!(status(err), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn snapshot_with_feeds_down_is_not_found() {
        let err = snapshot_flow(State(state()), Path("CEN".into()))
            .await
            .unwrap_err();
        assert_eq!(status(err), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stations_list_and_lookup() {
        let Json(stations) = list_stations(State(state())).await;
        assert_eq!(stations.len(), 97);
        assert!(stations.windows(2).all(|w| w[0].code < w[1].code));

        let Json(central) = get_station(State(state()), Path("cen".into()))
            .await
            .unwrap();
        assert_eq!(central.name, "Central");
        assert_eq!(
            central.lines,
            vec![LineCode::parse("ISL").unwrap(), LineCode::parse("TWL").unwrap()]
        );
    }

    #[tokio::test]
    async fn unknown_station_lookup_is_not_found() {
        let err = get_station(State(state()), Path("ZZZ".into()))
            .await
            .unwrap_err();
        assert_eq!(status(err), StatusCode::NOT_FOUND);

        let err = get_station(State(state()), Path("Z1".into()))
            .await
            .unwrap_err();
        assert_eq!(status(err), StatusCode::BAD_REQUEST);
    }
}
