use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crowding_server::clock::{Clock, SystemClock};
use crowding_server::config::ServerConfig;
use crowding_server::engine::{CrowdingEngine, EngineConfig};
use crowding_server::feeds::{
    CachedScheduleClient, FeedConfig, HolidayCache, HolidayCacheConfig, HolidayClient,
    ScheduleCacheConfig, ScheduleClient, WeatherClient, WeatherService,
};
use crowding_server::reference::ReferenceData;
use crowding_server::resolver::ScheduleResolver;
use crowding_server::store::InMemoryFlowStore;
use crowding_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("crowding_server=info")),
        )
        .init();

    let config = ServerConfig::from_env();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::with_offset_hours(config.utc_offset_hours));

    // Reference data (fail fast if a configured file is unusable)
    let reference = match &config.reference_path {
        Some(path) => ReferenceData::load(path).expect("Failed to load reference data"),
        None => ReferenceData::builtin().expect("Built-in reference data is invalid"),
    };
    info!(stations = reference.stations().len(), "loaded reference data");

    // Upstream clients
    let feed = |url: &str| FeedConfig::new(url).with_timeout(config.feed_timeout_secs);
    let schedule_client =
        ScheduleClient::new(feed(&config.schedule_url)).expect("Failed to create schedule client");
    let holiday_client =
        HolidayClient::new(feed(&config.holiday_url)).expect("Failed to create holiday client");
    let weather_client =
        WeatherClient::new(feed(&config.weather_url)).expect("Failed to create weather client");

    let schedules = Arc::new(CachedScheduleClient::new(
        Arc::new(schedule_client),
        clock.clone(),
        &ScheduleCacheConfig::default(),
    ));
    let holidays = Arc::new(HolidayCache::new(
        Arc::new(holiday_client),
        clock.clone(),
        &HolidayCacheConfig::default(),
    ));

    let engine = CrowdingEngine::new(
        ScheduleResolver::new(schedules, Arc::new(reference), clock.clone()),
        holidays,
        WeatherService::new(Arc::new(weather_client)),
        Arc::new(InMemoryFlowStore::new()),
        clock,
        EngineConfig::default(),
    );

    let app = create_router(AppState::new(engine, config.retention_hours));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listen address");
    info!(addr = %config.bind_addr, "crowding server listening");

    axum::serve(listener, app).await.expect("Server error");
}
