//! HTTP endpoint server using Axum

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, Level};

use crate::engine::Engine;
use crate::metrics::Metrics;
use crate::models::{ActivitySignal, DailySignal, IndicatorSnapshot, ScreenerReport};

#[derive(Clone)]
pub struct AppState {
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub engine: Option<Arc<Engine>>,
}

impl AppState {
    pub fn new(metrics: Arc<Metrics>, engine: Option<Arc<Engine>>) -> Self {
        Self {
            health: Arc::new(RwLock::new(HealthStatus::default())),
            metrics,
            start_time: Arc::new(Instant::now()),
            engine,
        }
    }

    fn engine(&self) -> Result<&Arc<Engine>, StatusCode> {
        self.engine.as_ref().ok_or(StatusCode::SERVICE_UNAVAILABLE)
    }
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let health = state.health.read().await;
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Ok(Json(json!({
        "status": health.status,
        "uptime_seconds": uptime_seconds,
        "service": "candlescope",
        "engine": state.engine.is_some(),
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();
    state.metrics.http_requests_in_flight.dec();

    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

/// Volume and breakout events for one symbol
async fn get_activity(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Vec<ActivitySignal>>, StatusCode> {
    let engine = state.engine()?;
    let signals = engine.detect_activity(&symbol).await.map_err(|e| {
        error!(symbol = %symbol, error = %e, "Failed to detect activity");
        StatusCode::BAD_GATEWAY
    })?;
    Ok(Json(signals))
}

/// Per-candle SMA/EMA/RSI/strength for one symbol
async fn get_indicators(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Vec<IndicatorSnapshot>>, StatusCode> {
    let engine = state.engine()?;
    let series = engine.indicator_series(&symbol).await.map_err(|e| {
        error!(symbol = %symbol, error = %e, "Failed to compute indicators");
        StatusCode::BAD_GATEWAY
    })?;
    Ok(Json(series))
}

/// Run the screener now and return its report
async fn run_screener(State(state): State<AppState>) -> Result<Json<ScreenerReport>, StatusCode> {
    let engine = state.engine()?;
    Ok(Json(engine.run_screener().await))
}

async fn list_open_signals(
    State(state): State<AppState>,
) -> Result<Json<Vec<DailySignal>>, StatusCode> {
    let engine = state.engine()?;
    let signals = engine.store().list_open_signals().await.map_err(|e| {
        error!(error = %e, "Failed to load open signals");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(signals))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/activity/{symbol}", get(get_activity))
        .route("/api/indicators/{symbol}", get(get_indicators))
        .route("/api/screener", get(run_screener))
        .route("/api/signals/open", get(list_open_signals))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(
    port: u16,
    state: AppState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!(port = port, "HTTP server listening on port {}", port);
    info!(
        "Metrics endpoint available at http://0.0.0.0:{}/metrics",
        port
    );
    axum::serve(listener, app).await?;

    Ok(())
}
