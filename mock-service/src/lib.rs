//! A rate-limited mock control plane.
//!
//! Exposes list-networks, list-services and create-network, each behind its own limiter.
//! Rejections carry the same JSON error shape (`{"code", "message"}`) the probe classifies.
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io;
use std::net::SocketAddr;
use std::{
    num::NonZeroU32,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, PoisonError, RwLock,
    },
    time::Duration,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

pub const DEFAULT_PORT: u16 = 3002;

pub const THROTTLING_CODE: &str = "ThrottlingException";
pub const CONFLICT_CODE: &str = "ConflictException";
pub const VALIDATION_CODE: &str = "ValidationException";
pub const INTERNAL_CODE: &str = "InternalServerException";

/// Per-second quotas for each operation, plus an artificial processing delay.
#[derive(Debug, Clone)]
pub struct Limits {
    pub list_networks: NonZeroU32,
    pub list_services: NonZeroU32,
    pub create_network: NonZeroU32,
    pub delay: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            list_networks: nonzero(10),
            list_services: nonzero(10),
            create_network: nonzero(5),
            delay: Duration::ZERO,
        }
    }
}

fn nonzero(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListBody {
    pub items: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NetworkBody {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsBody {
    pub requests: u64,
    pub networks: usize,
}

struct ServiceState {
    list_networks: DefaultDirectRateLimiter,
    list_services: DefaultDirectRateLimiter,
    create_network: DefaultDirectRateLimiter,
    delay: Duration,
    networks: RwLock<BTreeSet<String>>,
    services: Vec<String>,
    requests: AtomicU64,
}

impl ServiceState {
    fn new(limits: Limits) -> Self {
        Self {
            list_networks: rate_limiter(limits.list_networks),
            list_services: rate_limiter(limits.list_services),
            create_network: rate_limiter(limits.create_network),
            delay: limits.delay,
            networks: RwLock::new(BTreeSet::new()),
            services: vec!["checkout".to_string(), "inventory".to_string()],
            requests: AtomicU64::new(0),
        }
    }

    /// Count the request, apply the limiter, then simulate processing time.
    async fn admit(&self, limiter: &DefaultDirectRateLimiter, op: &'static str) -> Result<(), ApiError> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        counter!("mock-service.requests", "op" => op).increment(1);

        if limiter.check().is_err() {
            debug!("Throttling {op}");
            counter!("mock-service.throttled", "op" => op).increment(1);
            return Err(ApiError::Throttled);
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
enum ApiError {
    #[error("Rate exceeded")]
    Throttled,

    #[error("Service network `{0}` already exists")]
    Conflict(String),

    #[error("Service network name must not be empty")]
    EmptyName,

    #[error("State lock is poisoned")]
    PoisonData,
}

impl<T> From<PoisonError<T>> for ApiError {
    fn from(_err: PoisonError<T>) -> Self {
        Self::PoisonData
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use ApiError::*;
        let (status, code) = match &self {
            Throttled => (StatusCode::TOO_MANY_REQUESTS, THROTTLING_CODE),
            Conflict(_) => (StatusCode::CONFLICT, CONFLICT_CODE),
            EmptyName => (StatusCode::BAD_REQUEST, VALIDATION_CODE),
            PoisonData => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_CODE),
        };
        let body = ErrorBody {
            code: code.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(limits: Limits) -> Router {
    Router::new()
        .route("/service-networks", get(list_networks).post(create_network))
        .route("/services", get(list_services))
        .route("/stats", get(stats))
        .with_state(Arc::new(ServiceState::new(limits)))
        .layer(TraceLayer::new_for_http())
}

pub async fn run(addr: SocketAddr, limits: Limits) -> io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve(listener, limits).await
}

pub async fn serve(listener: TcpListener, limits: Limits) -> io::Result<()> {
    debug!("Mock service listening on {:?}", listener.local_addr());
    axum::serve(listener, router(limits)).await
}

/// Serve on an ephemeral localhost port in the background and return its address.
pub async fn spawn(limits: Limits) -> io::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(err) = serve(listener, limits).await {
            error!("Mock service stopped: {err}");
        }
    });
    Ok(addr)
}

async fn list_networks(
    State(state): State<Arc<ServiceState>>,
) -> Result<Json<ListBody>, ApiError> {
    state.admit(&state.list_networks, "list-networks").await?;
    let items = state.networks.read()?.iter().cloned().collect();
    Ok(Json(ListBody { items }))
}

async fn list_services(
    State(state): State<Arc<ServiceState>>,
) -> Result<Json<ListBody>, ApiError> {
    state.admit(&state.list_services, "list-services").await?;
    Ok(Json(ListBody {
        items: state.services.clone(),
    }))
}

async fn create_network(
    State(state): State<Arc<ServiceState>>,
    Json(body): Json<NetworkBody>,
) -> Result<(StatusCode, Json<NetworkBody>), ApiError> {
    state.admit(&state.create_network, "create-network").await?;

    if body.name.trim().is_empty() {
        return Err(ApiError::EmptyName);
    }
    if !state.networks.write()?.insert(body.name.clone()) {
        return Err(ApiError::Conflict(body.name));
    }
    Ok((StatusCode::CREATED, Json(body)))
}

async fn stats(State(state): State<Arc<ServiceState>>) -> Result<Json<StatsBody>, ApiError> {
    Ok(Json(StatsBody {
        requests: state.requests.load(Ordering::Relaxed),
        networks: state.networks.read()?.len(),
    }))
}

/** Utils **/

pub fn rate_limiter(tps: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(tps))
}
