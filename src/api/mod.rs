use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use rand::RngExt;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::chat::ChatBackend;
use crate::config::{ResolverConfig, ServerConfig};
use crate::geocoding::Geocoder;
use crate::models::MarkerView;
use crate::resolver::{BatchScheduler, Resolver};
use crate::session::{ChatMessage, TripSession, TripSnapshot};
use crate::{LawanderError, VERSION};

struct LiveTrip {
    session: Arc<Mutex<TripSession>>,
    touched: Instant,
}

/// Shared services and the live trip sessions
pub struct AppState {
    geocoder: Arc<dyn Geocoder>,
    chat: Arc<dyn ChatBackend>,
    resolver: ResolverConfig,
    session_idle: Duration,
    max_sessions: usize,
    sessions: RwLock<HashMap<String, LiveTrip>>,
}

impl AppState {
    #[must_use]
    pub fn new(geocoder: Arc<dyn Geocoder>, chat: Arc<dyn ChatBackend>, resolver: ResolverConfig) -> Self {
        let server = ServerConfig::default();
        Self {
            geocoder,
            chat,
            resolver,
            session_idle: server.session_idle(),
            max_sessions: server.max_sessions,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Expire trips idle for `idle` and keep at most `max` alive
    #[must_use]
    pub fn with_session_limits(mut self, idle: Duration, max: usize) -> Self {
        self.session_idle = idle;
        self.max_sessions = max.max(1);
        self
    }

    fn scheduler(&self) -> BatchScheduler {
        BatchScheduler::new(Resolver::new(self.geocoder.clone(), self.resolver.clone()))
    }

    async fn session(&self, id: &str) -> Result<Arc<Mutex<TripSession>>, ApiError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(trip) if trip.touched.elapsed() <= self.session_idle => {
                trip.touched = Instant::now();
                Ok(trip.session.clone())
            }
            Some(_) => {
                sessions.remove(id);
                debug!("Trip {} expired", id);
                Err(ApiError::NotFound(format!("No trip with id '{id}'")))
            }
            None => Err(ApiError::NotFound(format!("No trip with id '{id}'"))),
        }
    }

    /// Store a new trip, dropping idle ones and the least recently used
    /// beyond the cap
    async fn insert(&self, id: String, session: TripSession) {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, trip| trip.touched.elapsed() <= self.session_idle);

        while sessions.len() >= self.max_sessions {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, trip)| trip.touched)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            sessions.remove(&oldest);
        }

        if sessions.len() < before {
            info!("Dropped {} idle trips", before - sessions.len());
        }
        sessions.insert(
            id,
            LiveTrip {
                session: Arc::new(Mutex::new(session)),
                touched: Instant::now(),
            },
        );
    }
}

#[derive(Deserialize)]
pub struct CreateTripRequest {
    pub destination: String,
    pub days: u32,
}

#[derive(Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct TripResponse {
    pub id: String,
    #[serde(flatten)]
    pub trip: TripSnapshot,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub reply: ChatMessage,
    pub markers: Vec<MarkerView>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub enum ApiError {
    NotFound(String),
    Engine(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Engine(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Engine(err) => match err.downcast_ref::<LawanderError>() {
                Some(e @ LawanderError::Validation { .. }) => (StatusCode::BAD_REQUEST, e.user_message()),
                Some(e @ (LawanderError::Geocoding { .. } | LawanderError::Chat { .. })) => {
                    (StatusCode::BAD_GATEWAY, e.user_message())
                }
                Some(e) => {
                    warn!("Request failed: {:#}", err);
                    (StatusCode::INTERNAL_SERVER_ERROR, e.user_message())
                }
                None => {
                    warn!("Request failed: {:#}", err);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
                }
            },
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/trips", post(create_trip))
        .route("/trips/{id}", get(get_trip).delete(delete_trip))
        .route("/trips/{id}/messages", post(post_message))
        .with_state(state)
}

fn new_trip_id() -> String {
    format!("{:016x}", rand::rng().random_range(0..u64::MAX))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: VERSION,
    })
}

async fn create_trip(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTripRequest>,
) -> Result<(StatusCode, Json<TripResponse>), ApiError> {
    let session = TripSession::start(
        &request.destination,
        request.days,
        state.scheduler(),
        state.chat.clone(),
    )
    .await?;

    let id = new_trip_id();
    let trip = session.snapshot();
    state.insert(id.clone(), session).await;
    info!("Trip {} started for {}", id, request.destination);

    Ok((StatusCode::CREATED, Json(TripResponse { id, trip })))
}

async fn get_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TripResponse>, ApiError> {
    let session = state.session(&id).await?;
    let trip = session.lock().await.snapshot();
    Ok(Json(TripResponse { id, trip }))
}

async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let session = state.session(&id).await?;
    let mut session = session.lock().await;

    let reply = session.ask(&request.message).await?.clone();
    let markers = session.markers().views(&session.destination().city);
    Ok(Json(MessageResponse { reply, markers }))
}

async fn delete_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    match state.sessions.write().await.remove(&id) {
        Some(_) => {
            info!("Trip {} discarded", id);
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::NotFound(format!("No trip with id '{id}'"))),
    }
}
