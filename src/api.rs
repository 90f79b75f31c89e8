//! JSON API consumed by the UI collaborator

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::attractions::AttractionExtractor;
use crate::config::AssistantConfig;
use crate::events::EventFetcher;
use crate::images::ImageSearch;
use crate::llm::{ChatModel, OpenAiChatModel};
use crate::location_resolver::LocationResolver;
use crate::models::{AttractionGroup, AttractionRecord, EventBatch, LocationResolution};
use crate::planner::{TripPlan, TripPlanner, TripRequest};
use crate::session::{PlanSession, QueryToken};
use crate::trip::{Hemisphere, Season, parse_date};
use crate::TravelAssistantError;

/// Overrides the configured model key for one request
pub const MODEL_KEY_HEADER: &str = "x-model-api-key";
/// Overrides the configured ticketing key for one request
pub const TICKETING_KEY_HEADER: &str = "x-ticketing-api-key";

const DEFAULT_SESSION: &str = "default";

/// Shared state of the API handlers
#[derive(Clone)]
pub struct AppState {
    config: Arc<AssistantConfig>,
    client: Client,
    sessions: Sessions,
}

impl AppState {
    #[must_use]
    pub fn new(config: AssistantConfig, client: Client) -> Self {
        Self {
            config: Arc::new(config),
            client,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn header_key(headers: &HeaderMap, name: &str) -> Option<String> {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    fn model(&self, headers: &HeaderMap) -> Result<Arc<dyn ChatModel>, TravelAssistantError> {
        let model = match Self::header_key(headers, MODEL_KEY_HEADER) {
            Some(key) => OpenAiChatModel::new(self.client.clone(), key, &self.config.model)?,
            None => OpenAiChatModel::from_config(self.client.clone(), &self.config.model)?,
        };
        Ok(Arc::new(model))
    }

    fn event_fetcher(&self, headers: &HeaderMap) -> Result<EventFetcher, TravelAssistantError> {
        match Self::header_key(headers, TICKETING_KEY_HEADER) {
            Some(key) => EventFetcher::new(self.client.clone(), key, &self.config.ticketing),
            None => EventFetcher::from_config(self.client.clone(), &self.config.ticketing),
        }
    }

    fn extractor(&self, model: Arc<dyn ChatModel>) -> AttractionExtractor {
        AttractionExtractor::new(model, self.config.model.timeout())
    }

    fn image_search(&self) -> ImageSearch {
        ImageSearch::new(self.client.clone(), &self.config.images)
    }

    /// Start a query in session `id`, superseding the session's previous one
    fn begin_query(&self, id: &str) -> (SessionLease, QueryToken) {
        let mut sessions = lock_sessions(&self.sessions);
        let session = sessions
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(PlanSession::new()))
            .clone();
        // begin under the lock so a finishing query cannot drop the entry
        // between lookup and begin
        let token = session.begin();
        let lease = SessionLease {
            sessions: self.sessions.clone(),
            id: id.to_string(),
            session,
            query: token.id(),
        };
        (lease, token)
    }
}

type Sessions = Arc<Mutex<HashMap<String, Arc<PlanSession>>>>;

fn lock_sessions(sessions: &Sessions) -> MutexGuard<'_, HashMap<String, Arc<PlanSession>>> {
    sessions.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes the session entry when the latest query of the session ends,
/// whether it completed, failed or the client went away
struct SessionLease {
    sessions: Sessions,
    id: String,
    session: Arc<PlanSession>,
    query: u64,
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        if !self.session.is_current(self.query) {
            return;
        }
        let mut sessions = lock_sessions(&self.sessions);
        let same_session = sessions
            .get(&self.id)
            .is_some_and(|session| Arc::ptr_eq(session, &self.session));
        if same_session && self.session.is_current(self.query) {
            sessions.remove(&self.id);
        }
    }
}

/// Error response wrapper
pub struct ApiError(TravelAssistantError);

impl From<TravelAssistantError> for ApiError {
    fn from(err: TravelAssistantError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            TravelAssistantError::Validation { .. } => StatusCode::BAD_REQUEST,
            TravelAssistantError::Config { .. } => StatusCode::PRECONDITION_FAILED,
            TravelAssistantError::Cancelled => StatusCode::CONFLICT,
            TravelAssistantError::Transport { .. }
            | TravelAssistantError::MalformedResponse { .. } => StatusCode::BAD_GATEWAY,
            TravelAssistantError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        };
        let body = json!({
            "error": self.0.user_message(),
            "detail": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub location: String,
    #[serde(default)]
    pub topic: String,
    /// `YYYY-MM-DD`, defaults to today
    pub date: Option<String>,
    pub max_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TextBody {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SuggestBody {
    pub location: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub suggestions: String,
}

#[derive(Debug, Serialize)]
pub struct AttractionsResponse {
    pub groups: Vec<AttractionGroup>,
    pub failed_lines: usize,
    pub attractions: Vec<AttractionRecord>,
}

#[derive(Debug, Deserialize)]
pub struct ImagesQuery {
    pub keyword: String,
    /// First travel day, picks the season
    pub start: Option<String>,
    /// Destination latitude, picks the hemisphere
    pub latitude: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ImagesResponse {
    pub season: Option<Season>,
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/events", get(get_events))
        .route("/location", post(resolve_location))
        .route("/attractions", post(extract_attractions))
        .route("/attractions/suggest", post(suggest_attractions))
        .route("/images", get(get_images))
        .route("/plan", post(plan_trip))
        .with_state(state)
}

async fn get_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<EventsQuery>,
) -> ApiResult<EventBatch> {
    let fetcher = state.event_fetcher(&headers)?;
    let date = match query.date.as_deref() {
        Some(date) => parse_date(date)?,
        None => Utc::now().date_naive(),
    };
    let max_results = query
        .max_results
        .unwrap_or(state.config.ticketing.max_results);
    let batch = fetcher
        .try_fetch_events(&query.location, &query.topic, date, max_results)
        .await?;
    Ok(Json(batch))
}

async fn resolve_location(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TextBody>,
) -> ApiResult<LocationResolution> {
    let resolver = LocationResolver::new(state.model(&headers)?);
    Ok(Json(resolver.resolve_location(&body.text).await?))
}

async fn suggest_attractions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SuggestBody>,
) -> ApiResult<SuggestResponse> {
    let extractor = state.extractor(state.model(&headers)?);
    let suggestions = extractor.suggest_attractions(&body.location).await?;
    Ok(Json(SuggestResponse { suggestions }))
}

async fn extract_attractions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TextBody>,
) -> ApiResult<AttractionsResponse> {
    let extractor = state.extractor(state.model(&headers)?);
    let extraction = extractor.extract_attraction_groups(&body.text).await;
    Ok(Json(AttractionsResponse {
        attractions: extraction.attractions(),
        groups: extraction.groups,
        failed_lines: extraction.failed_lines,
    }))
}

async fn get_images(
    State(state): State<AppState>,
    Query(query): Query<ImagesQuery>,
) -> ApiResult<ImagesResponse> {
    let hemisphere = query
        .latitude
        .map_or(Hemisphere::North, Hemisphere::from_latitude);
    let season = match query.start.as_deref() {
        Some(start) => Some(Season::for_date(parse_date(start)?, hemisphere)),
        None => None,
    };
    let images = state.image_search().search(&query.keyword, season).await?;
    Ok(Json(ImagesResponse { season, images }))
}

async fn plan_trip(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SessionQuery>,
    Json(request): Json<TripRequest>,
) -> ApiResult<TripPlan> {
    let model = state.model(&headers)?;
    let events = match state.event_fetcher(&headers) {
        Ok(fetcher) => Some(fetcher),
        Err(_) if !request.include_events => None,
        Err(e) => return Err(e.into()),
    };
    let planner = TripPlanner::new(
        LocationResolver::new(model.clone()),
        state.extractor(model),
        events,
        state.image_search(),
    )
    .with_default_max_events(state.config.ticketing.max_results);

    let (_lease, mut token) =
        state.begin_query(query.session.as_deref().unwrap_or(DEFAULT_SESSION));
    Ok(Json(planner.plan_in(&request, &mut token).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::new(AssistantConfig::default(), Client::new())
    }

    fn session_count(state: &AppState) -> usize {
        lock_sessions(&state.sessions).len()
    }

    #[test]
    fn test_finished_query_releases_session() {
        let state = state();
        let (lease, token) = state.begin_query("tab-1");
        assert!(token.is_current());
        assert_eq!(session_count(&state), 1);

        drop(lease);
        assert_eq!(session_count(&state), 0);
    }

    #[test]
    fn test_superseded_query_keeps_session_for_newer_one() {
        let state = state();
        let (older, older_token) = state.begin_query("tab-1");
        let (newer, newer_token) = state.begin_query("tab-1");
        assert!(!older_token.is_current());
        assert!(newer_token.is_current());

        drop(older);
        assert_eq!(session_count(&state), 1);

        let (other, _) = state.begin_query("tab-2");
        assert_eq!(session_count(&state), 2);

        drop(newer);
        drop(other);
        assert_eq!(session_count(&state), 0);
    }

    #[test]
    fn test_session_after_release_starts_fresh() {
        let state = state();
        let (lease, _) = state.begin_query("tab-1");
        drop(lease);

        let (_lease, token) = state.begin_query("tab-1");
        assert!(token.is_current());
        assert_eq!(token.id(), 1);
        assert_eq!(session_count(&state), 1);
    }
}
