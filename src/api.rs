//! HTTP routes.
//!
//! # Endpoints
//!
//! - `GET /` and `GET /health`
//! - `GET /encyclopedia/:category?language=<code>` lists entries
//! - `GET /encyclopedia/:category/:scientificName?language=<code>` shows one
//!   entry, translating missing fields first
//! - `POST /encyclopedia/import/:category` replaces a category
//! - `GET /content?lang=<code>&components=<a,b>` serves static page content
//!
//! Errors are JSON: `{ "error": "Not Found", "message": "..." }`.

use crate::content::{parse_components, ContentResponse, ContentStore, DEFAULT_CONTENT_LANG};
use crate::error::ApiError;
use crate::i18n::{Language, MetricsReport};
use crate::models::Category;
use crate::presentation::{Presented, Summary};
use crate::security::import_key_matches;
use crate::service::EncyclopediaService;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Largest accepted request body (bulk imports).
pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

const API_KEY_HEADER: &str = "x-api-key";

/// Shared state for all route handlers.
pub struct AppState {
    pub service: EncyclopediaService,
    pub content: ContentStore,
    pub import_api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LanguageQuery {
    language: Option<String>,
}

impl LanguageQuery {
    fn resolve(&self) -> Language {
        Language::resolve_or_default(self.language.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    lang: Option<String>,
    components: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    translation: MetricsReport,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    success: bool,
    inserted: usize,
}

/// Build the application router.
pub fn router(state: Arc<AppState>, accepted_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/content", get(content))
        .route("/encyclopedia/import/:category", post(import))
        .route("/encyclopedia/:category", get(list))
        .route("/encyclopedia/:category/:id", get(detail))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors_layer(accepted_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured origins, with credentials.
fn cors_layer(accepted_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = accepted_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    info!("CORS allows {} origin(s)", origins.len());

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)])
        .allow_credentials(true)
}

async fn root() -> &'static str {
    "Hello from the backend!"
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        translation: state.service.metrics().report(),
    })
}

async fn list(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    Query(query): Query<LanguageQuery>,
) -> Result<Json<Vec<Summary>>, ApiError> {
    let category: Category = category.parse()?;
    let summaries = state.service.list(category, query.resolve()).await?;
    Ok(Json(summaries))
}

async fn detail(
    State(state): State<Arc<AppState>>,
    Path((category, id)): Path<(String, String)>,
    Query(query): Query<LanguageQuery>,
) -> Result<Json<Presented>, ApiError> {
    let category: Category = category.parse()?;
    let presented = state.service.detail(category, &id, query.resolve()).await?;
    Ok(Json(presented))
}

async fn import(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<ImportResponse>), ApiError> {
    let presented = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    if !import_key_matches(state.import_api_key.as_deref(), presented) {
        warn!("Rejected import without a valid API key");
        return Err(ApiError::Unauthorized("Invalid or missing API key.".to_string()));
    }

    let category: Category = category.parse()?;

    // Anything that is not JSON counts as no data
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let inserted = state.service.import(category, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ImportResponse {
            success: true,
            inserted,
        }),
    ))
}

async fn content(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ContentQuery>,
) -> Result<Json<ContentResponse>, ApiError> {
    let components = parse_components(query.components.as_deref())?;
    let lang = query
        .lang
        .as_deref()
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .unwrap_or(DEFAULT_CONTENT_LANG);

    let response = state.content.load(lang, &components).await?;
    Ok(Json(response))
}
