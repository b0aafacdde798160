use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, HeaderValue, StatusCode}, routing::{get, post}, Json, Router};
use feedsearch_core::day::parse_day;
use feedsearch_core::persist::{load_index, IndexPaths};
use feedsearch_core::{evaluate, DocId, Document, InvertedIndex};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Comma-separated term lists and `YYYY-MM-DD` days, all optional.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub in_title: Option<String>,
    pub not_in_title: Option<String>,
    pub in_description: Option<String>,
    pub not_in_description: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl SearchParams {
    pub fn to_query(&self) -> Result<feedsearch_core::Query> {
        Ok(feedsearch_core::Query {
            title_must_include: split_terms(self.in_title.as_deref()),
            title_must_exclude: split_terms(self.not_in_title.as_deref()),
            description_must_include: split_terms(self.in_description.as_deref()),
            description_must_exclude: split_terms(self.not_in_description.as_deref()),
            start: self.start.as_deref().map(parse_day).transpose()?,
            end: self.end.as_deref().map(parse_day).transpose()?,
        })
    }
}

fn split_terms(raw: Option<&str>) -> BTreeSet<String> {
    raw.map(|s| s.split(',').map(str::trim).filter(|t| !t.is_empty()).map(String::from).collect())
        .unwrap_or_default()
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub took_ms: u128,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub title: String,
    pub description: String,
    pub published: String,
}

impl SearchHit {
    fn new(doc_id: DocId, doc: &Document) -> Self {
        let published = doc.published.format(&Rfc3339).unwrap_or_else(|_| doc.published.to_string());
        Self { doc_id, title: doc.title.clone(), description: doc.description.clone(), published }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub index_paths_root: PathBuf,
    /// Current snapshot. Readers clone the `Arc` and release the lock before evaluating.
    pub index: Arc<RwLock<Arc<InvertedIndex>>>,
    pub admin_token: Option<String>,
}

impl AppState {
    fn snapshot(&self) -> Arc<InvertedIndex> {
        self.index.read().clone()
    }
}

pub fn build_app(index_dir: String) -> Result<Router> {
    let index = load_index(&IndexPaths::new(&index_dir))?;
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let app_state = AppState {
        index_paths_root: PathBuf::from(&index_dir),
        index: Arc::new(RwLock::new(Arc::new(index))),
        admin_token,
    };

    let cors = cors_layer(std::env::var("CORS_ALLOW_ORIGIN").ok().as_deref());

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/index/reload", post(index_reload))
        .with_state(app_state)
        .layer(cors);
    Ok(app)
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let query = params.to_query().map_err(|e| (StatusCode::BAD_REQUEST, format!("{e:#}")))?;
    let index = state.snapshot();
    let ids = evaluate(&index, &query);
    let results: Vec<SearchHit> = index
        .resolve_sorted_by_title(&ids)
        .into_iter()
        .map(|(doc_id, doc)| SearchHit::new(doc_id, doc))
        .collect();
    let elapsed = start.elapsed();
    tracing::debug!(hits = results.len(), took_s = elapsed.as_secs_f64(), "search");
    Ok(Json(SearchResponse { took_ms: elapsed.as_millis(), took_s: elapsed.as_secs_f64(), total_hits: results.len(), results }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<DocId>) -> Result<Json<SearchHit>, (StatusCode, String)> {
    let index = state.snapshot();
    match index.document(doc_id) {
        Some(doc) => Ok(Json(SearchHit::new(doc_id, doc))),
        None => Err((StatusCode::NOT_FOUND, "not found".into())),
    }
}

/// Re-read the index from disk and swap it in. The old snapshot keeps serving if loading fails.
async fn index_reload(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let root = state.index_paths_root.clone();
    let loaded = tokio::task::spawn_blocking(move || load_index(&IndexPaths::new(root)))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let index = match loaded {
        Ok(index) => index,
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "index reload failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, format!("reload failed: {e:#}")));
        }
    };
    let num_docs = index.num_docs();
    *state.index.write() = Arc::new(index);
    tracing::info!(num_docs, "index reloaded");
    Ok(Json(serde_json::json!({ "num_docs": num_docs })))
}

/// Origins listed in `allow` (comma-separated). Any origin when the list is absent, empty, or contains `*`.
pub fn cors_layer(allow: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allow
        .into_iter()
        .flat_map(|val| val.split(','))
        .filter_map(|origin| HeaderValue::from_str(origin.trim()).ok())
        .filter(|origin| !origin.is_empty())
        .collect();
    let wildcard = origins.iter().any(|o| o == "*");
    let origin = if origins.is_empty() || wildcard { AllowOrigin::any() } else { AllowOrigin::list(origins) };
    CorsLayer::new().allow_origin(origin).allow_methods(Any).allow_headers(Any)
}

const ADMIN_HEADER: &str = "x-admin-token";

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err((StatusCode::UNAUTHORIZED, "reload disabled: ADMIN_TOKEN not set".into()));
    };
    match headers.get(ADMIN_HEADER).map(HeaderValue::as_bytes) {
        Some(given) if given == expected.as_bytes() => Ok(()),
        Some(_) => Err((StatusCode::UNAUTHORIZED, "invalid admin token".into())),
        None => Err((StatusCode::UNAUTHORIZED, format!("missing {ADMIN_HEADER} header"))),
    }
}
