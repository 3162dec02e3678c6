//! HTTP server: a fresh [`Session`] per client over the shared dataset.
//!
//! | Route              | Response                                              |
//! |--------------------|-------------------------------------------------------|
//! | `/?page=`          | the session document                                  |
//! | `/api/events?page=`| server-sent `loading`, then `displayed` or `errored`  |
//! | `/api/page?page=`  | the terminal page state as an HTML fragment           |
//! | `/api/pages`       | page names in sidebar order                           |
//! | `/api/summary`     | dataset [`Summary`](crate::model::Summary)            |
//! | `/api/health`      | `{"status": "ok"}`                                    |

#[cfg(test)]
mod tests;

use crate::app::{self, PageState, Session};
use crate::cli::ServeArgs;
use crate::model::{Summary, TSModel};
use crate::pages::{Page, Registry};
use axum::{
    extract::{Query, RawQuery, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Json, Response,
    },
    routing::get,
    Router,
};
use color_eyre::eyre::{Report, Result, WrapErr};
use color_eyre::Help;
use futures::stream::{Stream, StreamExt};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Address the server listens on.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig { host: "127.0.0.1".to_string(), port: 8080 }
    }
}

impl From<&ServeArgs> for ServerConfig {
    fn from(args: &ServeArgs) -> Self {
        ServerConfig { host: args.host.clone(), port: args.port }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ----------------------------------------------------------------------------
// State
// ----------------------------------------------------------------------------

/// Shared by every handler, read-only.
#[derive(Clone, Debug)]
pub struct AppState {
    pub model: Arc<TSModel>,
    pub registry: Arc<Registry>,
}

impl AppState {
    pub fn new(model: TSModel, registry: Registry) -> Self {
        AppState { model: Arc::new(model), registry: Arc::new(registry) }
    }
}

/// The `page` URL parameter.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// The requested page name, or the default page.
    fn name(self) -> String {
        self.page.unwrap_or_else(|| Page::default().to_string())
    }
}

// ----------------------------------------------------------------------------
// Server
// ----------------------------------------------------------------------------

/// Returns the [`Router`] of every route.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/events", get(events_handler))
        .route("/api/page", get(page_handler))
        .route("/api/pages", get(pages_handler))
        .route("/api/summary", get(summary_handler))
        .route("/api/health", get(health_handler))
        .with_state(state)
}

/// Serve the dataset until Ctrl+C.
pub async fn run_server(model: TSModel, config: ServerConfig) -> Result<(), Report> {
    app::extension();
    let name = model.name.clone();
    let state = AppState::new(model, Registry::new());

    let address = config.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .wrap_err(format!("Failed to listen on {address}"))
        .suggestion("Choose another port with --port, or stop the process using it.")?;

    info!("Serving {name} at http://{address}");
    info!("Press Ctrl+C to stop");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("Server failed")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => warn!("Failed to listen for Ctrl+C: {e}"),
    }
}

// ----------------------------------------------------------------------------
// Handlers
// ----------------------------------------------------------------------------

/// GET / - a new session seeded from the `page` parameter.
async fn index_handler(State(state): State<AppState>, RawQuery(query): RawQuery) -> Html<String> {
    let session = Session::from_query_string(state.model, state.registry, query.as_deref().unwrap_or_default());
    Html(session.render())
}

/// GET /api/events - the page-loading stream as server-sent events.
async fn events_handler(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = app::show(state.model, state.registry, query.name())
        .map(|page| Ok::<Event, Infallible>(Event::default().event(page.event_name()).data(page.to_html())));
    Sse::new(stream).keep_alive(KeepAlive::new())
}

/// GET /api/page - the terminal state of a page, without streaming.
async fn page_handler(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Response {
    let name = query.name();
    let status = match state.registry.parse(&name) {
        Some(_) => StatusCode::OK,
        None => StatusCode::NOT_FOUND,
    };
    let page = app::load(state.model, state.registry, name).await;
    let status = match page {
        PageState::Errored(_) if status == StatusCode::OK => StatusCode::INTERNAL_SERVER_ERROR,
        _ => status,
    };
    (status, Html(page.to_html())).into_response()
}

/// GET /api/pages - registered page names, in sidebar order.
async fn pages_handler(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.registry.pages().iter().map(|page| page.to_string()).collect())
}

/// GET /api/summary - headline counts of the dataset.
async fn summary_handler(State(state): State<AppState>) -> Json<Summary> {
    Json(state.model.summary())
}

/// GET /api/health
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".to_string() })
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
}
