use crate::content::Content;
use crate::model::{Summary, TSModel};
use crate::pages::{Page, Registry};
use crate::server::{router, AppState, HealthResponse, ServerConfig};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use color_eyre::eyre::{eyre, Report, Result};
use http_body_util::BodyExt;
use tower::ServiceExt;
use tsqc_trees::examples::example_1;

fn state(registry: Registry) -> AppState {
    AppState::new(TSModel::new(example_1(), "example_1.trees"), registry)
}

/// Send a GET request, returning the status and the body as text.
async fn get(state: AppState, uri: &str) -> Result<(StatusCode, String), Report> {
    let request = Request::builder().uri(uri).body(Body::empty())?;
    let response = router(state).oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok((status, String::from_utf8(bytes.to_vec())?))
}

fn bad_site(_: &TSModel) -> Result<Content, Report> {
    Err(eyre!("bad site"))
}

#[test]
fn config_default() {
    let config = ServerConfig::default();
    assert_eq!(config.address(), "127.0.0.1:8080");
}

#[tokio::test]
async fn index_honours_page() -> Result<(), Report> {
    let (status, body) = get(state(Registry::new()), "/?page=Edge%20Explorer").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"<body data-page="Edge Explorer">"#));
    assert!(body.contains("<title>example_1.trees | QC dashboard</title>"));

    let (_, body) = get(state(Registry::new()), "/").await?;
    assert!(body.contains(r#"<body data-page="Overview">"#));
    let (_, body) = get(state(Registry::new()), "/?page=Settings").await?;
    assert!(body.contains(r#"<body data-page="Overview">"#));
    // the URL is rewritten to the page actually shown
    assert!(body.contains(r#"history.replaceState({ page: initial }, "", "?page=" + encodeURIComponent(initial));"#));

    let (_, body) = get(state(Registry::new()), "/?theme=dark&page=Edge+Explorer").await?;
    assert!(body.contains(r#"<body data-page="Edge Explorer">"#));
    Ok(())
}

#[tokio::test]
async fn events_stream() -> Result<(), Report> {
    let (status, body) = get(state(Registry::new()), "/api/events?page=Trees").await?;
    assert_eq!(status, StatusCode::OK);

    let events: Vec<&str> = body.lines().filter_map(|line| line.strip_prefix("event: ")).collect();
    assert_eq!(events, ["loading", "displayed"]);
    assert!(body.contains("<h2>Trees</h2>"));
    Ok(())
}

#[tokio::test]
async fn events_error_panel() -> Result<(), Report> {
    let registry = Registry::new().with(Page::Mutations, bad_site);
    let (_, body) = get(state(registry), "/api/events?page=Mutations").await?;

    let events: Vec<&str> = body.lines().filter_map(|line| line.strip_prefix("event: ")).collect();
    assert_eq!(events, ["loading", "errored"]);
    assert!(body.contains("An error occurred: bad site"));
    Ok(())
}

#[tokio::test]
async fn page_statuses() -> Result<(), Report> {
    let (status, body) = get(state(Registry::new()), "/api/page?page=Nodes").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h2>Nodes</h2>"));

    let (status, body) = get(state(Registry::new()), "/api/page?page=Settings").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Unknown page"));

    let registry = Registry::new().with(Page::Mutations, bad_site);
    let (status, body) = get(state(registry), "/api/page?page=Mutations").await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("bad site"));
    Ok(())
}

#[tokio::test]
async fn json_endpoints() -> Result<(), Report> {
    let (_, body) = get(state(Registry::new()), "/api/pages").await?;
    let pages: Vec<String> = serde_json::from_str(&body)?;
    assert_eq!(pages, ["Overview", "Mutations", "Edges", "Edge Explorer", "Trees", "Nodes", "Popgen"]);

    let (_, body) = get(state(Registry::new()), "/api/summary").await?;
    let summary: Summary = serde_json::from_str(&body)?;
    assert_eq!(summary.name, "example_1.trees");
    assert_eq!(summary.num_trees, 2);

    let (_, body) = get(state(Registry::new()), "/api/health").await?;
    let health: HealthResponse = serde_json::from_str(&body)?;
    assert_eq!(health.status, "ok");
    Ok(())
}
