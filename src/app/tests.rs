use crate::app::{extension, render_page, show, ErrorPanel, PageState, Session};
use crate::content::Content;
use crate::model::TSModel;
use crate::pages::{Page, Registry};

use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use futures::StreamExt;
use std::sync::Arc;
use tsqc_trees::examples::example_1;

fn model() -> Arc<TSModel> {
    Arc::new(TSModel::new(example_1(), "example_1.trees"))
}

fn bad_site(_: &TSModel) -> Result<Content, Report> {
    Err(eyre!("bad site")).wrap_err("Failed to summarize mutations")
}

fn panics(_: &TSModel) -> Result<Content, Report> {
    panic!("renderer exploded")
}

// ----------------------------------------------------------------------------
// Page loading

#[tokio::test]
async fn show_displays_page() {
    let states: Vec<PageState> = show(model(), Arc::new(Registry::new()), "Overview".to_string()).collect().await;
    assert_eq!(states.len(), 2);
    assert_eq!(states[0], PageState::Loading);
    assert!(!states[0].is_terminal());
    match &states[1] {
        PageState::Displayed(content) => assert!(content.to_html().contains("Overview of example_1.trees")),
        state => panic!("expected displayed page, found {state:?}"),
    }
}

#[tokio::test]
async fn show_captures_error() {
    let registry = Arc::new(Registry::new().with(Page::Mutations, bad_site));
    let states: Vec<PageState> = show(model(), registry, "Mutations".to_string()).collect().await;
    assert_eq!(states.iter().map(|s| s.event_name()).collect::<Vec<_>>(), ["loading", "errored"]);

    let PageState::Errored(panel) = &states[1] else { panic!("expected an error panel") };
    assert_eq!(panel.message, "An error occurred: Failed to summarize mutations");
    assert!(panel.report.contains("bad site"));

    let html = states[1].to_html();
    assert!(html.contains("<h2>Error</h2>"));
    assert!(html.contains("color: red"));
    assert!(html.contains("<pre>"));
}

#[tokio::test]
async fn show_captures_panic() {
    let registry = Arc::new(Registry::new().with(Page::Trees, panics));
    let states: Vec<PageState> = show(model(), registry.clone(), "Trees".to_string()).collect().await;
    let PageState::Errored(panel) = &states[1] else { panic!("expected an error panel") };
    assert!(panel.message.contains("renderer exploded"));

    // the registry is still usable afterwards
    let states: Vec<PageState> = show(model(), registry, "Nodes".to_string()).collect().await;
    assert_eq!(states[1].event_name(), "displayed");
}

#[tokio::test]
async fn show_unknown_page() {
    let states: Vec<PageState> = show(model(), Arc::new(Registry::new()), "Settings".to_string()).collect().await;
    let PageState::Errored(panel) = &states[1] else { panic!("expected an error panel") };
    assert_eq!(panel.message, "An error occurred: Unknown page: \"Settings\"");
}

#[test]
fn render_page_unregistered() {
    let registry = Registry::empty().with(Page::Overview, crate::pages::overview::render);
    let state = render_page(&model(), &registry, "Popgen");
    assert_eq!(state.event_name(), "errored");
    assert_eq!(render_page(&model(), &registry, "Overview").event_name(), "displayed");
}

#[test]
fn error_panel_escapes_html() {
    let panel = ErrorPanel::from_report(&eyre!("<script>\nline two"));
    let html = panel.to_html();
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;<br>line two"));
}

// ----------------------------------------------------------------------------
// Session

#[test]
fn session_from_query() {
    let (model, registry) = (model(), Arc::new(Registry::new()));

    let session = Session::from_query_string(model.clone(), registry.clone(), "?page=Edge%20Explorer&theme=dark");
    assert_eq!(session.page(), Page::EdgeExplorer);
    let session = Session::from_query_string(model.clone(), registry.clone(), "page=Edge+Explorer");
    assert_eq!(session.page(), Page::EdgeExplorer);

    // missing or unknown values fall back to the overview
    assert_eq!(Session::from_query_string(model.clone(), registry.clone(), "").page(), Page::Overview);
    assert_eq!(Session::new(model.clone(), registry.clone(), Some("edges")).page(), Page::Overview);

    let registry = Arc::new(Registry::empty().with(Page::Overview, crate::pages::overview::render));
    assert_eq!(Session::new(model, registry, Some("Trees")).page(), Page::Overview);
}

#[test]
fn session_query_round_trip() {
    let (model, registry) = (model(), Arc::new(Registry::new()));
    let mut session = Session::new(model.clone(), registry.clone(), None);
    for page in Page::all() {
        session.select(page);
        let query = session.query_string();
        assert_eq!(Session::from_query_string(model.clone(), registry.clone(), &query).page(), page);
    }
}

#[test]
fn session_document() {
    let session = Session::new(model(), Arc::new(Registry::new()), Some("Popgen"));
    let html = session.render();

    assert!(html.contains("<title>example_1.trees | QC dashboard</title>"));
    assert!(html.contains(r#"<body data-page="Popgen">"#));
    assert!(html.contains(r#"<label class="active"><input type="radio" name="page" value="Popgen" checked>"#));
    assert!(html.contains(r#"value="Edge Explorer">"#));
    assert!(html.contains("/api/events?page="));
    assert!(html.contains("popstate"));
    assert!(html.contains(&PageState::Loading.to_html()));
    assert!(html.contains(&extension().stylesheet));
    assert_eq!(html.matches("type=\"radio\"").count(), 7);
}

#[tokio::test]
async fn session_show() {
    let session = Session::new(model(), Arc::new(Registry::new()), Some("Edges"));
    let states: Vec<PageState> = session.show().collect().await;
    assert_eq!(states[1].event_name(), "displayed");
}
