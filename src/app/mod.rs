//! Per-client [`Session`]s and the page-loading protocol.
//!
//! Selecting a page produces a short stream of [`PageState`]s: [`PageState::Loading`]
//! straight away, then either [`PageState::Displayed`] or [`PageState::Errored`] once
//! the page renderer returns.

pub mod template;

#[cfg(test)]
mod tests;

#[doc(inline)]
pub use template::{extension, Extension, Template};

use crate::content::Content;
use crate::model::TSModel;
use crate::pages::{Page, Registry};
use crate::utils::{escape_html, strip_ansi};
use color_eyre::eyre::{eyre, Report};
use futures::stream::{self, Stream, StreamExt};
use indoc::formatdoc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

// ----------------------------------------------------------------------------
// PageState
// ----------------------------------------------------------------------------

/// What the main area of a session shows.
#[derive(Clone, Debug, PartialEq)]
pub enum PageState {
    /// The renderer is running.
    Loading,
    /// The renderer returned content.
    Displayed(Content),
    /// The renderer failed, panicked, or the page is unknown.
    Errored(ErrorPanel),
}

impl PageState {
    /// Name of the server-sent event carrying this state.
    pub fn event_name(&self) -> &'static str {
        match self {
            PageState::Loading => "loading",
            PageState::Displayed(_) => "displayed",
            PageState::Errored(_) => "errored",
        }
    }

    /// [`PageState::Displayed`] and [`PageState::Errored`] end a page load.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PageState::Loading)
    }

    /// Render the state as an HTML fragment for the main area.
    pub fn to_html(&self) -> String {
        match self {
            PageState::Loading => {
                r#"<div class="loading"><div class="spinner"></div><p>Loading...</p></div>"#.to_string()
            }
            PageState::Displayed(content) => content.to_html(),
            PageState::Errored(panel) => panel.to_html(),
        }
    }
}

// ----------------------------------------------------------------------------
// ErrorPanel
// ----------------------------------------------------------------------------

/// A failed page, shown in place of its content.
///
/// ## Examples
///
/// ```rust
/// use color_eyre::eyre::{eyre, WrapErr};
/// use tsqc::app::ErrorPanel;
///
/// let report = Err::<(), _>(eyre!("bad site")).wrap_err("Failed to render page").unwrap_err();
/// let panel  = ErrorPanel::from_report(&report);
/// assert_eq!(panel.message, "An error occurred: Failed to render page");
/// assert!(panel.report.contains("bad site"));
/// assert!(panel.to_html().contains("<pre>"));
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ErrorPanel {
    /// One-line summary.
    pub message: String,
    /// The full report, including the chain of causes.
    pub report: String,
}

impl ErrorPanel {
    pub fn from_report(report: &Report) -> Self {
        ErrorPanel {
            message: format!("An error occurred: {report}"),
            report: strip_ansi(&format!("{report:?}")),
        }
    }

    pub fn to_html(&self) -> String {
        let message = escape_html(&self.message);
        let report = escape_html(&self.report).replace('\n', "<br>");
        formatdoc! {r#"
            <div class="error-panel" style="color: red;">
              <h2>Error</h2>
              <p>{message}</p>
              <pre>{report}</pre>
            </div>"#,
            message = message,
            report = report,
        }
    }
}

// ----------------------------------------------------------------------------
// Page loading
// ----------------------------------------------------------------------------

/// Render the page named `page`, capturing any failure in an [`ErrorPanel`].
///
/// Runs on the calling thread. Panics are not caught here, see [`load`].
pub fn render_page(model: &TSModel, registry: &Registry, page: &str) -> PageState {
    let result = registry.lookup(page).and_then(|(_, renderer)| renderer(model));
    match result {
        Ok(content) => PageState::Displayed(content),
        Err(e) => {
            warn!("Failed to load page {page}: {e}");
            PageState::Errored(ErrorPanel::from_report(&e))
        }
    }
}

/// Render a page on the blocking thread pool, returning its terminal state.
///
/// ## Examples
///
/// ```rust
/// # use tokio_test::block_on;
/// use std::sync::Arc;
/// use tsqc::app::{load, PageState};
/// use tsqc::{model::TSModel, pages::Registry};
///
/// let model    = Arc::new(TSModel::new(tsqc_trees::examples::example_1(), "example.trees"));
/// let registry = Arc::new(Registry::new());
/// let state    = block_on(load(model, registry, "Trees".to_string()));
/// assert!(matches!(state, PageState::Displayed(_)));
/// ```
pub async fn load(model: Arc<TSModel>, registry: Arc<Registry>, page: String) -> PageState {
    let name = page.clone();
    let task = tokio::task::spawn_blocking(move || {
        let start = Instant::now();
        let state = render_page(&model, &registry, &page);
        if let PageState::Displayed(_) = state {
            info!("Loaded page {page} in {:.2}s", start.elapsed().as_secs_f64());
        }
        state
    });

    match task.await {
        Ok(state) => state,
        Err(e) => {
            let reason = match e.try_into_panic() {
                Ok(payload) => panic_message(payload),
                Err(e) => e.to_string(),
            };
            let report = eyre!("Page {name} panicked: {reason}");
            warn!("{report}");
            PageState::Errored(ErrorPanel::from_report(&report))
        }
    }
}

/// Show a page: [`PageState::Loading`] first, then the terminal state.
///
/// The stream is lazy; nothing is logged or rendered until it is polled.
///
/// ## Examples
///
/// ```rust
/// # use tokio_test::block_on;
/// use futures::StreamExt;
/// use std::sync::Arc;
/// use tsqc::app::{show, PageState};
/// use tsqc::{model::TSModel, pages::Registry};
///
/// let model    = Arc::new(TSModel::new(tsqc_trees::examples::example_1(), "example.trees"));
/// let registry = Arc::new(Registry::new());
/// let states: Vec<PageState> = block_on(show(model, registry, "Settings".to_string()).collect());
///
/// assert_eq!(states.len(), 2);
/// assert_eq!(states[0], PageState::Loading);
/// assert_eq!(states[1].event_name(), "errored");
/// ```
pub fn show(model: Arc<TSModel>, registry: Arc<Registry>, page: String) -> impl Stream<Item = PageState> {
    let name = page.clone();
    let loading = stream::once(async move {
        info!("Showing page {name}");
        PageState::Loading
    });
    loading.chain(stream::once(load(model, registry, page)))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&str>() {
            Ok(message) => message.to_string(),
            Err(_) => "unknown panic".to_string(),
        },
    }
}

// ----------------------------------------------------------------------------
// Session
// ----------------------------------------------------------------------------

/// One client's view of the shared dataset: the selected page.
///
/// The selection is seeded from and mirrored into the `page` URL parameter.
///
/// ## Examples
///
/// ```rust
/// use std::sync::Arc;
/// use tsqc::app::Session;
/// use tsqc::{model::TSModel, pages::Page, pages::Registry};
///
/// let model    = Arc::new(TSModel::new(tsqc_trees::examples::example_1(), "example.trees"));
/// let registry = Arc::new(Registry::new());
///
/// let mut session = Session::new(model.clone(), registry.clone(), Some("Trees"));
/// assert_eq!(session.page(), Page::Trees);
///
/// session.select(Page::EdgeExplorer);
/// assert_eq!(session.query_string(), "page=Edge%20Explorer");
///
/// let session = Session::from_query_string(model, registry, "page=Nope");
/// assert_eq!(session.page(), Page::Overview);
/// ```
#[derive(Clone, Debug)]
pub struct Session {
    model: Arc<TSModel>,
    registry: Arc<Registry>,
    page: Page,
}

impl Session {
    /// Returns a new [`Session`] showing the page named by the (decoded) `page` query value.
    ///
    /// Falls back to the default page when the value is missing or not a registered page.
    pub fn new(model: Arc<TSModel>, registry: Arc<Registry>, page: Option<&str>) -> Self {
        let page = match page {
            Some(name) => registry.parse(name).unwrap_or_else(|| {
                debug!("Ignoring unknown page in URL: {name:?}");
                Page::default()
            }),
            None => Page::default(),
        };
        Session { model, registry, page }
    }

    /// Returns a new [`Session`] from a raw URL query string such as `page=Edge%20Explorer`.
    pub fn from_query_string(model: Arc<TSModel>, registry: Arc<Registry>, query: &str) -> Self {
        let query = query.trim_start_matches('?');
        let value = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "page")
            .map(|(_, value)| value.replace('+', " "));
        let page = value.as_deref().and_then(|value| urlencoding::decode(value).ok());
        Session::new(model, registry, page.as_deref())
    }

    pub fn page(&self) -> Page {
        self.page
    }

    /// Select `page`, as the sidebar does.
    pub fn select(&mut self, page: Page) {
        debug!("Selected page {page}");
        self.page = page;
    }

    /// The URL query mirroring the current selection.
    pub fn query_string(&self) -> String {
        format!("page={}", urlencoding::encode(self.page.as_ref()))
    }

    /// Load the selected page, see [`show`].
    pub fn show(&self) -> impl Stream<Item = PageState> {
        show(self.model.clone(), self.registry.clone(), self.page.to_string())
    }

    /// Render the full HTML document of the session.
    ///
    /// The main area starts as the loading placeholder; the client script then
    /// streams the selected page from `/api/events`.
    pub fn render(&self) -> String {
        let template = Template::new(&self.model.name);
        template.render(&self.registry.pages(), self.page, &PageState::Loading.to_html())
    }
}
