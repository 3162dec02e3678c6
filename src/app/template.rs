//! The HTML document around a session: header, sidebar selector and main area.

use crate::pages::Page;
use crate::utils::escape_html;
use indoc::{formatdoc, indoc};
use log::debug;
use std::sync::OnceLock;

/// Name of the dashboard, shown before the dataset title.
pub const SITE: &str = "QC dashboard";
/// Color of the header and the active sidebar entry.
pub const ACCENT_COLOR: &str = "#0072B5";

// ----------------------------------------------------------------------------
// Extension
// ----------------------------------------------------------------------------

/// Display assets shared by every session.
#[derive(Debug)]
pub struct Extension {
    /// Stylesheet of the template and the page content.
    pub stylesheet: String,
    /// Client script making tables sortable by clicking a column header.
    pub sortable: &'static str,
}

static EXTENSION: OnceLock<Extension> = OnceLock::new();

/// Register the display assets, once per process.
///
/// ## Examples
///
/// ```rust
/// use tsqc::app::extension;
/// let first = extension();
/// assert!(std::ptr::eq(first, extension()));
/// assert!(first.stylesheet.contains("#0072B5"));
/// ```
pub fn extension() -> &'static Extension {
    EXTENSION.get_or_init(|| {
        debug!("Registering display assets");
        Extension { stylesheet: stylesheet(ACCENT_COLOR), sortable: SORTABLE }
    })
}

fn stylesheet(accent: &str) -> String {
    formatdoc! {r#"
        :root {{ --accent: {accent}; }}
        body {{ margin: 0; font-family: system-ui, sans-serif; color: #212121; }}
        header {{ background: var(--accent); color: white; padding: 0.75em 1.5em; }}
        header .site {{ font-weight: bold; margin-right: 1em; }}
        .layout {{ display: flex; align-items: flex-start; }}
        nav#sidebar {{ width: 14em; padding: 1em; border-right: 1px solid #e0e0e0; }}
        nav#sidebar label {{ display: block; padding: 0.4em 0.8em; margin-bottom: 0.3em; border-radius: 4px; cursor: pointer; border: 1px solid var(--accent); }}
        nav#sidebar label.active {{ background: var(--accent); color: white; }}
        nav#sidebar input {{ display: none; }}
        main#main {{ flex: 1; padding: 1em 2em; min-width: 0; }}
        .row {{ display: flex; gap: 1em; flex-wrap: wrap; }}
        .row > div {{ flex: 1; min-width: 20em; }}
        .table-wrap {{ max-height: 30em; overflow: auto; margin-bottom: 1em; }}
        table {{ border-collapse: collapse; }}
        th, td {{ padding: 0.25em 0.75em; border-bottom: 1px solid #e0e0e0; text-align: left; }}
        table.sortable th {{ cursor: pointer; position: sticky; top: 0; background: white; }}
        figure.plot {{ margin: 0 0 1em 0; }}
        .loading {{ display: flex; flex-direction: column; align-items: center; margin-top: 4em; }}
        .spinner {{ width: 50px; height: 50px; border: 5px solid #e0e0e0; border-top-color: var(--accent); border-radius: 50%; animation: spin 1s linear infinite; }}
        @keyframes spin {{ to {{ transform: rotate(360deg); }} }}
        .error-panel pre {{ white-space: pre-wrap; }}
    "#,
        accent = accent,
    }
}

const SORTABLE: &str = indoc! {r#"
    function makeSortable(root) {
      for (const table of root.querySelectorAll("table.sortable")) {
        table.querySelectorAll("th").forEach((th, column) => {
          th.addEventListener("click", () => {
            const body = table.tBodies[0];
            const ascending = th.dataset.order !== "asc";
            th.dataset.order = ascending ? "asc" : "desc";
            const value = (row) => row.cells[column].textContent;
            const rows = Array.from(body.rows).sort((a, b) => {
              const x = value(a), y = value(b);
              const order = (isNaN(x) || isNaN(y)) ? x.localeCompare(y) : x - y;
              return ascending ? order : -order;
            });
            rows.forEach((row) => body.appendChild(row));
          });
        });
      }
    }
"#};

/// Swaps the main area on each server-sent event and keeps the URL in sync.
const SESSION: &str = indoc! {r##"
    const main = document.getElementById("main");
    const options = Array.from(document.querySelectorAll("#sidebar input[name=page]"));
    let source = null;

    function show(page) {
      if (source) source.close();
      source = new EventSource("/api/events?page=" + encodeURIComponent(page));
      for (const name of ["loading", "displayed", "errored"]) {
        source.addEventListener(name, (event) => {
          main.innerHTML = event.data;
          if (name !== "loading") {
            source.close();
            makeSortable(main);
          }
        });
      }
    }

    function select(page, push) {
      for (const option of options) {
        option.checked = option.value === page;
        option.parentElement.classList.toggle("active", option.checked);
      }
      if (push) history.pushState({ page }, "", "?page=" + encodeURIComponent(page));
      show(page);
    }

    for (const option of options) {
      option.addEventListener("change", () => select(option.value, true));
    }

    window.addEventListener("popstate", () => {
      const page = new URLSearchParams(window.location.search).get("page");
      const known = options.some((option) => option.value === page);
      select(known ? page : options[0].value, false);
    });

    // the server may have replaced an unknown page with the default one
    const initial = document.body.dataset.page;
    history.replaceState({ page: initial }, "", "?page=" + encodeURIComponent(initial));
    show(initial);
"##};

// ----------------------------------------------------------------------------
// Template
// ----------------------------------------------------------------------------

/// Layout of the dashboard document.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    pub site: String,
    pub title: String,
    pub accent: String,
}

impl Template {
    /// Returns the dashboard [`Template`] titled after the dataset.
    pub fn new(title: &str) -> Self {
        Template { site: SITE.to_string(), title: title.to_string(), accent: ACCENT_COLOR.to_string() }
    }

    /// Render the document with a sidebar entry per page and `main` as the main area.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use tsqc::app::Template;
    /// use tsqc::pages::Page;
    /// let html = Template::new("example.trees").render(&Page::all(), Page::Trees, "<p>Loading</p>");
    /// assert!(html.contains("<title>example.trees | QC dashboard</title>"));
    /// assert!(html.contains(r#"value="Trees" checked"#));
    /// ```
    pub fn render(&self, pages: &[Page], current: Page, main: &str) -> String {
        let extension = extension();
        let site = escape_html(&self.site);
        let title = escape_html(&self.title);
        let accent = escape_html(&self.accent);
        let stylesheet = &extension.stylesheet;
        let sortable = extension.sortable;
        let session = SESSION;
        let current = escape_html(current.as_ref());

        let options: String = pages
            .iter()
            .map(|page| {
                let name = escape_html(page.as_ref());
                let (class, checked) = match name == current {
                    true => (" class=\"active\"", " checked"),
                    false => ("", ""),
                };
                format!("<label{class}><input type=\"radio\" name=\"page\" value=\"{name}\"{checked}>{name}</label>\n")
            })
            .collect();

        formatdoc! {r#"
            <!DOCTYPE html>
            <html lang="en">
            <head>
            <meta charset="utf-8">
            <meta name="theme-color" content="{accent}">
            <title>{title} | {site}</title>
            <style>
            {stylesheet}
            </style>
            </head>
            <body data-page="{current}">
            <header><span class="site">{site}</span><span class="title">{title}</span></header>
            <div class="layout">
            <nav id="sidebar">
            {options}
            </nav>
            <main id="main">
            {main}
            </main>
            </div>
            <script>
            {sortable}
            {session}
            </script>
            </body>
            </html>
        "#,
            accent = accent,
            title = title,
            site = site,
            stylesheet = stylesheet,
            current = current,
            options = options,
            main = main,
            sortable = sortable,
            session = session,
        }
    }
}
