//! In-process browser stand-in for tests.
//!
//! [`FixtureDriver`] serves static HTML documents keyed by URL and answers
//! queries with `scraper`. Visibility follows the `hidden` attribute and
//! inline `display: none` / `visibility: hidden` styles on an element or its
//! ancestors. `disabled` disables, `data-obscured` marks an element as
//! covered. Clicking an anchor whose `href` names a known page navigates to
//! it; clicking an `<option>` selects it in its `<select>`.
//!
//! Every call is counted and every query is logged, so tests can assert on
//! what the suite asked the browser for.

use crate::core::{BrowserDriver, Config};
use crate::dom::Locator;
use crate::errors::{Result, SuiteError};
use crate::types::SessionOperation;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Snapshot of an element taken when it was queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureElement {
    index: usize,
    tag: String,
    text: String,
    attrs: HashMap<String, String>,
    displayed: bool,
}

impl FixtureElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

#[derive(Debug, Default)]
pub struct FixtureDriver {
    pages: HashMap<String, String>,
    current: RefCell<Option<String>>,
    selections: RefCell<HashMap<String, String>>,
    loading_polls: Cell<usize>,
    screenshots_fail: bool,
    closed: Cell<bool>,
    calls: RefCell<HashMap<&'static str, usize>>,
    queries: RefCell<Vec<String>>,
    clicks: RefCell<Vec<String>>,
}

impl FixtureDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` at `url`, replacing any page already there.
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Start the session on `url` without counting a navigation.
    pub fn open(self, url: &str) -> Self {
        *self.current.borrow_mut() = Some(url.to_string());
        self
    }

    /// Report `document.readyState` as `loading` for the next `polls` reads.
    pub fn ready_after(self, polls: usize) -> Self {
        self.loading_polls.set(polls);
        self
    }

    pub fn fail_screenshots(mut self) -> Self {
        self.screenshots_fail = true;
        self
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls.borrow().get(name).copied().unwrap_or(0)
    }

    /// Every query issued so far, formatted like [`Locator`]'s `Display`.
    pub fn was_queried(&self, locator: &Locator) -> bool {
        let wanted = locator.to_string();
        self.queries.borrow().iter().any(|q| *q == wanted)
    }

    /// `tag: text` of every clicked element, in order.
    pub fn clicks(&self) -> Vec<String> {
        self.clicks.borrow().clone()
    }

    /// Selected option text of the `<select>` with this name (or id).
    pub fn selection(&self, key: &str) -> Option<String> {
        self.selections.borrow().get(key).cloned()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    fn record(&self, call: &'static str) {
        *self.calls.borrow_mut().entry(call).or_insert(0) += 1;
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.get() {
            return Err(SuiteError::session(SessionOperation::Quit, "session is closed"));
        }
        Ok(())
    }

    fn document(&self) -> Result<Html> {
        self.ensure_open()?;
        let current = self.current.borrow();
        let url = current
            .as_deref()
            .ok_or_else(|| SuiteError::Driver("no page loaded".to_string()))?;
        let html = self
            .pages
            .get(url)
            .ok_or_else(|| SuiteError::Driver(format!("no fixture page for {}", url)))?;
        Ok(Html::parse_document(html))
    }

    fn activate(&self, element: &FixtureElement) -> Result<()> {
        self.ensure_open()?;
        self.clicks
            .borrow_mut()
            .push(format!("{}: {}", element.tag, element.text));

        if element.tag == "option" {
            let html = self.document()?;
            let all = elements(&html);
            let select = all
                .get(element.index)
                .and_then(|option| {
                    option
                        .ancestors()
                        .filter_map(ElementRef::wrap)
                        .find(|e| e.value().name() == "select")
                })
                .map(select_key);
            if let Some(key) = select {
                self.selections
                    .borrow_mut()
                    .insert(key, element.text.clone());
            }
            return Ok(());
        }

        if let Some(href) = element.attrs.get("href") {
            if self.pages.contains_key(href) {
                *self.current.borrow_mut() = Some(href.clone());
            }
        }
        Ok(())
    }
}

fn elements(html: &Html) -> Vec<ElementRef<'_>> {
    html.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .collect()
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: &ElementRef<'_>) -> String {
    collapse(&element.text().collect::<Vec<_>>().join(" "))
}

fn hides(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    if matches!(value.name(), "head" | "script" | "style" | "template") {
        return true;
    }
    if value.attr("hidden").is_some() {
        return true;
    }
    let style: String = value
        .attr("style")
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    style.contains("display:none") || style.contains("visibility:hidden")
}

fn select_key(select: ElementRef<'_>) -> String {
    let value = select.value();
    value
        .attr("name")
        .or_else(|| value.attr("id"))
        .unwrap_or("select")
        .to_string()
}

fn snapshot(all: &[ElementRef<'_>], element: &ElementRef<'_>) -> FixtureElement {
    let index = all
        .iter()
        .position(|e| e.id() == element.id())
        .unwrap_or_default();
    let hidden = std::iter::once(*element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .any(|e| hides(&e));
    FixtureElement {
        index,
        tag: element.value().name().to_string(),
        text: element_text(element),
        attrs: element
            .value()
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        displayed: !hidden,
    }
}

fn stale(element: &FixtureElement) -> SuiteError {
    SuiteError::Driver(format!("stale element reference: <{}>", element.tag))
}

impl BrowserDriver for FixtureDriver {
    type Element<'a> = FixtureElement where Self: 'a;

    fn navigate(&self, url: &str) -> Result<()> {
        self.record("navigate");
        self.ensure_open()?;
        if !self.pages.contains_key(url) {
            return Err(SuiteError::Driver(format!("no fixture page for {}", url)));
        }
        *self.current.borrow_mut() = Some(url.to_string());
        Ok(())
    }

    fn current_url(&self) -> Result<String> {
        self.ensure_open()?;
        Ok(self
            .current
            .borrow()
            .clone()
            .unwrap_or_else(|| "about:blank".to_string()))
    }

    fn title(&self) -> Result<String> {
        let html = self.document()?;
        let selector = Selector::parse("title").map_err(|e| SuiteError::Driver(format!("{:?}", e)))?;
        Ok(html
            .select(&selector)
            .next()
            .map(|t| element_text(&t))
            .unwrap_or_default())
    }

    fn evaluate(&self, script: &str) -> Result<Value> {
        self.record("evaluate");
        self.ensure_open()?;
        if !script.contains("readyState") {
            return Ok(Value::Null);
        }
        let left = self.loading_polls.get();
        if left > 0 {
            self.loading_polls.set(left - 1);
            Ok(Value::from("loading"))
        } else {
            Ok(Value::from("complete"))
        }
    }

    fn find_css<'a>(
        &'a self,
        scope: Option<&FixtureElement>,
        css: &str,
    ) -> Result<Vec<FixtureElement>> {
        self.record("find_css");
        self.queries.borrow_mut().push(Locator::css(css).to_string());
        let selector = Selector::parse(css)
            .map_err(|e| SuiteError::Driver(format!("invalid selector '{}': {:?}", css, e)))?;
        let html = self.document()?;
        let all = elements(&html);
        let matched: Vec<ElementRef<'_>> = match scope {
            Some(parent) => all
                .get(parent.index)
                .ok_or_else(|| stale(parent))?
                .select(&selector)
                .collect(),
            None => html.select(&selector).collect(),
        };
        Ok(matched.iter().map(|e| snapshot(&all, e)).collect())
    }

    fn find_text<'a>(
        &'a self,
        scope: Option<&FixtureElement>,
        tags: &[String],
        text: &str,
    ) -> Result<Vec<FixtureElement>> {
        self.record("find_text");
        self.queries
            .borrow_mut()
            .push(Locator::text_match(tags.iter().cloned(), text).to_string());
        let html = self.document()?;
        let all = elements(&html);
        let candidates: Vec<ElementRef<'_>> = match scope {
            Some(parent) => all
                .get(parent.index)
                .ok_or_else(|| stale(parent))?
                .descendants()
                .skip(1)
                .filter_map(ElementRef::wrap)
                .collect(),
            None => all.clone(),
        };
        Ok(candidates
            .iter()
            .filter(|e| tags.is_empty() || tags.iter().any(|t| t == e.value().name()))
            .filter(|e| element_text(e).contains(text))
            .map(|e| snapshot(&all, e))
            .collect())
    }

    fn tag_name(&self, element: &FixtureElement) -> Result<String> {
        Ok(element.tag.clone())
    }

    fn text(&self, element: &FixtureElement) -> Result<String> {
        Ok(element.text.clone())
    }

    fn is_displayed(&self, element: &FixtureElement) -> Result<bool> {
        Ok(element.displayed)
    }

    fn is_enabled(&self, element: &FixtureElement) -> Result<bool> {
        Ok(!element.attrs.contains_key("disabled"))
    }

    fn is_obscured(&self, element: &FixtureElement) -> Result<bool> {
        Ok(element.attrs.contains_key("data-obscured"))
    }

    fn click(&self, element: &FixtureElement) -> Result<()> {
        self.record("click");
        if !element.displayed {
            return Err(SuiteError::Driver(format!(
                "element not interactable: <{}>",
                element.tag
            )));
        }
        self.activate(element)
    }

    fn script_click(&self, element: &FixtureElement) -> Result<()> {
        self.record("script_click");
        self.activate(element)
    }

    fn scroll_into_view(&self, _element: &FixtureElement) -> Result<()> {
        self.record("scroll");
        self.ensure_open()
    }

    fn hover(&self, element: &FixtureElement) -> Result<()> {
        self.record("hover");
        self.ensure_open()?;
        if !element.displayed {
            return Err(SuiteError::Driver(format!(
                "cannot hover hidden element: <{}>",
                element.tag
            )));
        }
        Ok(())
    }

    fn select_by_text(&self, element: &FixtureElement, text: &str) -> Result<()> {
        self.record("select");
        if element.tag != "select" {
            return Err(SuiteError::Driver(format!(
                "<{}> is not a select element",
                element.tag
            )));
        }
        let html = self.document()?;
        let all = elements(&html);
        let select = *all.get(element.index).ok_or_else(|| stale(element))?;
        let options =
            Selector::parse("option").map_err(|e| SuiteError::Driver(format!("{:?}", e)))?;
        let wanted = text.trim();
        if !select.select(&options).any(|o| element_text(&o) == wanted) {
            return Err(SuiteError::Driver(format!(
                "no option with visible text '{}'",
                text
            )));
        }
        self.selections
            .borrow_mut()
            .insert(select_key(select), wanted.to_string());
        Ok(())
    }

    fn screenshot_png(&self) -> Result<Vec<u8>> {
        self.record("screenshot");
        self.ensure_open()?;
        if self.screenshots_fail {
            return Err(SuiteError::Driver("screenshot capture failed".to_string()));
        }
        Ok(PNG_SIGNATURE.to_vec())
    }

    fn quit(&mut self) -> Result<()> {
        self.record("quit");
        self.closed.set(true);
        Ok(())
    }
}

pub const HOME_URL: &str = "https://useinsider.com/";
pub const CAREERS_URL: &str = "https://useinsider.com/careers/";
pub const QA_CAREERS_URL: &str = "https://useinsider.com/careers/quality-assurance/";
pub const JOBS_URL: &str =
    "https://useinsider.com/careers/open-positions/?department=qualityassurance";
pub const APPLICATION_URL: &str = "https://jobs.lever.co/useinsider/78ddbec0";

pub const HOME_PAGE: &str = r##"<html>
<head><title>#1 Leader in Individualized, Cross-Channel CX | Insider</title></head>
<body>
  <nav class="navbar">
    <ul>
      <li class="nav-item"><a class="nav-link" href="#">Platform</a></li>
      <li class="nav-item dropdown">
        <a class="nav-link dropdown-toggle" href="#">Company</a>
        <div class="dropdown-menu">
          <a class="dropdown-sub" href="https://useinsider.com/about-us/">About Us</a>
          <a class="dropdown-sub" href="https://useinsider.com/careers/">Careers</a>
        </div>
      </li>
    </ul>
  </nav>
  <main><h1>Insider</h1></main>
</body>
</html>"##;

pub const CAREERS_PAGE: &str = r##"<html>
<head><title>Ready to disrupt? | Insider Careers</title></head>
<body>
  <section id="career-find-our-calling">
    <h3>Find your calling</h3>
    <a href="https://useinsider.com/careers/quality-assurance/">Quality Assurance</a>
    <a href="#">Sales</a>
  </section>
  <section id="career-our-location">
    <h3>Our Locations</h3>
    <p>25 offices across 6 continents, home to 1500+ employees.</p>
    <ul><li>Istanbul</li><li>London</li><li>New York</li></ul>
  </section>
  <section class="elementor-section" data-id="a8e7b90">
    <h2>Life at Insider</h2>
    <p>We're here to grow and drive growth, as none of us did before.</p>
  </section>
</body>
</html>"##;

pub const QA_CAREERS_PAGE: &str = r#"<html>
<head><title>Insider quality assurance job opportunities</title></head>
<body>
  <section class="hero">
    <h1>Quality Assurance</h1>
    <a class="btn" href="https://useinsider.com/careers/open-positions/?department=qualityassurance">See all QA jobs</a>
  </section>
</body>
</html>"#;

pub const APPLICATION_PAGE: &str = r#"<html>
<head><title>Insider. - Senior Software QA Engineer</title></head>
<body>
  <div class="section page-centered application-form">
    <form class="application-form" method="POST">
      <input name="name" type="text">
      <button type="submit">Submit application</button>
    </form>
  </div>
</body>
</html>"#;

/// One job card as the listing renders it.
pub fn job_card_html(position: &str, department: &str, location: &str, href: &str) -> String {
    format!(
        r#"<div class="position-list-item">
      <p class="position-title">{position}</p>
      <span class="position-department">{department}</span>
      <div class="position-location">{location}</div>
      <a class="btn" href="{href}">View Role</a>
    </div>"#
    )
}

/// Filterable listing page around `cards`.
pub fn jobs_page(cards: &[String]) -> String {
    format!(
        r#"<html>
<head><title>Insider Open Positions</title></head>
<body>
  <form class="filters">
    <select name="filter-by-location" id="filter-by-location">
      <option>All</option>
      <option>Istanbul, Turkey</option>
      <option>Amsterdam, Netherlands</option>
    </select>
    <select name="filter-by-department" id="filter-by-department">
      <option>All</option>
      <option>Quality Assurance</option>
    </select>
  </form>
  <div id="jobs-list">
    {}
  </div>
</body>
</html>"#,
        cards.join("\n    ")
    )
}

pub fn default_job_cards() -> Vec<String> {
    vec![
        job_card_html(
            "Senior Software Quality Assurance Engineer",
            "Quality Assurance",
            "Istanbul, Turkey",
            APPLICATION_URL,
        ),
        job_card_html(
            "Quality Assurance Engineer - Mobile",
            "Quality Assurance",
            "Istanbul, Turkey",
            APPLICATION_URL,
        ),
    ]
}

/// The whole careers flow, opened on nothing.
pub fn careers_site() -> FixtureDriver {
    FixtureDriver::new()
        .with_page(HOME_URL, HOME_PAGE)
        .with_page(CAREERS_URL, CAREERS_PAGE)
        .with_page(QA_CAREERS_URL, QA_CAREERS_PAGE)
        .with_page(JOBS_URL, &jobs_page(&default_job_cards()))
        .with_page(APPLICATION_URL, APPLICATION_PAGE)
}

/// Configuration pointing at [`careers_site`] with short timeouts.
pub fn fixture_config(screenshot_dir: &Path) -> Result<Config> {
    Config::from_toml_str(&format!(
        r#"
        [urls]
        base = "{HOME_URL}"
        careers = "{CAREERS_URL}"
        qa_careers = "{QA_CAREERS_URL}"

        [filters]
        location = "Istanbul, Turkey"
        department = "Quality Assurance"

        [expectations]
        position = "Quality Assurance"
        department = "Quality Assurance"
        location = "Istanbul, Turkey"

        [timeouts]
        implicit_wait = 1
        explicit_wait = 1
        page_load = 1
        poll_interval_ms = 20
        filter_settle_ms = 0
        hover_settle_ms = 0

        [browser]
        headless = true

        [diagnostics]
        screenshot_dir = '{}'
        "#,
        screenshot_dir.display()
    ))
}
