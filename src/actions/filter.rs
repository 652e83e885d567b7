//! Two-tier filter application over a job listing.
//!
//! Tier one drives the page's own control: a native `<select>` is set by
//! visible text, any other control is opened and its option clicked. Only
//! when tier one is not applicable does tier two search the page for any
//! clickable element carrying the filter value as text.

use crate::actions::interactor::Interactor;
use crate::core::config::DEFAULT_FILTER_SETTLE_MS;
use crate::core::{BrowserDriver, Config};
use crate::dom::{Locator, NamedTarget};
use crate::errors::{Result, SuiteError};
use crate::types::FilterKind;
use std::thread;
use std::time::Duration;

/// Pause after a filter is applied. The listing re-renders asynchronously
/// without `document.readyState` ever leaving `complete`.
pub const DEFAULT_FILTER_SETTLE: Duration = Duration::from_millis(DEFAULT_FILTER_SETTLE_MS);

/// Tier-one controls for one filter dimension.
#[derive(Debug, Clone)]
pub struct FilterControl {
    pub kind: FilterKind,
    pub control: NamedTarget,
    /// Option locator with a single `%s` slot for the filter value.
    pub option_template: Locator,
}

impl FilterControl {
    pub fn location(config: &Config) -> Self {
        Self {
            kind: FilterKind::Location,
            control: NamedTarget::new(config.locators.location_filter.clone(), "Location Filter"),
            option_template: config.locators.location_option.clone(),
        }
    }

    pub fn department(config: &Config) -> Self {
        Self {
            kind: FilterKind::Department,
            control: NamedTarget::new(config.locators.department_filter.clone(), "Department Filter"),
            option_template: config.locators.department_option.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterPath {
    NativeControl,
    FallbackTextMatch,
}

enum PrimaryAttempt {
    Applied,
    NotApplicable(SuiteError),
}

pub struct FilterResolver<'d, D: BrowserDriver> {
    ui: Interactor<'d, D>,
    fallback_tags: Vec<String>,
    settle: Duration,
    loading: Option<NamedTarget>,
}

impl<'d, D: BrowserDriver> FilterResolver<'d, D> {
    pub fn new(ui: Interactor<'d, D>, fallback_tags: Vec<String>) -> Self {
        Self {
            ui,
            fallback_tags,
            settle: DEFAULT_FILTER_SETTLE,
            loading: None,
        }
    }

    pub fn from_config(ui: Interactor<'d, D>, config: &Config) -> Self {
        Self::new(ui, config.locators.fallback_tags.clone())
            .with_settle(config.timeouts.filter_settle)
            .with_loading_indicator(NamedTarget::new(
                config.locators.loading_indicator.clone(),
                "Loading Indicator",
            ))
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Also wait for this indicator to disappear once a filter is applied.
    pub fn with_loading_indicator(mut self, indicator: NamedTarget) -> Self {
        self.loading = Some(indicator);
        self
    }

    /// Apply `value` to the filter, then let the listing settle.
    ///
    /// Re-applying an already applied value leaves the page in the same
    /// filtered state.
    pub fn apply(&self, control: &FilterControl, value: &str) -> Result<()> {
        tracing::info!(filter = %control.kind, value = %value, "Applying filter");

        let path = match self.attempt_primary(control, value)? {
            PrimaryAttempt::Applied => FilterPath::NativeControl,
            PrimaryAttempt::NotApplicable(reason) => {
                tracing::warn!(
                    filter = %control.kind,
                    reason = %reason,
                    "Standard filter approach failed, trying alternative"
                );
                self.attempt_fallback(control.kind, value)
                    .map_err(|e| filter_error(control.kind, value, e))?;
                FilterPath::FallbackTextMatch
            }
        };

        self.settle()
            .map_err(|e| filter_error(control.kind, value, e))?;
        tracing::info!(filter = %control.kind, value = %value, path = ?path, "Filter applied");
        Ok(())
    }

    // Anything short of a dead session means "try the other way".
    fn attempt_primary(&self, control: &FilterControl, value: &str) -> Result<PrimaryAttempt> {
        match self.drive_control(control, value) {
            Ok(()) => Ok(PrimaryAttempt::Applied),
            Err(e) if e.is_session_fault() => Err(e),
            Err(e) => Ok(PrimaryAttempt::NotApplicable(e)),
        }
    }

    fn drive_control(&self, control: &FilterControl, value: &str) -> Result<()> {
        let quiet = self.ui.quiet();
        let element = quiet.wait_visible(&control.control)?;

        if self.ui.driver().tag_name(&element)? == "select" {
            return quiet.select_by_visible_text(&element, &control.control.name, value);
        }

        quiet.click(&control.control)?;
        let option = NamedTarget::new(
            control.option_template.bind(&[value]),
            format!("{} Option: {}", capitalize(control.kind.label()), value),
        );
        quiet.click(&option)
    }

    fn attempt_fallback(&self, kind: FilterKind, value: &str) -> Result<()> {
        let target = NamedTarget::new(
            Locator::text_match(self.fallback_tags.iter().cloned(), value),
            format!("Alternative {} Filter: {}", capitalize(kind.label()), value),
        );
        self.ui.click(&target)
    }

    fn settle(&self) -> Result<()> {
        if !self.settle.is_zero() {
            thread::sleep(self.settle);
        }
        self.ui.wait_for_page_ready()?;
        if let Some(indicator) = &self.loading {
            self.ui.wait_for_loading_to_complete(indicator)?;
        }
        Ok(())
    }
}

fn filter_error(kind: FilterKind, value: &str, cause: SuiteError) -> SuiteError {
    tracing::error!(filter = %kind, value = %value, error = %cause, "Failed to apply filter");
    SuiteError::FilterApplication {
        kind,
        value: value.to_string(),
        screenshot: None,
        source: Box::new(cause),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::diagnostics::Diagnostics;
    use crate::actions::wait::WaitSpec;
    use crate::testing::FixtureDriver;
    use crate::types::WaitCondition;
    use std::fs;
    use std::path::Path;

    const SELECT_PAGE: &str = r#"
        <html><head><title>Open Positions</title></head><body>
            <select name="filter-by-location" id="filter-by-location">
                <option>All</option>
                <option>Istanbul, Turkey</option>
            </select>
            <div id="jobs-list"></div>
        </body></html>
    "#;

    const MENU_PAGE: &str = r#"
        <html><head><title>Open Positions</title></head><body>
            <button id="filter-by-location">Location</button>
            <ul class="menu">
                <li data-value="ist">Istanbul, Turkey</li>
                <li data-value="ams">Amsterdam, Netherlands</li>
            </ul>
        </body></html>
    "#;

    const BARE_PAGE: &str = r#"
        <html><head><title>Open Positions</title></head><body>
            <div class="chips">
                <a href="?location=istanbul" class="chip">Istanbul, Turkey</a>
            </div>
        </body></html>
    "#;

    const URL: &str = "https://fixture.test/jobs";

    fn control() -> FilterControl {
        FilterControl {
            kind: FilterKind::Location,
            control: NamedTarget::new(
                Locator::css("select[name*='location'], #filter-by-location"),
                "Location Filter",
            ),
            option_template: Locator::text_match(["option", "li"], "%s"),
        }
    }

    fn fallback_tags() -> Vec<String> {
        ["option", "a", "button", "li"].into_iter().map(String::from).collect()
    }

    fn resolver<'d>(driver: &'d FixtureDriver, dir: &Path) -> FilterResolver<'d, FixtureDriver> {
        let wait = WaitSpec::new(
            Duration::from_millis(120),
            Duration::from_millis(20),
            WaitCondition::Visible,
        )
        .unwrap();
        let ui = Interactor::new(driver, wait.clone(), wait, Diagnostics::new(dir));
        FilterResolver::new(ui, fallback_tags())
            .with_settle(Duration::ZERO)
            .with_loading_indicator(NamedTarget::new(
                Locator::css("div[class*='spinner']"),
                "Loading Indicator",
            ))
    }

    fn fallback_locator(value: &str) -> Locator {
        Locator::text_match(fallback_tags(), value)
    }

    #[test]
    fn test_native_select_never_reaches_fallback() {
        let driver = FixtureDriver::new().with_page(URL, SELECT_PAGE).open(URL);
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(&driver, dir.path());

        resolver.apply(&control(), "Istanbul, Turkey").unwrap();

        assert_eq!(
            driver.selection("filter-by-location").as_deref(),
            Some("Istanbul, Turkey")
        );
        assert!(!driver.was_queried(&fallback_locator("Istanbul, Turkey")));
        assert_eq!(driver.calls("click"), 0);
    }

    #[test]
    fn test_reapplying_filter_is_idempotent() {
        let driver = FixtureDriver::new().with_page(URL, SELECT_PAGE).open(URL);
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(&driver, dir.path());

        resolver.apply(&control(), "Istanbul, Turkey").unwrap();
        resolver.apply(&control(), "Istanbul, Turkey").unwrap();

        assert_eq!(
            driver.selection("filter-by-location").as_deref(),
            Some("Istanbul, Turkey")
        );
        assert_eq!(driver.current_url().unwrap(), URL);
    }

    #[test]
    fn test_reapplying_menu_filter_is_idempotent() {
        let driver = FixtureDriver::new().with_page(URL, MENU_PAGE).open(URL);
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(&driver, dir.path());

        resolver.apply(&control(), "Istanbul, Turkey").unwrap();
        let first = driver.clicks();
        resolver.apply(&control(), "Istanbul, Turkey").unwrap();
        let second = driver.clicks();

        assert_eq!(second.len(), 4);
        assert_eq!(&second[..2], &first[..]);
        assert_eq!(&second[2..], &first[..]);
        assert_eq!(driver.current_url().unwrap(), URL);
        assert!(!driver.was_queried(&fallback_locator("Istanbul, Turkey")));
    }

    #[test]
    fn test_lost_session_skips_fallback() {
        let mut driver = FixtureDriver::new().with_page(URL, SELECT_PAGE).open(URL);
        driver.quit().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(&driver, dir.path());

        let err = resolver.apply(&control(), "Istanbul, Turkey").unwrap_err();

        assert!(err.is_session_fault());
        assert!(!driver.was_queried(&fallback_locator("Istanbul, Turkey")));
    }

    #[test]
    fn test_custom_menu_uses_option_template() {
        let driver = FixtureDriver::new().with_page(URL, MENU_PAGE).open(URL);
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(&driver, dir.path());

        resolver.apply(&control(), "Istanbul, Turkey").unwrap();

        let clicks = driver.clicks();
        assert_eq!(clicks.len(), 2);
        assert!(clicks[0].contains("Location"));
        assert!(clicks[1].contains("Istanbul, Turkey"));
        assert!(!driver.was_queried(&fallback_locator("Istanbul, Turkey")));
    }

    #[test]
    fn test_fallback_used_when_control_missing() {
        let driver = FixtureDriver::new().with_page(URL, BARE_PAGE).open(URL);
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(&driver, dir.path());

        resolver.apply(&control(), "Istanbul, Turkey").unwrap();

        assert!(driver.was_queried(&fallback_locator("Istanbul, Turkey")));
        assert_eq!(driver.calls("click"), 1);
        // The tier-one miss is not a failure and leaves no artifact.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_both_tiers_failing_names_filter_and_value() {
        let driver = FixtureDriver::new().with_page(URL, BARE_PAGE).open(URL);
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(&driver, dir.path());

        let err = resolver.apply(&control(), "Berlin, Germany").unwrap_err();

        match &err {
            SuiteError::FilterApplication { kind, value, .. } => {
                assert_eq!(*kind, FilterKind::Location);
                assert_eq!(value, "Berlin, Germany");
            }
            other => panic!("expected filter error, got {:?}", other),
        }
        assert!(err.screenshot().is_some());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_unmatched_select_option_falls_back() {
        let page = SELECT_PAGE.replace(
            r#"<div id="jobs-list"></div>"#,
            r#"<button class="tag">Remote</button>"#,
        );
        let driver = FixtureDriver::new().with_page(URL, &page).open(URL);
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(&driver, dir.path());

        resolver.apply(&control(), "Remote").unwrap();

        assert!(driver.was_queried(&fallback_locator("Remote")));
        assert_eq!(driver.selection("filter-by-location"), None);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("department"), "Department");
        assert_eq!(capitalize(""), "");
    }
}
