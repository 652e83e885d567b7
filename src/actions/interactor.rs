use crate::actions::diagnostics::Diagnostics;
use crate::actions::wait::{WaitEngine, WaitSpec};
use crate::core::{BrowserDriver, Config};
use crate::dom::{Locator, NamedTarget};
use crate::errors::{InteractionOutcome, Result, SuiteError};
use crate::types::{InteractionKind, WaitCondition};
use std::path::PathBuf;
use std::time::Duration;

/// Waited, screenshot-on-failure element operations.
///
/// Every operation first waits for its precondition, then performs the
/// action exactly once. A failure is logged, captured to the diagnostics
/// directory (unless the interactor is quiet) and returned as
/// [`SuiteError::Interaction`] wrapping the cause.
pub struct Interactor<'d, D: BrowserDriver> {
    driver: &'d D,
    wait: WaitSpec,
    page_load: WaitSpec,
    diagnostics: Diagnostics,
    capture: bool,
}

impl<'d, D: BrowserDriver> Clone for Interactor<'d, D> {
    fn clone(&self) -> Self {
        Self {
            driver: self.driver,
            wait: self.wait.clone(),
            page_load: self.page_load.clone(),
            diagnostics: self.diagnostics.clone(),
            capture: self.capture,
        }
    }
}

impl<'d, D: BrowserDriver> Interactor<'d, D> {
    pub fn new(driver: &'d D, wait: WaitSpec, page_load: WaitSpec, diagnostics: Diagnostics) -> Self {
        Self {
            driver,
            wait,
            page_load,
            diagnostics,
            capture: true,
        }
    }

    pub fn from_config(driver: &'d D, config: &Config) -> Result<Self> {
        let t = &config.timeouts;
        let wait = WaitSpec::new(t.explicit_wait, t.poll_interval, WaitCondition::Visible)?;
        let page_load = wait.with_timeout(t.page_load)?;
        Ok(Self::new(
            driver,
            wait,
            page_load,
            Diagnostics::new(config.diagnostics.screenshot_dir.clone()),
        ))
    }

    /// Copy that reports failures without capturing screenshots.
    pub fn quiet(&self) -> Self {
        Self {
            capture: false,
            ..self.clone()
        }
    }

    pub fn driver(&self) -> &'d D {
        self.driver
    }

    fn engine(&self) -> WaitEngine<'d, D> {
        WaitEngine::new(self.driver)
    }

    fn spec(&self, condition: WaitCondition) -> WaitSpec {
        self.wait.with_condition(condition)
    }

    fn fail(&self, kind: InteractionKind, target: &str, cause: SuiteError) -> SuiteError {
        tracing::error!(operation = %kind, element = %target, error = %cause, "Element operation failed");
        let screenshot = if self.capture {
            self.capture_diagnostic(&format!("{}_{}", kind.diagnostic_label(), target))
        } else {
            None
        };
        SuiteError::Interaction {
            kind,
            target: target.to_string(),
            screenshot,
            source: Box::new(cause),
        }
    }

    // Scroll failures are reported without a capture.
    fn fail_quietly(&self, kind: InteractionKind, target: &str, cause: SuiteError) -> SuiteError {
        tracing::warn!(operation = %kind, element = %target, error = %cause, "Element operation failed");
        SuiteError::Interaction {
            kind,
            target: target.to_string(),
            screenshot: None,
            source: Box::new(cause),
        }
    }

    pub fn capture_diagnostic(&self, label: &str) -> Option<PathBuf> {
        self.diagnostics.capture(self.driver, label)
    }

    pub fn wait_visible(&self, target: &NamedTarget) -> InteractionOutcome<D::Element<'d>> {
        self.engine()
            .until_element(target, &self.spec(WaitCondition::Visible))
            .map_err(|e| self.fail(InteractionKind::WaitVisible, &target.name, e))
    }

    pub fn wait_clickable(&self, target: &NamedTarget) -> InteractionOutcome<D::Element<'d>> {
        self.engine()
            .until_element(target, &self.spec(WaitCondition::Clickable))
            .map_err(|e| self.fail(InteractionKind::WaitClickable, &target.name, e))
    }

    pub fn click(&self, target: &NamedTarget) -> InteractionOutcome<()> {
        let clicked = self
            .engine()
            .until_element(target, &self.spec(WaitCondition::Clickable))
            .and_then(|element| self.driver.click(&element));
        match clicked {
            Ok(()) => {
                tracing::info!(element = %target, "Clicked");
                Ok(())
            }
            Err(e) => Err(self.fail(InteractionKind::Click, &target.name, e)),
        }
    }

    /// Click an element the caller already resolved, once it is clickable.
    pub fn click_element(&self, element: &D::Element<'d>, name: &str) -> InteractionOutcome<()> {
        let clicked = self
            .engine()
            .until_ready(element, name, &self.spec(WaitCondition::Clickable))
            .and_then(|_| self.driver.click(element));
        match clicked {
            Ok(()) => {
                tracing::info!(element = %name, "Clicked");
                Ok(())
            }
            Err(e) => Err(self.fail(InteractionKind::Click, name, e)),
        }
    }

    /// Click through script execution, for controls covered by overlays.
    /// Only presence is required.
    pub fn click_via_script(&self, target: &NamedTarget) -> InteractionOutcome<()> {
        let clicked = self
            .engine()
            .until_element(target, &self.spec(WaitCondition::Present))
            .and_then(|element| self.driver.script_click(&element));
        match clicked {
            Ok(()) => {
                tracing::info!(element = %target, "Clicked via script");
                Ok(())
            }
            Err(e) => Err(self.fail(InteractionKind::JsClick, &target.name, e)),
        }
    }

    /// Trimmed text of the first visible match.
    pub fn read_text(&self, target: &NamedTarget) -> InteractionOutcome<String> {
        let text = self
            .engine()
            .until_element(target, &self.spec(WaitCondition::Visible))
            .and_then(|element| self.driver.text(&element));
        match text {
            Ok(text) => {
                let text = text.trim().to_string();
                tracing::debug!(element = %target, text = %text, "Read text");
                Ok(text)
            }
            Err(e) => Err(self.fail(InteractionKind::GetText, &target.name, e)),
        }
    }

    /// Visibility probe. Never fails: a timeout or driver error reads as
    /// "not displayed".
    pub fn is_displayed(&self, target: &NamedTarget) -> bool {
        self.probe_visible(target, &self.spec(WaitCondition::Visible))
    }

    pub fn is_displayed_within(&self, target: &NamedTarget, timeout: Duration) -> bool {
        match self.spec(WaitCondition::Visible).with_timeout(timeout) {
            Ok(spec) => self.probe_visible(target, &spec),
            Err(e) => {
                tracing::warn!(element = %target, error = %e, "Invalid visibility probe timeout");
                false
            }
        }
    }

    fn probe_visible(&self, target: &NamedTarget, spec: &WaitSpec) -> bool {
        match self.engine().until_element(target, spec) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(element = %target, error = %e, "Element not displayed");
                false
            }
        }
    }

    pub fn scroll_into_view(&self, target: &NamedTarget) -> InteractionOutcome<()> {
        self.engine()
            .until_element(target, &self.spec(WaitCondition::Present))
            .and_then(|element| self.driver.scroll_into_view(&element))
            .map_err(|e| self.fail_quietly(InteractionKind::Scroll, &target.name, e))
    }

    pub fn scroll_element_into_view(&self, element: &D::Element<'d>, name: &str) -> InteractionOutcome<()> {
        self.driver
            .scroll_into_view(element)
            .map_err(|e| self.fail_quietly(InteractionKind::Scroll, name, e))
    }

    /// Hover over an element already resolved by the caller.
    pub fn hover(&self, element: &D::Element<'d>, name: &str) -> InteractionOutcome<()> {
        match self.driver.hover(element) {
            Ok(()) => {
                tracing::info!(element = %name, "Hovered");
                Ok(())
            }
            Err(e) => Err(self.fail(InteractionKind::Hover, name, e)),
        }
    }

    pub fn select_by_visible_text(
        &self,
        element: &D::Element<'d>,
        name: &str,
        text: &str,
    ) -> InteractionOutcome<()> {
        match self.driver.select_by_text(element, text) {
            Ok(()) => {
                tracing::info!(element = %name, option = %text, "Selected option");
                Ok(())
            }
            Err(e) => Err(self.fail(InteractionKind::Select, name, e)),
        }
    }

    /// Wait until `document.readyState` is `complete`.
    pub fn wait_for_page_ready(&self) -> InteractionOutcome<()> {
        self.engine()
            .until("document ready", &self.page_load, |driver| {
                Ok(driver.ready_state()? == "complete")
            })
            .map_err(|e| self.fail(InteractionKind::PageLoad, "PAGE", e))
    }

    /// Wait until no loading indicator is visible.
    pub fn wait_for_loading_to_complete(&self, indicator: &NamedTarget) -> InteractionOutcome<()> {
        self.engine()
            .until_absent(indicator, &self.wait)
            .map_err(|e| self.fail(InteractionKind::WaitAbsent, &indicator.name, e))
    }

    pub fn navigate(&self, url: &str) -> InteractionOutcome<()> {
        self.driver
            .navigate(url)
            .map_err(|e| self.fail(InteractionKind::Navigate, url, e))?;
        self.wait_for_page_ready()
    }

    pub fn current_url(&self) -> Result<String> {
        self.driver.current_url()
    }

    pub fn title(&self) -> Result<String> {
        self.driver.title()
    }

    pub fn find_all(&self, locator: &Locator) -> Result<Vec<D::Element<'d>>> {
        self.driver.find_all(locator)
    }

    /// Fails with a page-level error when the current URL lacks `expected`.
    pub fn verify_url_contains(&self, page: &str, expected: &str) -> Result<String> {
        let url = self.current_url()?;
        if url.contains(expected) {
            tracing::info!(url = %url, "URL verified");
            return Ok(url);
        }
        let screenshot = self.capture_diagnostic("url_verification_error");
        Err(SuiteError::verification(
            page,
            "URL",
            format!("expected URL containing '{}', got '{}'", expected, url),
        )
        .with_screenshot(screenshot))
    }

    /// Case-insensitive title check.
    pub fn verify_title_contains(&self, page: &str, expected: &str) -> Result<String> {
        let title = self.title()?;
        if title.to_lowercase().contains(&expected.to_lowercase()) {
            tracing::info!(title = %title, "Title verified");
            return Ok(title);
        }
        let screenshot = self.capture_diagnostic("title_verification_error");
        Err(SuiteError::verification(
            page,
            "Title",
            format!("expected title containing '{}', got '{}'", expected, title),
        )
        .with_screenshot(screenshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixtureDriver;
    use std::fs;
    use std::path::Path;
    use std::time::Instant;
    use tempfile::TempDir;

    const PAGE: &str = r#"
        <html><head><title>Insider Careers</title></head><body>
            <a id="jobs" href="https://fixture.test/jobs">See all QA jobs</a>
            <button id="covered" data-obscured>Apply</button>
            <p id="intro">
                Our teams   span the globe.
            </p>
            <div id="hidden" hidden>Secret</div>
            <select id="city"><option>All</option><option>Istanbul, Turkey</option></select>
        </body></html>
    "#;

    fn setup() -> (FixtureDriver, TempDir) {
        let driver = FixtureDriver::new()
            .with_page("https://fixture.test/", PAGE)
            .with_page("https://fixture.test/jobs", "<html><head><title>Jobs</title></head><body></body></html>")
            .open("https://fixture.test/");
        (driver, tempfile::tempdir().unwrap())
    }

    fn interactor<'d>(driver: &'d FixtureDriver, dir: &Path) -> Interactor<'d, FixtureDriver> {
        let wait = WaitSpec::new(
            Duration::from_millis(150),
            Duration::from_millis(25),
            WaitCondition::Visible,
        )
        .unwrap();
        Interactor::new(driver, wait.clone(), wait, Diagnostics::new(dir))
    }

    fn target(css: &str, name: &str) -> NamedTarget {
        NamedTarget::new(Locator::css(css), name)
    }

    fn screenshots(dir: &Path) -> usize {
        fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[test]
    fn test_click_follows_link() {
        let (driver, dir) = setup();
        let ui = interactor(&driver, dir.path());
        ui.click(&target("#jobs", "See all QA jobs")).unwrap();
        assert_eq!(driver.current_url().unwrap(), "https://fixture.test/jobs");
        assert_eq!(driver.calls("click"), 1);
    }

    #[test]
    fn test_click_timeout_leaves_one_screenshot() {
        let (driver, dir) = setup();
        let ui = interactor(&driver, dir.path());

        let started = Instant::now();
        let err = ui.click(&target("#covered", "Apply Button")).unwrap_err();
        assert!(started.elapsed() < Duration::from_millis(150 + 25 + 150));

        match &err {
            SuiteError::Interaction {
                kind,
                target,
                screenshot,
                source,
            } => {
                assert_eq!(*kind, InteractionKind::Click);
                assert_eq!(target, "Apply Button");
                assert!(screenshot.is_some());
                assert!(source.is_wait_timeout());
            }
            other => panic!("expected interaction error, got {:?}", other),
        }
        assert_eq!(screenshots(dir.path()), 1);
        assert_eq!(driver.calls("click"), 0);
    }

    #[test]
    fn test_script_click_only_needs_presence() {
        let (driver, dir) = setup();
        let ui = interactor(&driver, dir.path());
        ui.click_via_script(&target("#covered", "Apply Button")).unwrap();
        assert_eq!(driver.calls("script_click"), 1);
    }

    #[test]
    fn test_read_text_is_trimmed() {
        let (driver, dir) = setup();
        let ui = interactor(&driver, dir.path());
        let text = ui.read_text(&target("#intro", "Intro")).unwrap();
        assert_eq!(text, "Our teams span the globe.");
    }

    #[test]
    fn test_is_displayed_never_errors() {
        let (driver, dir) = setup();
        let ui = interactor(&driver, dir.path());
        assert!(ui.is_displayed(&target("#intro", "Intro")));
        assert!(!ui.is_displayed(&target("#hidden", "Hidden")));
        assert!(!ui.is_displayed_within(&target("#missing", "Missing"), Duration::from_millis(40)));
        assert_eq!(screenshots(dir.path()), 0);
    }

    #[test]
    fn test_absent_element_reads_not_displayed_within_timeout() {
        let (driver, dir) = setup();
        let ui = interactor(&driver, dir.path());

        let started = Instant::now();
        assert!(!ui.is_displayed(&target("#missing", "Missing")));
        assert!(started.elapsed() < Duration::from_millis(150 + 25 + 100));
    }

    /// Kind tag of an interaction failure, and the artifact count it left.
    fn failure(err: &SuiteError, dir: &Path) -> (InteractionKind, usize) {
        match err {
            SuiteError::Interaction { kind, screenshot, .. } => {
                assert!(screenshot.is_some());
                (*kind, screenshots(dir))
            }
            other => panic!("expected interaction error, got {:?}", other),
        }
    }

    #[test]
    fn test_script_click_failure_is_tagged() {
        let (driver, dir) = setup();
        let ui = interactor(&driver, dir.path());
        let err = ui.click_via_script(&target("#missing", "Missing")).unwrap_err();
        assert_eq!(failure(&err, dir.path()), (InteractionKind::JsClick, 1));
        assert_eq!(driver.calls("script_click"), 0);
    }

    #[test]
    fn test_wait_clickable_failure_is_tagged() {
        let (driver, dir) = setup();
        let ui = interactor(&driver, dir.path());
        let err = ui.wait_clickable(&target("#covered", "Apply Button")).unwrap_err();
        assert_eq!(failure(&err, dir.path()), (InteractionKind::WaitClickable, 1));
    }

    #[test]
    fn test_hover_failure_is_tagged() {
        let (driver, dir) = setup();
        let ui = interactor(&driver, dir.path());
        let hidden = driver.find_all(&Locator::css("#hidden")).unwrap().remove(0);
        let err = ui.hover(&hidden, "Hidden").unwrap_err();
        assert_eq!(failure(&err, dir.path()), (InteractionKind::Hover, 1));
    }

    #[test]
    fn test_page_never_ready_is_tagged() {
        let (driver, dir) = setup();
        let driver = driver.ready_after(1000);
        let ui = interactor(&driver, dir.path());
        let err = ui.wait_for_page_ready().unwrap_err();
        assert_eq!(failure(&err, dir.path()), (InteractionKind::PageLoad, 1));
    }

    #[test]
    fn test_lingering_spinner_is_tagged_absent() {
        let (driver, dir) = setup();
        let ui = interactor(&driver, dir.path());
        let err = ui
            .wait_for_loading_to_complete(&target("#intro", "Loading Indicator"))
            .unwrap_err();
        assert_eq!(failure(&err, dir.path()), (InteractionKind::WaitAbsent, 1));
    }

    #[test]
    fn test_click_element_waits_for_clickable() {
        let (driver, dir) = setup();
        let ui = interactor(&driver, dir.path()).quiet();

        let covered = driver.find_all(&Locator::css("#covered")).unwrap().remove(0);
        let err = ui.click_element(&covered, "Apply Button").unwrap_err();
        assert!(matches!(err, SuiteError::Interaction { kind: InteractionKind::Click, .. }));
        assert_eq!(driver.calls("click"), 0);
        assert_eq!(screenshots(dir.path()), 0);

        let jobs = driver.find_all(&Locator::css("#jobs")).unwrap().remove(0);
        ui.click_element(&jobs, "See all QA jobs").unwrap();
        assert_eq!(driver.current_url().unwrap(), "https://fixture.test/jobs");
        assert_eq!(driver.calls("click"), 1);
    }

    #[test]
    fn test_quiet_interactor_skips_capture() {
        let (driver, dir) = setup();
        let ui = interactor(&driver, dir.path()).quiet();
        let err = ui.wait_visible(&target("#hidden", "Hidden")).unwrap_err();
        assert!(err.screenshot().is_none());
        assert_eq!(screenshots(dir.path()), 0);
    }

    #[test]
    fn test_scroll_failure_has_no_screenshot() {
        let (driver, dir) = setup();
        let ui = interactor(&driver, dir.path());
        let err = ui.scroll_into_view(&target("#missing", "Missing")).unwrap_err();
        assert!(err.screenshot().is_none());
        assert_eq!(screenshots(dir.path()), 0);
    }

    #[test]
    fn test_failed_capture_still_reports_failure() {
        let (driver, dir) = setup();
        let driver = driver.fail_screenshots();
        let ui = interactor(&driver, dir.path());
        let err = ui.read_text(&target("#missing", "Missing")).unwrap_err();
        assert!(matches!(err, SuiteError::Interaction { kind: InteractionKind::GetText, .. }));
        assert!(err.screenshot().is_none());
    }

    #[test]
    fn test_select_by_visible_text() {
        let (driver, dir) = setup();
        let ui = interactor(&driver, dir.path());
        let select = ui.wait_visible(&target("#city", "City")).unwrap();
        ui.select_by_visible_text(&select, "City", "Istanbul, Turkey").unwrap();
        assert_eq!(driver.selection("city").as_deref(), Some("Istanbul, Turkey"));

        let err = ui.select_by_visible_text(&select, "City", "Berlin").unwrap_err();
        assert!(matches!(err, SuiteError::Interaction { kind: InteractionKind::Select, .. }));
    }

    #[test]
    fn test_page_ready_and_verifications() {
        let (driver, dir) = setup();
        let driver = driver.ready_after(1);
        let ui = interactor(&driver, dir.path());
        ui.wait_for_page_ready().unwrap();

        assert!(ui.verify_title_contains("Careers", "careers").is_ok());
        assert!(ui.verify_url_contains("Careers", "fixture.test").is_ok());
        let err = ui.verify_url_contains("Careers", "lever.co").unwrap_err();
        assert!(matches!(err, SuiteError::PageVerification { .. }));
        assert!(err.screenshot().is_some());
    }
}
