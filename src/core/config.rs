//! Suite configuration.
//!
//! Loaded once from a TOML file, validated, then passed explicitly into the
//! session and the page objects. Required keys that are missing or invalid
//! fail at startup with the dotted key name.

use crate::dom::Locator;
use crate::errors::{Result, SuiteError};
use crate::types::{JobExpectations, Viewport};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/careers.toml";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;
pub const DEFAULT_FILTER_SETTLE_MS: u64 = 2000;
pub const DEFAULT_HOVER_SETTLE_MS: u64 = 1000;

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub urls: Urls,
    pub filters: FilterValues,
    pub expectations: Expectations,
    pub timeouts: Timeouts,
    pub browser: BrowserSettings,
    pub diagnostics: DiagnosticsSettings,
    pub locators: LocatorSet,
}

#[derive(Debug, Clone, Serialize)]
pub struct Urls {
    pub base: String,
    pub careers: String,
    pub qa_careers: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterValues {
    pub location: String,
    pub department: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Expectations {
    pub position: String,
    pub department: String,
    pub location: String,
    pub home_domain: String,
    pub application_domain: String,
}

impl Expectations {
    pub fn job(&self) -> JobExpectations {
        JobExpectations {
            position: self.position.clone(),
            department: self.department.clone(),
            location: self.location.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Timeouts {
    pub implicit_wait: Duration,
    pub explicit_wait: Duration,
    pub page_load: Duration,
    pub poll_interval: Duration,
    pub filter_settle: Duration,
    pub hover_settle: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    Chrome,
}

impl BrowserKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "chrome" => Some(BrowserKind::Chrome),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BrowserSettings {
    pub kind: BrowserKind,
    pub headless: bool,
    pub window: Viewport,
    pub executable: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsSettings {
    pub screenshot_dir: PathBuf,
}

/// Locators for every page element the suite touches.
///
/// Site markup changes often, so each entry can be replaced from the
/// `[locators]` table without touching code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorSet {
    pub company_menu: Locator,
    pub careers_link: Locator,
    pub locations_section: Locator,
    pub teams_section: Locator,
    pub life_at_section: Locator,
    pub see_all_jobs: Locator,
    pub location_filter: Locator,
    pub department_filter: Locator,
    pub location_option: Locator,
    pub department_option: Locator,
    pub fallback_tags: Vec<String>,
    pub job_list: Locator,
    pub job_card: Locator,
    pub job_position: Locator,
    pub job_department: Locator,
    pub job_location: Locator,
    pub view_role: Locator,
    pub application_form: Locator,
    pub loading_indicator: Locator,
}

impl Default for LocatorSet {
    fn default() -> Self {
        Self {
            company_menu: Locator::text_match(["a"], "Company"),
            careers_link: Locator::text_match(["a"], "Careers"),
            locations_section: Locator::css("#career-our-location"),
            teams_section: Locator::css("#career-find-our-calling"),
            life_at_section: Locator::css("section.elementor-section[data-id='a8e7b90']"),
            see_all_jobs: Locator::text_match(["a"], "See all QA jobs"),
            location_filter: Locator::css("select[name*='location'], #filter-by-location"),
            department_filter: Locator::css("select[name*='department'], #filter-by-department"),
            location_option: Locator::text_match(["option", "li"], "%s"),
            department_option: Locator::text_match(["option", "li"], "%s"),
            fallback_tags: ["option", "a", "button", "li"]
                .into_iter()
                .map(String::from)
                .collect(),
            job_list: Locator::css("#jobs-list"),
            job_card: Locator::css("#jobs-list > div"),
            job_position: Locator::any(vec![
                Locator::css(".position-title"),
                Locator::css("h3, h4, span[class*='position']"),
            ]),
            job_department: Locator::css(
                ".position-department, span[class*='department'], div[class*='department']",
            ),
            job_location: Locator::css(
                ".position-location, span[class*='location'], div[class*='location']",
            ),
            view_role: Locator::text_match(["a", "button"], "View Role"),
            application_form: Locator::css(
                "div[class*='application'], form[class*='application']",
            ),
            loading_indicator: Locator::css("div[class*='loading'], div[class*='spinner']"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    urls: RawUrls,
    filters: RawFilters,
    expectations: RawExpectations,
    timeouts: RawTimeouts,
    browser: RawBrowser,
    diagnostics: RawDiagnostics,
    locators: LocatorSet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawUrls {
    base: Option<String>,
    careers: Option<String>,
    qa_careers: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFilters {
    location: Option<String>,
    department: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawExpectations {
    position: Option<String>,
    department: Option<String>,
    location: Option<String>,
    home_domain: Option<String>,
    application_domain: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTimeouts {
    implicit_wait: Option<i64>,
    explicit_wait: Option<i64>,
    page_load: Option<i64>,
    poll_interval_ms: Option<i64>,
    filter_settle_ms: Option<i64>,
    hover_settle_ms: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawBrowser {
    name: Option<String>,
    headless: Option<bool>,
    window_size: Option<String>,
    executable: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDiagnostics {
    screenshot_dir: Option<PathBuf>,
}

impl Config {
    /// Read `path`, apply `CAREERS_*` environment overrides and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SuiteError::configuration(
                "config",
                format!("failed to read {}: {}", path.display(), e),
            )
        })?;
        tracing::info!(path = %path.display(), "Loading configuration");
        Self::from_toml_with(&content, |key| std::env::var(key).ok())
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Self::from_toml_with(content, |_| None)
    }

    /// Parse and validate, consulting `env` for overrides.
    pub fn from_toml_with<F>(content: &str, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut raw: RawConfig = toml::from_str(content)
            .map_err(|e| SuiteError::configuration("config", format!("failed to parse: {}", e)))?;
        raw.apply_env(env)?;
        raw.validate()
    }
}

impl RawConfig {
    fn apply_env<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(headless) = env("CAREERS_HEADLESS") {
            let headless = headless
                .trim()
                .parse()
                .map_err(|_| SuiteError::configuration("CAREERS_HEADLESS", "expected true or false"))?;
            self.browser.headless = Some(headless);
        }

        if let Some(browser) = env("CAREERS_BROWSER") {
            self.browser.name = Some(browser);
        }

        if let Some(base) = env("CAREERS_BASE_URL") {
            self.urls.base = Some(base);
        }

        Ok(())
    }

    fn validate(self) -> Result<Config> {
        let urls = Urls {
            base: required_url(self.urls.base, "urls.base")?,
            careers: required_url(self.urls.careers, "urls.careers")?,
            qa_careers: required_url(self.urls.qa_careers, "urls.qa_careers")?,
        };

        let filters = FilterValues {
            location: required_text(self.filters.location, "filters.location")?,
            department: required_text(self.filters.department, "filters.department")?,
        };

        let expectations = Expectations {
            position: required_text(self.expectations.position, "expectations.position")?,
            department: required_text(self.expectations.department, "expectations.department")?,
            location: required_text(self.expectations.location, "expectations.location")?,
            home_domain: self
                .expectations
                .home_domain
                .unwrap_or_else(|| "useinsider.com".to_string()),
            application_domain: self
                .expectations
                .application_domain
                .unwrap_or_else(|| "jobs.lever.co".to_string()),
        };

        let t = self.timeouts;
        let timeouts = Timeouts {
            implicit_wait: Duration::from_secs(required_positive(t.implicit_wait, "timeouts.implicit_wait")?),
            explicit_wait: Duration::from_secs(required_positive(t.explicit_wait, "timeouts.explicit_wait")?),
            page_load: Duration::from_secs(required_positive(t.page_load, "timeouts.page_load")?),
            poll_interval: Duration::from_millis(optional_positive(
                t.poll_interval_ms,
                "timeouts.poll_interval_ms",
                DEFAULT_POLL_INTERVAL_MS,
            )?),
            filter_settle: Duration::from_millis(optional_non_negative(
                t.filter_settle_ms,
                "timeouts.filter_settle_ms",
                DEFAULT_FILTER_SETTLE_MS,
            )?),
            hover_settle: Duration::from_millis(optional_non_negative(
                t.hover_settle_ms,
                "timeouts.hover_settle_ms",
                DEFAULT_HOVER_SETTLE_MS,
            )?),
        };

        if timeouts.poll_interval >= timeouts.explicit_wait {
            return Err(SuiteError::configuration(
                "timeouts.poll_interval_ms",
                "poll interval must be shorter than the explicit wait",
            ));
        }

        let name = self.browser.name.unwrap_or_else(|| "chrome".to_string());
        let kind = BrowserKind::parse(&name).ok_or_else(|| {
            SuiteError::configuration("browser.name", format!("unsupported browser: {}", name))
        })?;
        let window = match self.browser.window_size {
            Some(size) => parse_window_size(&size)?,
            None => Viewport::default(),
        };
        let browser = BrowserSettings {
            kind,
            headless: self.browser.headless.unwrap_or(false),
            window,
            executable: self.browser.executable,
        };

        let diagnostics = DiagnosticsSettings {
            screenshot_dir: self
                .diagnostics
                .screenshot_dir
                .unwrap_or_else(|| PathBuf::from("screenshots")),
        };

        for (key, template) in [
            ("locators.location_option", &self.locators.location_option),
            ("locators.department_option", &self.locators.department_option),
        ] {
            if template.param_slots() != 1 {
                return Err(SuiteError::configuration(
                    key,
                    "option locator needs exactly one %s slot for the filter value",
                ));
            }
        }

        Ok(Config {
            urls,
            filters,
            expectations,
            timeouts,
            browser,
            diagnostics,
            locators: self.locators,
        })
    }
}

fn required_text(value: Option<String>, key: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(SuiteError::configuration(key, "value is empty")),
        None => Err(SuiteError::configuration(key, "required key is missing")),
    }
}

fn required_url(value: Option<String>, key: &str) -> Result<String> {
    let value = required_text(value, key)?;
    url::Url::parse(&value)
        .map_err(|e| SuiteError::configuration(key, format!("invalid URL '{}': {}", value, e)))?;
    Ok(value)
}

fn required_positive(value: Option<i64>, key: &str) -> Result<u64> {
    let value = value.ok_or_else(|| SuiteError::configuration(key, "required key is missing"))?;
    positive(value, key)
}

fn optional_positive(value: Option<i64>, key: &str, default: u64) -> Result<u64> {
    value.map_or(Ok(default), |v| positive(v, key))
}

fn optional_non_negative(value: Option<i64>, key: &str, default: u64) -> Result<u64> {
    match value {
        Some(v) if v < 0 => Err(SuiteError::configuration(key, "must not be negative")),
        Some(v) => Ok(v as u64),
        None => Ok(default),
    }
}

fn positive(value: i64, key: &str) -> Result<u64> {
    if value > 0 {
        Ok(value as u64)
    } else {
        Err(SuiteError::configuration(
            key,
            format!("must be a positive integer, got {}", value),
        ))
    }
}

fn parse_window_size(size: &str) -> Result<Viewport> {
    let invalid = || {
        SuiteError::configuration(
            "browser.window_size",
            format!("expected WIDTH,HEIGHT, got '{}'", size),
        )
    };
    let (width, height) = size.split_once(',').ok_or_else(invalid)?;
    let width: u32 = width.trim().parse().map_err(|_| invalid())?;
    let height: u32 = height.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok(Viewport { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [urls]
        base = "https://useinsider.com/"
        careers = "https://useinsider.com/careers/"
        qa_careers = "https://useinsider.com/careers/quality-assurance/"

        [filters]
        location = "Istanbul, Turkey"
        department = "Quality Assurance"

        [expectations]
        position = "Quality Assurance"
        department = "Quality Assurance"
        location = "Istanbul, Turkey"

        [timeouts]
        implicit_wait = 10
        explicit_wait = 20
        page_load = 30

        [browser]
        name = "chrome"
        headless = true
        window_size = "1366, 768"
    "#;

    fn config_error_key(err: SuiteError) -> String {
        match err {
            SuiteError::Configuration { key, .. } => key,
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_sample_config_loads_with_defaults() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.filters.location, "Istanbul, Turkey");
        assert_eq!(config.timeouts.explicit_wait, Duration::from_secs(20));
        assert_eq!(config.timeouts.poll_interval, Duration::from_millis(250));
        assert_eq!(config.timeouts.filter_settle, Duration::from_millis(2000));
        assert_eq!(config.browser.window, Viewport { width: 1366, height: 768 });
        assert_eq!(config.expectations.application_domain, "jobs.lever.co");
        assert_eq!(config.diagnostics.screenshot_dir, PathBuf::from("screenshots"));
        assert_eq!(config.locators, LocatorSet::default());
    }

    #[test]
    fn test_missing_required_key_is_named() {
        let content = SAMPLE.replace(
            "qa_careers = \"https://useinsider.com/careers/quality-assurance/\"",
            "",
        );
        let err = Config::from_toml_str(&content).unwrap_err();
        assert_eq!(config_error_key(err), "urls.qa_careers");
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        let content = SAMPLE.replace("page_load = 30", "page_load = 0");
        let err = Config::from_toml_str(&content).unwrap_err();
        assert_eq!(config_error_key(err), "timeouts.page_load");
    }

    #[test]
    fn test_unsupported_browser_rejected() {
        for name in ["netscape", "chromium"] {
            let content = SAMPLE.replace("name = \"chrome\"", &format!("name = \"{}\"", name));
            let err = Config::from_toml_str(&content).unwrap_err();
            assert_eq!(config_error_key(err), "browser.name");
        }
    }

    #[test]
    fn test_env_overrides_apply_after_file() {
        let config = Config::from_toml_with(SAMPLE, |key| match key {
            "CAREERS_HEADLESS" => Some("false".to_string()),
            "CAREERS_BASE_URL" => Some("http://localhost:8080/".to_string()),
            _ => None,
        })
        .unwrap();
        assert!(!config.browser.headless);
        assert_eq!(config.urls.base, "http://localhost:8080/");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = Config::from_toml_with(SAMPLE, |key| {
            (key == "CAREERS_BASE_URL").then(|| "not a url".to_string())
        })
        .unwrap_err();
        assert_eq!(config_error_key(err), "urls.base");
    }

    #[test]
    fn test_locator_override_replaces_single_entry() {
        let content = format!(
            "{}\n[locators]\njob_card = {{ css = \".position-list-item\" }}\n",
            SAMPLE
        );
        let config = Config::from_toml_str(&content).unwrap();
        assert_eq!(config.locators.job_card, Locator::css(".position-list-item"));
        assert_eq!(config.locators.job_list, LocatorSet::default().job_list);
    }

    #[test]
    fn test_option_locator_without_slot_rejected() {
        let content = format!(
            "{}\n[locators]\nlocation_option = {{ css = \"li.selected\" }}\n",
            SAMPLE
        );
        let err = Config::from_toml_str(&content).unwrap_err();
        assert_eq!(config_error_key(err), "locators.location_option");
    }

    #[test]
    fn test_malformed_window_size_rejected() {
        let content = SAMPLE.replace("\"1366, 768\"", "\"wide\"");
        let err = Config::from_toml_str(&content).unwrap_err();
        assert_eq!(config_error_key(err), "browser.window_size");
    }
}
