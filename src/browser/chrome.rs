use crate::core::{BrowserDriver, BrowserSettings, Timeouts};
use crate::errors::{Result, SuiteError};
use crate::types::SessionOperation;
use crate::utils::javascript;
use headless_chrome::browser::tab::NoElementFound;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use serde_json::Value;
use std::ffi::OsStr;
use std::sync::Arc;

/// Chrome session over the DevTools protocol.
///
/// Owns the browser process: dropping the driver kills it, so the session is
/// released on every exit path including panics.
pub struct ChromeDriver {
    browser: Option<Browser>,
    tab: Arc<Tab>,
}

impl ChromeDriver {
    pub fn launch(settings: &BrowserSettings, timeouts: &Timeouts) -> Result<Self> {
        // Create strings first to ensure they live long enough
        let window_size_arg = format!("--window-size={}", settings.window);

        let args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-gpu"),
            OsStr::new("--disable-infobars"),
            OsStr::new("--disable-extensions"),
            OsStr::new("--remote-allow-origins=*"),
            OsStr::new(&window_size_arg),
        ];

        let launch_options = LaunchOptions::default_builder()
            .headless(settings.headless)
            .window_size(Some((settings.window.width, settings.window.height)))
            .path(settings.executable.clone())
            .idle_browser_timeout(timeouts.page_load.max(timeouts.explicit_wait) * 4)
            .args(args)
            .build()
            .map_err(|e| SuiteError::session(SessionOperation::Launch, e))?;

        let browser =
            Browser::new(launch_options).map_err(|e| SuiteError::session(SessionOperation::Launch, e))?;

        let tab = browser
            .new_tab()
            .map_err(|e| SuiteError::session(SessionOperation::OpenTab, e))?;

        // Implicit wait: how long the protocol layer itself waits on a call.
        tab.set_default_timeout(timeouts.implicit_wait.max(timeouts.page_load));

        tracing::info!(
            browser = ?settings.kind,
            headless = settings.headless,
            window = %settings.window,
            "Chrome session started"
        );

        Ok(Self {
            browser: Some(browser),
            tab,
        })
    }

    fn call(&self, element: &Element<'_>, function: &str, args: Vec<Value>) -> Result<Value> {
        let result = element.call_js_fn(function, args, false)?;
        Ok(result.value.unwrap_or(Value::Null))
    }

    fn call_bool(&self, element: &Element<'_>, function: &str) -> Result<bool> {
        Ok(self.call(element, function, vec![])?.as_bool().unwrap_or(false))
    }

    fn ensure_open(&self) -> Result<()> {
        if self.browser.is_none() {
            return Err(SuiteError::session(
                SessionOperation::Quit,
                "browser session already closed",
            ));
        }
        Ok(())
    }
}

// The protocol reports "nothing matched" as an error. Anything else means
// the session can no longer answer queries.
fn query_result<'a>(found: anyhow::Result<Vec<Element<'a>>>, query: &str) -> Result<Vec<Element<'a>>> {
    match found {
        Ok(elements) => Ok(elements),
        Err(e) if is_no_match(&e) => {
            tracing::debug!(query = %query, "Query matched nothing");
            Ok(Vec::new())
        }
        Err(e) => Err(SuiteError::session(SessionOperation::Query, format!("{:#}", e))),
    }
}

fn is_no_match(err: &anyhow::Error) -> bool {
    if err.downcast_ref::<NoElementFound>().is_some() {
        return true;
    }
    let message = err.to_string();
    NO_MATCH_MESSAGES.iter().any(|m| message.contains(m))
}

// DevTools replies for an empty querySelectorAll / XPath search.
const NO_MATCH_MESSAGES: &[&str] = &[
    "Could not find node with given id",
    "Invalid search result range",
    "No search session with given id found",
];

impl BrowserDriver for ChromeDriver {
    type Element<'a> = Element<'a> where Self: 'a;

    fn navigate(&self, url: &str) -> Result<()> {
        self.ensure_open()?;
        self.tab.navigate_to(url)?;
        self.tab.wait_until_navigated()?;
        tracing::info!(url = %url, "Navigated");
        Ok(())
    }

    fn current_url(&self) -> Result<String> {
        self.ensure_open()?;
        Ok(self.tab.get_url())
    }

    fn title(&self) -> Result<String> {
        self.ensure_open()?;
        Ok(self.tab.get_title()?)
    }

    fn evaluate(&self, script: &str) -> Result<Value> {
        self.ensure_open()?;
        let result = self.tab.evaluate(script, false)?;
        Ok(result.value.unwrap_or(Value::Null))
    }

    fn find_css<'a>(
        &'a self,
        scope: Option<&Element<'a>>,
        css: &str,
    ) -> Result<Vec<Element<'a>>> {
        self.ensure_open()?;
        let found = match scope {
            Some(parent) => parent.find_elements(css),
            None => self.tab.find_elements(css),
        };
        query_result(found, css)
    }

    fn find_text<'a>(
        &'a self,
        scope: Option<&Element<'a>>,
        tags: &[String],
        text: &str,
    ) -> Result<Vec<Element<'a>>> {
        self.ensure_open()?;
        let xpath = javascript::text_match_xpath(tags, text, scope.is_some());
        let found = match scope {
            Some(parent) => {
                let tab = parent.parent;
                parent.find_elements_by_xpath(&xpath).map(|elements| {
                    elements
                        .into_iter()
                        .map(|e| Element {
                            remote_object_id: e.remote_object_id,
                            backend_node_id: e.backend_node_id,
                            node_id: e.node_id,
                            parent: tab,
                            attributes: e.attributes,
                            tag_name: e.tag_name,
                            value: e.value,
                        })
                        .collect()
                })
            }
            None => self.tab.find_elements_by_xpath(&xpath),
        };
        query_result(found, &xpath)
    }

    fn tag_name(&self, element: &Element<'_>) -> Result<String> {
        let tag = self.call(element, javascript::TAG_NAME, vec![])?;
        Ok(tag.as_str().unwrap_or_default().to_string())
    }

    fn text(&self, element: &Element<'_>) -> Result<String> {
        Ok(element.get_inner_text()?)
    }

    fn is_displayed(&self, element: &Element<'_>) -> Result<bool> {
        self.call_bool(element, javascript::IS_DISPLAYED)
    }

    fn is_enabled(&self, element: &Element<'_>) -> Result<bool> {
        self.call_bool(element, javascript::IS_ENABLED)
    }

    fn is_obscured(&self, element: &Element<'_>) -> Result<bool> {
        self.call_bool(element, javascript::IS_OBSCURED)
    }

    fn click(&self, element: &Element<'_>) -> Result<()> {
        element.click()?;
        Ok(())
    }

    fn script_click(&self, element: &Element<'_>) -> Result<()> {
        self.call(element, javascript::CLICK, vec![])?;
        Ok(())
    }

    fn scroll_into_view(&self, element: &Element<'_>) -> Result<()> {
        self.call(element, javascript::SCROLL_INTO_VIEW, vec![])?;
        Ok(())
    }

    fn hover(&self, element: &Element<'_>) -> Result<()> {
        element.move_mouse_over()?;
        Ok(())
    }

    fn select_by_text(&self, element: &Element<'_>, text: &str) -> Result<()> {
        let selected = self.call(element, javascript::SELECT_BY_TEXT, vec![Value::from(text)])?;
        if selected.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(SuiteError::Driver(format!(
                "no option with visible text '{}'",
                text
            )))
        }
    }

    fn screenshot_png(&self) -> Result<Vec<u8>> {
        self.ensure_open()?;
        let png = self
            .tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)?;
        Ok(png)
    }

    fn quit(&mut self) -> Result<()> {
        let Some(browser) = self.browser.take() else {
            return Ok(());
        };
        if let Err(e) = self.tab.close(false) {
            tracing::warn!(error = %e, "Failed to close tab before quitting");
        }
        drop(browser);
        tracing::info!("Chrome session closed");
        Ok(())
    }
}

impl Drop for ChromeDriver {
    fn drop(&mut self) {
        if self.browser.is_some() {
            tracing::info!("Releasing Chrome session on drop");
            if let Err(e) = self.quit() {
                tracing::error!(error = %e, "Error while quitting Chrome session");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_empty_match_reads_as_no_elements() {
        let found = query_result(
            Err(anyhow!("Method call error -32000: Could not find node with given id")),
            "#jobs-list > div",
        );
        assert!(matches!(found, Ok(ref elements) if elements.is_empty()));
    }

    #[test]
    fn test_dead_connection_is_a_session_fault() {
        let Err(err) = query_result(
            Err(anyhow!("Unable to make method calls because underlying connection is closed")),
            "#jobs-list > div",
        ) else {
            panic!("a closed connection must not read as an empty match");
        };
        assert!(matches!(
            err,
            SuiteError::Session {
                operation: SessionOperation::Query,
                ..
            }
        ));
    }
}
