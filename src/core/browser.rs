use crate::dom::Locator;
use crate::errors::Result;
use serde_json::Value;

/// Synchronous browser session capability.
///
/// Every call blocks the calling thread until the browser answers. Element
/// handles borrow the session that produced them, so they cannot outlive it.
/// Queries that match nothing return an empty list rather than an error.
pub trait BrowserDriver {
    type Element<'a>
    where
        Self: 'a;

    /// Navigate the active tab and wait for the navigation to commit.
    fn navigate(&self, url: &str) -> Result<()>;

    fn current_url(&self) -> Result<String>;

    fn title(&self) -> Result<String>;

    /// Evaluate a JavaScript expression in the page and return its JSON value.
    fn evaluate(&self, script: &str) -> Result<Value>;

    /// CSS query over the document, or under `scope` when given.
    fn find_css<'a>(
        &'a self,
        scope: Option<&Self::Element<'a>>,
        css: &str,
    ) -> Result<Vec<Self::Element<'a>>>;

    /// Elements named by one of `tags` whose normalized text contains `text`.
    fn find_text<'a>(
        &'a self,
        scope: Option<&Self::Element<'a>>,
        tags: &[String],
        text: &str,
    ) -> Result<Vec<Self::Element<'a>>>;

    /// Lower-case tag name.
    fn tag_name(&self, element: &Self::Element<'_>) -> Result<String>;

    /// Rendered text of the element.
    fn text(&self, element: &Self::Element<'_>) -> Result<String>;

    fn is_displayed(&self, element: &Self::Element<'_>) -> Result<bool>;

    fn is_enabled(&self, element: &Self::Element<'_>) -> Result<bool>;

    /// True when another element covers the centre of this one.
    fn is_obscured(&self, element: &Self::Element<'_>) -> Result<bool>;

    /// Native (input-simulated) click.
    fn click(&self, element: &Self::Element<'_>) -> Result<()>;

    /// `element.click()` through script execution.
    fn script_click(&self, element: &Self::Element<'_>) -> Result<()>;

    fn scroll_into_view(&self, element: &Self::Element<'_>) -> Result<()>;

    /// Move the pointer over the element.
    fn hover(&self, element: &Self::Element<'_>) -> Result<()>;

    /// Select the option of a native selection control by its visible text.
    fn select_by_text(&self, element: &Self::Element<'_>, text: &str) -> Result<()>;

    /// PNG bytes of the current viewport.
    fn screenshot_png(&self) -> Result<Vec<u8>>;

    /// End the session. Dropping the driver must release it too.
    fn quit(&mut self) -> Result<()>;

    fn find_all<'a>(&'a self, locator: &Locator) -> Result<Vec<Self::Element<'a>>> {
        self.resolve(None, locator)
    }

    fn find_within<'a>(
        &'a self,
        parent: &Self::Element<'a>,
        locator: &Locator,
    ) -> Result<Vec<Self::Element<'a>>> {
        self.resolve(Some(parent), locator)
    }

    fn resolve<'a>(
        &'a self,
        scope: Option<&Self::Element<'a>>,
        locator: &Locator,
    ) -> Result<Vec<Self::Element<'a>>> {
        match locator {
            Locator::Css(css) => self.find_css(scope, css),
            Locator::TextMatch { tags, text } => self.find_text(scope, tags, text),
            Locator::Compound(alternatives) => {
                for alternative in alternatives {
                    let found = self.resolve(scope, alternative)?;
                    if !found.is_empty() {
                        return Ok(found);
                    }
                }
                Ok(Vec::new())
            }
        }
    }

    /// `document.readyState`, or an empty string when unavailable.
    fn ready_state(&self) -> Result<String> {
        let state = self.evaluate("document.readyState")?;
        Ok(state.as_str().unwrap_or_default().to_string())
    }
}
