//! Page objects for the careers flow.
//!
//! Each page wraps an [`Interactor`] and exposes domain verbs. Failures are
//! raised as [`SuiteError::PageVerification`] naming the page and section,
//! with a screenshot attached unless a deeper layer already captured one.

pub mod careers;
pub mod home;
pub mod qa_careers;

pub use careers::CareersPage;
pub use home::HomePage;
pub use qa_careers::QaCareersPage;

use crate::actions::Interactor;
use crate::core::BrowserDriver;
use crate::errors::{Result, SuiteError};

pub trait Page {
    const NAME: &'static str;

    fn navigate(&self) -> Result<()>;

    /// Confirm the browser is showing this page.
    fn verify_loaded(&self) -> Result<()>;
}

pub(crate) fn page_error<D: BrowserDriver>(
    ui: &Interactor<'_, D>,
    page: &str,
    section: &str,
    reason: &str,
    label: &str,
    cause: Option<SuiteError>,
) -> SuiteError {
    match &cause {
        Some(cause) => tracing::error!(page, section, error = %cause, "{}", reason),
        None => tracing::error!(page, section, "{}", reason),
    }
    let captured = cause.as_ref().is_some_and(|c| c.screenshot().is_some());
    let screenshot = if captured {
        None
    } else {
        ui.capture_diagnostic(label)
    };
    SuiteError::PageVerification {
        page: page.to_string(),
        section: section.to_string(),
        reason: reason.to_string(),
        screenshot,
        source: cause.map(Box::new),
    }
}
