use crate::types::{FilterKind, InteractionKind, JobField, SessionOperation, WaitCondition};
use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SuiteError {
    #[error("Timed out after {elapsed_ms}ms waiting for '{target}' to be {condition}")]
    WaitTimeout {
        target: String,
        condition: WaitCondition,
        elapsed_ms: u64,
    },

    #[error("Element operation failed - element: {target}, operation: {kind}")]
    Interaction {
        kind: InteractionKind,
        target: String,
        screenshot: Option<PathBuf>,
        #[source]
        source: Box<SuiteError>,
    },

    #[error("Failed to apply {kind} filter '{value}'")]
    FilterApplication {
        kind: FilterKind,
        value: String,
        screenshot: Option<PathBuf>,
        #[source]
        source: Box<SuiteError>,
    },

    #[error("{page} verification failed at {section}: {reason}")]
    PageVerification {
        page: String,
        section: String,
        reason: String,
        screenshot: Option<PathBuf>,
        #[source]
        source: Option<Box<SuiteError>>,
    },

    #[error("Job {row} {field} does not contain expected text. Expected: {expected}, Actual: {actual}")]
    RowMismatch {
        row: usize,
        field: JobField,
        expected: String,
        actual: String,
    },

    #[error("Configuration error for key '{key}': {message}")]
    Configuration { key: String, message: String },

    #[error("Browser session {operation} failed: {message}")]
    Session {
        operation: SessionOperation,
        message: String,
    },

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SuiteError>;

/// Every interaction returns this: a value, or a failure carrying kind,
/// target and the captured artifact.
pub type InteractionOutcome<T> = Result<T>;

// headless_chrome reports everything through anyhow
impl From<anyhow::Error> for SuiteError {
    fn from(err: anyhow::Error) -> Self {
        SuiteError::Driver(format!("{:#}", err))
    }
}

impl SuiteError {
    pub fn configuration(key: impl Into<String>, message: impl Into<String>) -> Self {
        SuiteError::Configuration {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn session(operation: SessionOperation, message: impl ToString) -> Self {
        SuiteError::Session {
            operation,
            message: message.to_string(),
        }
    }

    pub fn verification(
        page: impl Into<String>,
        section: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        SuiteError::PageVerification {
            page: page.into(),
            section: section.into(),
            reason: reason.into(),
            screenshot: None,
            source: None,
        }
    }

    /// Attach a diagnostic artifact to a page-level error that has none yet.
    pub fn with_screenshot(mut self, path: Option<PathBuf>) -> Self {
        if let SuiteError::PageVerification { screenshot, .. }
        | SuiteError::FilterApplication { screenshot, .. } = &mut self
        {
            if screenshot.is_none() {
                *screenshot = path;
            }
        }
        self
    }

    /// Nearest screenshot attached anywhere in the cause chain.
    pub fn screenshot(&self) -> Option<&Path> {
        let own = match self {
            SuiteError::Interaction { screenshot, .. }
            | SuiteError::FilterApplication { screenshot, .. }
            | SuiteError::PageVerification { screenshot, .. } => screenshot.as_deref(),
            _ => None,
        };
        own.or_else(|| self.suite_source().and_then(SuiteError::screenshot))
    }

    fn suite_source(&self) -> Option<&SuiteError> {
        match self {
            SuiteError::Interaction { source, .. } | SuiteError::FilterApplication { source, .. } => {
                Some(source)
            }
            SuiteError::PageVerification { source, .. } => source.as_deref(),
            _ => None,
        }
    }

    /// Messages from this error down to its root cause, outermost first.
    pub fn cause_chain(&self) -> Vec<String> {
        let mut chain = vec![self.to_string()];
        let mut current = self.source();
        while let Some(cause) = current {
            chain.push(cause.to_string());
            current = cause.source();
        }
        chain
    }

    pub fn is_wait_timeout(&self) -> bool {
        matches!(self, SuiteError::WaitTimeout { .. })
    }

    /// True when this error or any cause is a lost session or an I/O
    /// failure. Those are faults, never "not yet" or "try another way".
    pub fn is_session_fault(&self) -> bool {
        match self {
            SuiteError::Session { .. } | SuiteError::Io(_) => true,
            _ => self.suite_source().is_some_and(SuiteError::is_session_fault),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeout() -> SuiteError {
        SuiteError::WaitTimeout {
            target: "Careers Link".to_string(),
            condition: WaitCondition::Clickable,
            elapsed_ms: 1200,
        }
    }

    #[test]
    fn test_cause_chain_runs_outermost_first() {
        let err = SuiteError::PageVerification {
            page: "Home".to_string(),
            section: "Careers Link".to_string(),
            reason: "click failed".to_string(),
            screenshot: None,
            source: Some(Box::new(SuiteError::Interaction {
                kind: InteractionKind::Click,
                target: "Careers Link".to_string(),
                screenshot: Some(PathBuf::from("screenshots/click_error_Careers_Link.png")),
                source: Box::new(timeout()),
            })),
        };

        let chain = err.cause_chain();
        assert_eq!(chain.len(), 3);
        assert!(chain[0].starts_with("Home verification failed"));
        assert!(chain[1].contains("operation: CLICK"));
        assert!(chain[2].contains("1200ms"));
        assert_eq!(
            err.screenshot(),
            Some(Path::new("screenshots/click_error_Careers_Link.png"))
        );
    }

    #[test]
    fn test_with_screenshot_keeps_existing_path() {
        let err = SuiteError::verification("Careers", "Teams", "empty")
            .with_screenshot(Some(PathBuf::from("a.png")))
            .with_screenshot(Some(PathBuf::from("b.png")));
        assert_eq!(err.screenshot(), Some(Path::new("a.png")));
    }

    #[test]
    fn test_session_fault_found_through_wrappers() {
        let lost = SuiteError::Interaction {
            kind: InteractionKind::WaitVisible,
            target: "Location Filter".to_string(),
            screenshot: None,
            source: Box::new(SuiteError::session(SessionOperation::Query, "connection closed")),
        };
        assert!(lost.is_session_fault());

        let missing = SuiteError::Interaction {
            kind: InteractionKind::WaitVisible,
            target: "Location Filter".to_string(),
            screenshot: None,
            source: Box::new(timeout()),
        };
        assert!(!missing.is_session_fault());
    }
}
