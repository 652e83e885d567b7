use serde::{Deserialize, Serialize};
use std::fmt;

/// Condition a wait polls for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitCondition {
    Present,
    Visible,
    Clickable,
    Absent,
    Predicate(String),
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitCondition::Present => f.write_str("present"),
            WaitCondition::Visible => f.write_str("visible"),
            WaitCondition::Clickable => f.write_str("clickable"),
            WaitCondition::Absent => f.write_str("absent"),
            WaitCondition::Predicate(description) => write!(f, "satisfied ({})", description),
        }
    }
}

/// Operation tag attached to interaction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractionKind {
    Click,
    JsClick,
    GetText,
    Scroll,
    Hover,
    WaitVisible,
    WaitClickable,
    WaitAbsent,
    PageLoad,
    Select,
    Navigate,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Click => "CLICK",
            InteractionKind::JsClick => "JS_CLICK",
            InteractionKind::GetText => "GET_TEXT",
            InteractionKind::Scroll => "SCROLL",
            InteractionKind::Hover => "HOVER",
            InteractionKind::WaitVisible => "WAIT_VISIBLE",
            InteractionKind::WaitClickable => "WAIT_CLICKABLE",
            InteractionKind::WaitAbsent => "WAIT_ABSENT",
            InteractionKind::PageLoad => "PAGE_LOAD",
            InteractionKind::Select => "SELECT",
            InteractionKind::Navigate => "NAVIGATE",
        }
    }

    /// Prefix used for the screenshot label of a failed interaction.
    pub fn diagnostic_label(&self) -> &'static str {
        match self {
            InteractionKind::Click => "click_error",
            InteractionKind::JsClick => "js_click_error",
            InteractionKind::GetText => "get_text_error",
            InteractionKind::Scroll => "scroll_error",
            InteractionKind::Hover => "hover_error",
            InteractionKind::WaitVisible => "wait_error",
            InteractionKind::WaitClickable => "wait_clickable_error",
            InteractionKind::WaitAbsent => "wait_absent_error",
            InteractionKind::PageLoad => "page_load_error",
            InteractionKind::Select => "select_error",
            InteractionKind::Navigate => "navigation_error",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter dimension on the job listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterKind {
    Location,
    Department,
}

impl FilterKind {
    pub fn label(&self) -> &'static str {
        match self {
            FilterKind::Location => "location",
            FilterKind::Department => "department",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::Location => f.write_str("LOCATION"),
            FilterKind::Department => f.write_str("DEPARTMENT"),
        }
    }
}

/// Field of a job card checked during row validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobField {
    Position,
    Department,
    Location,
}

impl fmt::Display for JobField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobField::Position => f.write_str("position"),
            JobField::Department => f.write_str("department"),
            JobField::Location => f.write_str("location"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOperation {
    Launch,
    OpenTab,
    Query,
    Quit,
}

impl fmt::Display for SessionOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionOperation::Launch => f.write_str("launch"),
            SessionOperation::OpenTab => f.write_str("open tab"),
            SessionOperation::Query => f.write_str("query"),
            SessionOperation::Quit => f.write_str("quit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.width, self.height)
    }
}

/// One job card as read from the listing.
///
/// Rebuilt from the card's sub-elements on every validation pass and never
/// cached, since the listing re-renders after filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub position: String,
    pub department: String,
    pub location: String,
    pub has_view_action: bool,
}

/// Substrings every listed job is expected to carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobExpectations {
    pub position: String,
    pub department: String,
    pub location: String,
}

/// A failed field check on a single job card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMismatch {
    pub field: JobField,
    pub expected: String,
    pub actual: String,
}

impl JobRecord {
    /// First field (position, department, location order) not containing
    /// its expected substring.
    pub fn first_mismatch(&self, expected: &JobExpectations) -> Option<FieldMismatch> {
        [
            (JobField::Position, &self.position, &expected.position),
            (JobField::Department, &self.department, &expected.department),
            (JobField::Location, &self.location, &expected.location),
        ]
        .into_iter()
        .find(|(_, actual, wanted)| !actual.contains(wanted.as_str()))
        .map(|(field, actual, wanted)| FieldMismatch {
            field,
            expected: wanted.clone(),
            actual: actual.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expectations() -> JobExpectations {
        JobExpectations {
            position: "Quality Assurance".to_string(),
            department: "Quality Assurance".to_string(),
            location: "Istanbul, Turkey".to_string(),
        }
    }

    #[test]
    fn test_matching_record_has_no_mismatch() {
        let record = JobRecord {
            position: "Senior Software Quality Assurance Engineer".to_string(),
            department: "Quality Assurance".to_string(),
            location: "Istanbul, Turkey".to_string(),
            has_view_action: true,
        };
        assert_eq!(record.first_mismatch(&expectations()), None);
    }

    #[test]
    fn test_first_failing_field_is_reported() {
        let record = JobRecord {
            position: "Quality Assurance Intern".to_string(),
            department: "Engineering".to_string(),
            location: "Remote".to_string(),
            has_view_action: false,
        };
        let mismatch = record.first_mismatch(&expectations()).unwrap();
        assert_eq!(mismatch.field, JobField::Department);
        assert_eq!(mismatch.actual, "Engineering");
        assert_eq!(mismatch.expected, "Quality Assurance");
    }

    #[test]
    fn test_interaction_kind_tags() {
        assert_eq!(InteractionKind::JsClick.to_string(), "JS_CLICK");
        assert_eq!(InteractionKind::WaitVisible.diagnostic_label(), "wait_error");
    }
}
