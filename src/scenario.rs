//! The five-step careers flow, run fail-fast.
//!
//! Steps run in order against one browser session. Once a step fails, every
//! later step is recorded as skipped rather than run against a page in an
//! unknown state.

use crate::actions::Interactor;
use crate::core::{BrowserDriver, Config};
use crate::errors::{Result, SuiteError};
use crate::pages::{CareersPage, HomePage, Page, QaCareersPage};
use crate::types::JobExpectations;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    HomePage,
    CareersSections,
    QaJobsFiltering,
    JobDataValidation,
    ViewRoleRedirect,
}

impl StepId {
    pub const ALL: [StepId; 5] = [
        StepId::HomePage,
        StepId::CareersSections,
        StepId::QaJobsFiltering,
        StepId::JobDataValidation,
        StepId::ViewRoleRedirect,
    ];

    pub fn number(&self) -> u8 {
        match self {
            StepId::HomePage => 1,
            StepId::CareersSections => 2,
            StepId::QaJobsFiltering => 3,
            StepId::JobDataValidation => 4,
            StepId::ViewRoleRedirect => 5,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            StepId::HomePage => "Verify home page is opened",
            StepId::CareersSections => "Verify career page sections",
            StepId::QaJobsFiltering => "Filter QA jobs and verify job list",
            StepId::JobDataValidation => "Validate job data",
            StepId::ViewRoleRedirect => "View Role redirects to application form",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step {}: {}", self.number(), self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    Failed {
        reason: String,
        causes: Vec<String>,
        screenshot: Option<PathBuf>,
    },
    Skipped {
        blocked_by: StepId,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: StepId,
    pub number: u8,
    pub title: &'static str,
    #[serde(flatten)]
    pub status: StepStatus,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub steps: Vec<StepReport>,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Passed)
    }

    pub fn failed_step(&self) -> Option<&StepReport> {
        self.steps
            .iter()
            .find(|s| matches!(s.status, StepStatus::Failed { .. }))
    }

    pub fn status_of(&self, step: StepId) -> Option<&StepStatus> {
        self.steps.iter().find(|s| s.step == step).map(|s| &s.status)
    }

    /// One line per step, for the console.
    pub fn summary(&self) -> String {
        let mut out = format!("Run {} started {}\n", self.run_id, self.started_at.to_rfc3339());
        for report in &self.steps {
            let status = match &report.status {
                StepStatus::Passed => "PASSED".to_string(),
                StepStatus::Failed { reason, .. } => format!("FAILED - {}", reason),
                StepStatus::Skipped { blocked_by } => {
                    format!("SKIPPED (blocked by step {})", blocked_by.number())
                }
            };
            out.push_str(&format!(
                "  {} [{}ms] {}\n",
                report.step, report.elapsed_ms, status
            ));
        }
        out
    }
}

/// Values carried from one step to the next.
#[derive(Debug, Default)]
struct RunState {
    job_count: Option<usize>,
}

pub struct Scenario<'d, D: BrowserDriver> {
    home: HomePage<'d, D>,
    careers: CareersPage<'d, D>,
    qa: QaCareersPage<'d, D>,
    location: String,
    department: String,
    expected: JobExpectations,
}

impl<'d, D: BrowserDriver> Scenario<'d, D> {
    pub fn new(driver: &'d D, config: &Config) -> Result<Self> {
        let ui = Interactor::from_config(driver, config)?;
        Ok(Self {
            home: HomePage::new(ui.clone(), config),
            careers: CareersPage::new(ui.clone(), config),
            qa: QaCareersPage::new(ui, config),
            location: config.filters.location.clone(),
            department: config.filters.department.clone(),
            expected: config.expectations.job(),
        })
    }

    pub fn run(&self) -> ScenarioReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!(run_id = %run_id, "Starting careers scenario");

        let mut state = RunState::default();
        let mut blocked_by: Option<StepId> = None;
        let mut steps = Vec::with_capacity(StepId::ALL.len());

        for step in StepId::ALL {
            if let Some(failed) = blocked_by {
                tracing::warn!("STEP {} SKIPPED (blocked by step {})", step.number(), failed.number());
                steps.push(StepReport {
                    step,
                    number: step.number(),
                    title: step.title(),
                    status: StepStatus::Skipped { blocked_by: failed },
                    elapsed_ms: 0,
                });
                continue;
            }

            tracing::info!("STEP {}: {}", step.number(), step.title());
            let started = Instant::now();
            let outcome = self.run_step(step, &mut state);
            let elapsed_ms = started.elapsed().as_millis() as u64;

            let status = match outcome {
                Ok(()) => {
                    tracing::info!("STEP {} PASSED", step.number());
                    StepStatus::Passed
                }
                Err(e) => {
                    blocked_by = Some(step);
                    failure_status(step, &e)
                }
            };
            steps.push(StepReport {
                step,
                number: step.number(),
                title: step.title(),
                status,
                elapsed_ms,
            });
        }

        let report = ScenarioReport {
            run_id,
            started_at,
            steps,
        };
        if report.passed() {
            tracing::info!(run_id = %run_id, "Scenario passed");
        } else {
            tracing::error!(run_id = %run_id, "Scenario failed");
        }
        report
    }

    fn run_step(&self, step: StepId, state: &mut RunState) -> Result<()> {
        match step {
            StepId::HomePage => {
                self.home.navigate()?;
                self.home.verify_loaded()
            }
            StepId::CareersSections => {
                self.home.navigate_to_careers()?;
                self.careers.verify_loaded()?;
                self.careers.verify_all_sections_displayed()
            }
            StepId::QaJobsFiltering => {
                self.qa.navigate()?;
                self.qa.verify_loaded()?;
                self.qa.click_see_all_jobs()?;
                self.qa.apply_filters(&self.location, &self.department)?;
                let count = self.qa.verify_job_list_displayed()?;
                tracing::info!(count, "Jobs listed after filtering");
                state.job_count = Some(count);
                Ok(())
            }
            StepId::JobDataValidation => {
                let validated = self.qa.validate_all_rows(&self.expected)?;
                if let Some(listed) = state.job_count {
                    if listed != validated {
                        tracing::warn!(listed, validated, "Job count changed since filtering");
                    }
                }
                Ok(())
            }
            StepId::ViewRoleRedirect => {
                let row = self.qa.click_first_available_action()?;
                let url = self.qa.verify_application_redirect()?;
                tracing::info!(row, url = %url, "Application form reached");
                Ok(())
            }
        }
    }
}

fn failure_status(step: StepId, err: &SuiteError) -> StepStatus {
    let causes = err.cause_chain();
    tracing::error!("STEP {} FAILED: {}", step.number(), err);
    for (depth, cause) in causes.iter().enumerate().skip(1) {
        tracing::error!(depth, "caused by: {}", cause);
    }
    StepStatus::Failed {
        reason: format!("{} failed - {}", step.title(), err),
        causes,
        screenshot: err.screenshot().map(PathBuf::from),
    }
}
