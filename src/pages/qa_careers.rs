use crate::actions::{FilterControl, FilterResolver, Interactor};
use crate::core::{BrowserDriver, Config};
use crate::dom::{Locator, NamedTarget};
use crate::errors::{Result, SuiteError};
use crate::pages::{page_error, Page};
use crate::types::{JobExpectations, JobRecord};
use url::Url;

pub struct QaCareersPage<'d, D: BrowserDriver> {
    ui: Interactor<'d, D>,
    filters: FilterResolver<'d, D>,
    url: String,
    url_marker: String,
    application_domain: String,
    see_all_jobs: NamedTarget,
    location_filter: FilterControl,
    department_filter: FilterControl,
    job_list: NamedTarget,
    job_card: Locator,
    position: Locator,
    department: Locator,
    location: Locator,
    view_role: Locator,
    application_form: NamedTarget,
    loading: NamedTarget,
}

impl<'d, D: BrowserDriver> QaCareersPage<'d, D> {
    pub fn new(ui: Interactor<'d, D>, config: &Config) -> Self {
        let locators = &config.locators;
        Self {
            filters: FilterResolver::from_config(ui.clone(), config),
            ui,
            url: config.urls.qa_careers.clone(),
            url_marker: url_marker(&config.urls.qa_careers),
            application_domain: config.expectations.application_domain.clone(),
            see_all_jobs: NamedTarget::new(locators.see_all_jobs.clone(), "See all QA jobs"),
            location_filter: FilterControl::location(config),
            department_filter: FilterControl::department(config),
            job_list: NamedTarget::new(locators.job_list.clone(), "Job List"),
            job_card: locators.job_card.clone(),
            position: locators.job_position.clone(),
            department: locators.job_department.clone(),
            location: locators.job_location.clone(),
            view_role: locators.view_role.clone(),
            application_form: NamedTarget::new(
                locators.application_form.clone(),
                "Lever Application Form",
            ),
            loading: NamedTarget::new(locators.loading_indicator.clone(), "Loading Indicator"),
        }
    }

    fn fail(&self, section: &str, reason: &str, label: &str, cause: Option<SuiteError>) -> SuiteError {
        page_error(&self.ui, Self::NAME, section, reason, label, cause)
    }

    pub fn click_see_all_jobs(&self) -> Result<()> {
        self.ui
            .scroll_into_view(&self.see_all_jobs)
            .and_then(|_| self.ui.click(&self.see_all_jobs))
            .and_then(|_| self.ui.wait_for_page_ready())
            .map_err(|e| {
                self.fail(
                    "See all QA jobs",
                    "Failed to click See all QA jobs button",
                    "see_all_jobs_click_error",
                    Some(e),
                )
            })?;
        tracing::info!("Clicked See all QA jobs button");
        Ok(())
    }

    pub fn filter_by_location(&self, location: &str) -> Result<()> {
        self.filters
            .apply(&self.location_filter, location)
            .map_err(|e| {
                self.fail(
                    "Location Filter",
                    "Failed to filter by location",
                    "location_filter_error",
                    Some(e),
                )
            })
    }

    pub fn filter_by_department(&self, department: &str) -> Result<()> {
        self.filters
            .apply(&self.department_filter, department)
            .map_err(|e| {
                self.fail(
                    "Department Filter",
                    "Failed to filter by department",
                    "department_filter_error",
                    Some(e),
                )
            })
    }

    /// Location first, then department.
    pub fn apply_filters(&self, location: &str, department: &str) -> Result<()> {
        self.filter_by_location(location)?;
        self.filter_by_department(department)?;
        tracing::info!(location = %location, department = %department, "Job filters applied");
        Ok(())
    }

    /// Wait for the listing to settle and return how many cards it shows.
    /// An empty listing is a failure.
    pub fn verify_job_list_displayed(&self) -> Result<usize> {
        self.ui
            .wait_for_loading_to_complete(&self.loading)
            .map_err(|e| {
                self.fail("Job List", "Job list is still loading", "job_list_error", Some(e))
            })?;

        if !self.ui.is_displayed(&self.job_list) {
            return Err(self.fail("Job List", "Job list is not displayed", "job_list_error", None));
        }

        let count = self.job_count()?;
        if count == 0 {
            return Err(self.fail(
                "Job List",
                "No job cards found in the job list",
                "job_list_error",
                None,
            ));
        }
        tracing::info!(count, "Job list is displayed");
        Ok(count)
    }

    pub fn job_count(&self) -> Result<usize> {
        let cards = self.ui.find_all(&self.job_card)?;
        tracing::info!(count = cards.len(), "Found job cards");
        Ok(cards.len())
    }

    /// Card at `index`, queried afresh. `None` once the listing has fewer
    /// cards than that.
    pub fn read_record(&self, index: usize) -> Result<Option<JobRecord>> {
        let cards = self.ui.find_all(&self.job_card)?;
        let Some(card) = cards.get(index) else {
            return Ok(None);
        };
        let driver = self.ui.driver();
        Ok(Some(JobRecord {
            position: self.field_text(card, &self.position)?,
            department: self.field_text(card, &self.department)?,
            location: self.field_text(card, &self.location)?,
            has_view_action: !driver.find_within(card, &self.view_role)?.is_empty(),
        }))
    }

    pub fn job_records(&self) -> Result<Vec<JobRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.read_record(records.len())? {
            records.push(record);
        }
        Ok(records)
    }

    // Missing sub-elements read as empty text.
    fn field_text(&self, card: &D::Element<'d>, locator: &Locator) -> Result<String> {
        let driver = self.ui.driver();
        match driver.find_within(card, locator)?.first() {
            Some(element) => Ok(normalize_text(&driver.text(element)?)),
            None => Ok(String::new()),
        }
    }

    /// Check every card against `expected`. The first mismatching row
    /// (1-based) fails the whole validation. Returns the number of rows
    /// validated.
    pub fn validate_all_rows(&self, expected: &JobExpectations) -> Result<usize> {
        let count = self.job_count()?;
        if count == 0 {
            return Err(self.fail(
                "Job Validation",
                "No job cards found for validation",
                "job_validation_error",
                None,
            ));
        }

        for index in 0..count {
            let row = index + 1;
            let record = self.read_record(index)?.ok_or_else(|| {
                self.fail(
                    "Job Validation",
                    &format!("Job {} disappeared from the listing during validation", row),
                    "job_validation_error",
                    None,
                )
            })?;

            if let Some(mismatch) = record.first_mismatch(expected) {
                let cause = SuiteError::RowMismatch {
                    row,
                    field: mismatch.field,
                    expected: mismatch.expected,
                    actual: mismatch.actual,
                };
                return Err(self.fail(
                    &format!("Job {}", row),
                    "Job data validation failed",
                    &format!("job_validation_error_{}", row),
                    Some(cause),
                ));
            }
            tracing::debug!(row, position = %record.position, "Job validated");
        }

        tracing::info!(
            count,
            position = %expected.position,
            department = %expected.department,
            location = %expected.location,
            "All jobs validated successfully"
        );
        Ok(count)
    }

    /// Click the View Role action of the first card that has a clickable
    /// one. Each card gets one attempt; a card whose action is missing or
    /// never becomes clickable is skipped. Returns the 1-based row clicked.
    pub fn click_first_available_action(&self) -> Result<usize> {
        let driver = self.ui.driver();
        let attempt = self.ui.quiet();
        let count = self.job_count()?;

        for index in 0..count {
            let row = index + 1;
            let cards = self.ui.find_all(&self.job_card)?;
            let Some(card) = cards.get(index) else {
                break;
            };

            // Actions on the live site only render on hover.
            if let Err(e) = attempt.hover(card, &format!("Job {} Card", row)) {
                tracing::debug!(row, error = %e, "Could not hover job card");
            }

            let Some(action) = driver.find_within(card, &self.view_role)?.into_iter().next() else {
                tracing::warn!(row, "View Role button not found, trying next job");
                continue;
            };

            let name = format!("Job {} View Role", row);
            let clicked = attempt
                .scroll_element_into_view(&action, &name)
                .and_then(|_| attempt.click_element(&action, &name));
            match clicked {
                Ok(()) => {
                    tracing::info!(row, "Clicked View Role button");
                    return Ok(row);
                }
                Err(e) if e.is_session_fault() => return Err(e),
                Err(e) => tracing::warn!(row, error = %e, "View Role not clickable, trying next job"),
            }
        }

        Err(self.fail(
            "View Role",
            "No clickable View Role button found in any job card",
            "view_role_click_error",
            None,
        ))
    }

    /// Confirm the browser landed on the application form. Returns the URL.
    pub fn verify_application_redirect(&self) -> Result<String> {
        self.ui.wait_for_page_ready().map_err(|e| {
            self.fail(
                "Application Redirect",
                "Application page did not finish loading",
                "lever_redirect_error",
                Some(e),
            )
        })?;

        let url = self
            .ui
            .verify_url_contains(Self::NAME, &self.application_domain)?;

        if !self.ui.is_displayed(&self.application_form) {
            return Err(self.fail(
                "Application Redirect",
                "Lever application form is not displayed",
                "lever_redirect_error",
                None,
            ));
        }
        tracing::info!(url = %url, "Redirected to application form");
        Ok(url)
    }
}

impl<'d, D: BrowserDriver> Page for QaCareersPage<'d, D> {
    const NAME: &'static str = "QA Careers Page";

    fn navigate(&self) -> Result<()> {
        self.ui.navigate(&self.url).map_err(|e| {
            self.fail(
                "Navigation",
                "Failed to navigate to QA careers page",
                "qa_careers_navigation_error",
                Some(e),
            )
        })?;
        tracing::info!(url = %self.url, "Navigated to QA careers page");
        Ok(())
    }

    fn verify_loaded(&self) -> Result<()> {
        self.ui.wait_for_page_ready().map_err(|e| {
            self.fail(
                "Verification",
                "QA careers page did not finish loading",
                "qa_careers_verification_error",
                Some(e),
            )
        })?;

        let url = self.ui.verify_url_contains(Self::NAME, &self.url_marker)?;
        let title = self.ui.title()?;
        if title.trim().is_empty() {
            return Err(self.fail(
                "Title",
                "QA careers page title is empty",
                "qa_careers_verification_error",
                None,
            ));
        }

        if !self.ui.is_displayed(&self.see_all_jobs) {
            return Err(self.fail(
                "See all QA jobs",
                "See all QA jobs button is not displayed",
                "qa_careers_verification_error",
                None,
            ));
        }
        tracing::info!(url = %url, title = %title, "QA careers page loaded successfully");
        Ok(())
    }
}

/// Last path segment of `url` ("quality-assurance" for the QA careers
/// page), or the whole URL when it has none.
fn url_marker(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                .map(str::to_string)
        })
        .unwrap_or_else(|| url.to_string())
}

fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
