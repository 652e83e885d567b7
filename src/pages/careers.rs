use crate::actions::Interactor;
use crate::core::{BrowserDriver, Config};
use crate::dom::NamedTarget;
use crate::errors::{Result, SuiteError};
use crate::pages::{page_error, Page};

pub struct CareersPage<'d, D: BrowserDriver> {
    ui: Interactor<'d, D>,
    url: String,
    sections: Vec<NamedTarget>,
}

impl<'d, D: BrowserDriver> CareersPage<'d, D> {
    pub fn new(ui: Interactor<'d, D>, config: &Config) -> Self {
        let locators = &config.locators;
        Self {
            ui,
            url: config.urls.careers.clone(),
            sections: vec![
                NamedTarget::new(locators.locations_section.clone(), "Locations Section"),
                NamedTarget::new(locators.teams_section.clone(), "Teams Section"),
                NamedTarget::new(locators.life_at_section.clone(), "Life at Insider Section"),
            ],
        }
    }

    fn fail(&self, section: &str, reason: &str, label: &str, cause: Option<SuiteError>) -> SuiteError {
        page_error(&self.ui, Self::NAME, section, reason, label, cause)
    }

    /// Locations, teams and life-at sections, in verification order.
    pub fn sections(&self) -> &[NamedTarget] {
        &self.sections
    }

    pub fn is_section_displayed(&self, section: &NamedTarget) -> bool {
        self.ui.is_displayed(section)
    }

    /// Scroll to a section and check it is displayed and not empty.
    /// Returns the section's text.
    pub fn verify_section(&self, section: &NamedTarget) -> Result<String> {
        let label = format!("{}_verification_error", section.name);

        self.ui.scroll_into_view(section).map_err(|e| {
            self.fail(&section.name, "Failed to scroll to section", &label, Some(e))
        })?;

        if !self.is_section_displayed(section) {
            return Err(self.fail(&section.name, "Section is not displayed", &label, None));
        }

        let text = self
            .ui
            .read_text(section)
            .map_err(|e| self.fail(&section.name, "Failed to read section text", &label, Some(e)))?;
        if text.is_empty() {
            return Err(self.fail(&section.name, "Section appears to be empty", &label, None));
        }

        let preview: String = text.chars().take(100).collect();
        tracing::info!(section = %section, preview = %preview, "Section verified");
        Ok(text)
    }

    /// Verify every section in order, stopping at the first failure.
    pub fn verify_all_sections_displayed(&self) -> Result<()> {
        for section in &self.sections {
            self.verify_section(section)?;
        }
        tracing::info!("All career page sections are displayed and verified successfully");
        Ok(())
    }
}

impl<'d, D: BrowserDriver> Page for CareersPage<'d, D> {
    const NAME: &'static str = "Careers Page";

    fn navigate(&self) -> Result<()> {
        self.ui.navigate(&self.url).map_err(|e| {
            self.fail(
                "Navigation",
                "Failed to navigate to Careers page",
                "careers_page_navigation_error",
                Some(e),
            )
        })
    }

    fn verify_loaded(&self) -> Result<()> {
        self.ui.wait_for_page_ready().map_err(|e| {
            self.fail(
                "Verification",
                "Careers page did not finish loading",
                "careers_page_verification_error",
                Some(e),
            )
        })?;
        let url = self.ui.verify_url_contains(Self::NAME, "careers")?;
        let title = self.ui.verify_title_contains(Self::NAME, "careers")?;
        tracing::info!(url = %url, title = %title, "Careers page loaded successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{careers_site, fixture_config, CAREERS_PAGE, CAREERS_URL};

    #[test]
    fn test_all_sections_verified() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixture_config(dir.path()).unwrap();
        let driver = careers_site();
        let page = CareersPage::new(Interactor::from_config(&driver, &config).unwrap(), &config);

        page.navigate().unwrap();
        page.verify_loaded().unwrap();
        page.verify_all_sections_displayed().unwrap();

        let teams = page.verify_section(&page.sections()[1]).unwrap();
        assert!(teams.contains("Find your calling"));
    }

    #[test]
    fn test_empty_section_fails_with_its_name() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixture_config(dir.path()).unwrap();
        let html = CAREERS_PAGE.replace(
            r#"<section id="career-find-our-calling">"#,
            r#"<section id="career-find-our-calling"></section><section id="teams">"#,
        );
        let driver = careers_site().with_page(CAREERS_URL, &html).open(CAREERS_URL);
        let page = CareersPage::new(Interactor::from_config(&driver, &config).unwrap(), &config);

        let err = page.verify_all_sections_displayed().unwrap_err();
        match &err {
            SuiteError::PageVerification { section, reason, .. } => {
                assert_eq!(section, "Teams Section");
                assert_eq!(reason, "Section appears to be empty");
            }
            other => panic!("expected page error, got {:?}", other),
        }
        assert!(err.screenshot().is_some());
    }

    #[test]
    fn test_hidden_section_is_not_displayed() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixture_config(dir.path()).unwrap();
        let html = CAREERS_PAGE.replace(
            r#"<section class="elementor-section" data-id="a8e7b90">"#,
            r#"<section class="elementor-section" data-id="a8e7b90" style="display: none">"#,
        );
        let driver = careers_site().with_page(CAREERS_URL, &html).open(CAREERS_URL);
        let page = CareersPage::new(Interactor::from_config(&driver, &config).unwrap(), &config);

        let err = page.verify_all_sections_displayed().unwrap_err();
        assert!(matches!(
            err,
            SuiteError::PageVerification { ref section, .. } if section == "Life at Insider Section"
        ));
    }
}
