use crate::actions::Interactor;
use crate::core::{BrowserDriver, Config};
use crate::dom::NamedTarget;
use crate::errors::{Result, SuiteError};
use crate::pages::{page_error, Page};
use std::thread;
use std::time::Duration;

pub struct HomePage<'d, D: BrowserDriver> {
    ui: Interactor<'d, D>,
    url: String,
    domain: String,
    company_menu: NamedTarget,
    careers_link: NamedTarget,
    hover_settle: Duration,
}

impl<'d, D: BrowserDriver> HomePage<'d, D> {
    pub fn new(ui: Interactor<'d, D>, config: &Config) -> Self {
        Self {
            ui,
            url: config.urls.base.clone(),
            domain: config.expectations.home_domain.clone(),
            company_menu: NamedTarget::new(config.locators.company_menu.clone(), "Company Menu"),
            careers_link: NamedTarget::new(config.locators.careers_link.clone(), "Careers Link"),
            hover_settle: config.timeouts.hover_settle,
        }
    }

    fn fail(&self, section: &str, reason: &str, label: &str, cause: Option<SuiteError>) -> SuiteError {
        page_error(&self.ui, Self::NAME, section, reason, label, cause)
    }

    pub fn is_company_menu_displayed(&self) -> bool {
        self.ui.is_displayed(&self.company_menu)
    }

    /// Hover the Company menu and give its dropdown time to open.
    pub fn hover_company_menu(&self) -> Result<()> {
        let hovered = self
            .ui
            .scroll_into_view(&self.company_menu)
            .and_then(|_| self.ui.wait_visible(&self.company_menu))
            .and_then(|menu| self.ui.hover(&menu, &self.company_menu.name));
        if let Err(e) = hovered {
            return Err(self.fail(
                "Company Menu",
                "Failed to hover over Company menu",
                "company_menu_hover_error",
                Some(e),
            ));
        }
        if !self.hover_settle.is_zero() {
            thread::sleep(self.hover_settle);
        }
        Ok(())
    }

    /// Careers link visibility, revealed by hovering the Company menu first.
    pub fn is_careers_link_displayed(&self) -> bool {
        if let Err(e) = self.hover_company_menu() {
            tracing::warn!(error = %e, "Could not open Company menu");
            return false;
        }
        self.ui.is_displayed(&self.careers_link)
    }

    pub fn click_careers_link(&self) -> Result<()> {
        if !self.is_company_menu_displayed() {
            return Err(self.fail(
                "Company Menu",
                "Company menu is not displayed, cannot click Careers link",
                "careers_link_click_error",
                None,
            ));
        }
        if !self.is_careers_link_displayed() {
            return Err(self.fail(
                "Careers Link",
                "Careers link is not displayed after hovering over Company menu",
                "careers_link_click_error",
                None,
            ));
        }

        self.ui
            .scroll_into_view(&self.careers_link)
            .and_then(|_| self.ui.click(&self.careers_link))
            .map_err(|e| {
                self.fail(
                    "Careers Link",
                    "Failed to click on Careers link",
                    "careers_link_click_error",
                    Some(e),
                )
            })?;
        tracing::info!("Clicked on Careers link");
        Ok(())
    }

    pub fn navigate_to_careers(&self) -> Result<()> {
        self.click_careers_link()?;
        self.ui.wait_for_page_ready().map_err(|e| {
            self.fail(
                "Careers Page",
                "Failed to navigate to Careers page",
                "careers_page_navigation_error",
                Some(e),
            )
        })?;
        tracing::info!("Navigated to Careers page");
        Ok(())
    }
}

impl<'d, D: BrowserDriver> Page for HomePage<'d, D> {
    const NAME: &'static str = "Home Page";

    fn navigate(&self) -> Result<()> {
        self.ui.navigate(&self.url).map_err(|e| {
            self.fail(
                "Navigation",
                "Failed to navigate to home page",
                "home_page_navigation_error",
                Some(e),
            )
        })?;
        tracing::info!(url = %self.url, "Navigated to home page");
        Ok(())
    }

    fn verify_loaded(&self) -> Result<()> {
        self.ui.wait_for_page_ready().map_err(|e| {
            self.fail(
                "Verification",
                "Home page did not finish loading",
                "home_page_verification_error",
                Some(e),
            )
        })?;

        let url = self.ui.verify_url_contains(Self::NAME, &self.domain)?;
        let title = self.ui.title()?;
        if title.trim().is_empty() {
            return Err(self.fail(
                "Title",
                "Home page title is empty",
                "home_page_verification_error",
                None,
            ));
        }

        tracing::info!(url = %url, title = %title, "Home page loaded successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{careers_site, fixture_config, CAREERS_URL, HOME_URL};

    #[test]
    fn test_navigate_and_verify() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixture_config(dir.path()).unwrap();
        let driver = careers_site();
        let home = HomePage::new(Interactor::from_config(&driver, &config).unwrap(), &config);

        home.navigate().unwrap();
        home.verify_loaded().unwrap();
        assert_eq!(driver.current_url().unwrap(), HOME_URL);
    }

    #[test]
    fn test_careers_link_reached_through_company_menu() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixture_config(dir.path()).unwrap();
        let driver = careers_site().open(HOME_URL);
        let home = HomePage::new(Interactor::from_config(&driver, &config).unwrap(), &config);

        assert!(home.is_company_menu_displayed());
        home.navigate_to_careers().unwrap();

        assert_eq!(driver.current_url().unwrap(), CAREERS_URL);
        assert!(driver.calls("hover") >= 1);
    }

    #[test]
    fn test_missing_menu_is_a_page_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixture_config(dir.path()).unwrap();
        let driver = careers_site()
            .with_page(HOME_URL, "<html><head><title>Insider</title></head><body></body></html>")
            .open(HOME_URL);
        let home = HomePage::new(Interactor::from_config(&driver, &config).unwrap(), &config);

        let err = home.click_careers_link().unwrap_err();
        match &err {
            SuiteError::PageVerification { page, section, .. } => {
                assert_eq!(page, "Home Page");
                assert_eq!(section, "Company Menu");
            }
            other => panic!("expected page error, got {:?}", other),
        }
        assert!(err.screenshot().is_some());
    }
}
