//! Polling waits over a blocking browser session.
//!
//! Every wait blocks the calling thread until its condition holds or the
//! timeout elapses, checking at most once per poll interval. There is no
//! retry beyond the polling itself.

use crate::core::BrowserDriver;
use crate::dom::NamedTarget;
use crate::errors::{Result, SuiteError};
use crate::types::WaitCondition;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitSpec {
    timeout: Duration,
    poll_interval: Duration,
    condition: WaitCondition,
}

impl WaitSpec {
    /// Fails unless `timeout > 0` and `poll_interval < timeout`.
    pub fn new(timeout: Duration, poll_interval: Duration, condition: WaitCondition) -> Result<Self> {
        if timeout.is_zero() {
            return Err(SuiteError::configuration("wait.timeout", "timeout must be positive"));
        }
        if poll_interval >= timeout {
            return Err(SuiteError::configuration(
                "wait.poll_interval",
                format!(
                    "poll interval {:?} must be shorter than timeout {:?}",
                    poll_interval, timeout
                ),
            ));
        }
        Ok(Self {
            timeout,
            poll_interval,
            condition,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn condition(&self) -> &WaitCondition {
        &self.condition
    }

    /// Same timing, different condition.
    pub fn with_condition(&self, condition: WaitCondition) -> Self {
        Self {
            condition,
            ..self.clone()
        }
    }

    /// Same poll interval and condition with another timeout. The poll
    /// interval shrinks when it would no longer fit.
    pub fn with_timeout(&self, timeout: Duration) -> Result<Self> {
        let poll_interval = if self.poll_interval < timeout {
            self.poll_interval
        } else {
            timeout / 4
        };
        Self::new(timeout, poll_interval, self.condition.clone())
    }
}

pub struct WaitEngine<'d, D: BrowserDriver> {
    driver: &'d D,
}

impl<'d, D: BrowserDriver> WaitEngine<'d, D> {
    pub fn new(driver: &'d D) -> Self {
        Self { driver }
    }

    /// First element matched by `target` that satisfies the spec's element
    /// condition (present, visible or clickable).
    pub fn until_element(&self, target: &NamedTarget, spec: &WaitSpec) -> Result<D::Element<'d>> {
        let condition = element_condition(spec)?;
        self.poll(&target.name, spec, || {
            for element in self.driver.find_all(&target.locator)? {
                if self.satisfies(&element, &condition)? {
                    return Ok(Some(element));
                }
            }
            Ok(None)
        })
    }

    /// Until an element the caller already holds satisfies the spec's
    /// element condition.
    pub fn until_ready(&self, element: &D::Element<'d>, name: &str, spec: &WaitSpec) -> Result<()> {
        let condition = element_condition(spec)?;
        self.poll(name, spec, || Ok(self.satisfies(element, &condition)?.then_some(())))
    }

    /// Until nothing matched by `target` is visible.
    pub fn until_absent(&self, target: &NamedTarget, spec: &WaitSpec) -> Result<()> {
        let spec = spec.with_condition(WaitCondition::Absent);
        self.poll(&target.name, &spec, || {
            for element in self.driver.find_all(&target.locator)? {
                if self.driver.is_displayed(&element)? {
                    return Ok(None);
                }
            }
            Ok(Some(()))
        })
    }

    /// Until `predicate` over the page returns true.
    pub fn until<F>(&self, description: &str, spec: &WaitSpec, mut predicate: F) -> Result<()>
    where
        F: FnMut(&D) -> Result<bool>,
    {
        let spec = spec.with_condition(WaitCondition::Predicate(description.to_string()));
        self.poll(description, &spec, || Ok(predicate(self.driver)?.then_some(())))
    }

    fn satisfies(&self, element: &D::Element<'d>, condition: &WaitCondition) -> Result<bool> {
        match condition {
            WaitCondition::Present => Ok(true),
            WaitCondition::Visible => self.driver.is_displayed(element),
            WaitCondition::Clickable => Ok(self.driver.is_displayed(element)?
                && self.driver.is_enabled(element)?
                && !self.driver.is_obscured(element)?),
            WaitCondition::Absent | WaitCondition::Predicate(_) => Ok(false),
        }
    }

    fn poll<T, F>(&self, target: &str, spec: &WaitSpec, mut probe: F) -> Result<T>
    where
        F: FnMut() -> Result<Option<T>>,
    {
        let started = Instant::now();
        loop {
            match probe() {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(e) if e.is_session_fault() => return Err(e),
                // Transient driver errors (detached nodes, navigation in
                // flight) count as "not yet".
                Err(e) => tracing::debug!(target = %target, error = %e, "Wait probe failed"),
            }

            let elapsed = started.elapsed();
            if elapsed >= spec.timeout() {
                return Err(SuiteError::WaitTimeout {
                    target: target.to_string(),
                    condition: spec.condition().clone(),
                    elapsed_ms: elapsed.as_millis() as u64,
                });
            }
            thread::sleep(spec.poll_interval().min(spec.timeout() - elapsed));
        }
    }
}

fn element_condition(spec: &WaitSpec) -> Result<WaitCondition> {
    let condition = spec.condition().clone();
    if matches!(condition, WaitCondition::Absent | WaitCondition::Predicate(_)) {
        return Err(SuiteError::configuration(
            "wait.condition",
            format!("'{}' is not an element condition", condition),
        ));
    }
    Ok(condition)
}
