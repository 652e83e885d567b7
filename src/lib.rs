pub mod actions;
pub mod browser;
pub mod core;
pub mod dom;
pub mod errors;
pub mod pages;
pub mod scenario;
pub mod testing;
pub mod types;
pub mod utils;

pub use actions::{Diagnostics, FilterControl, FilterResolver, Interactor, WaitEngine, WaitSpec};
pub use browser::ChromeDriver;
pub use crate::core::{BrowserDriver, Config};
pub use dom::{Locator, NamedTarget};
pub use errors::{InteractionOutcome, Result, SuiteError};
pub use scenario::{Scenario, ScenarioReport, StepId, StepReport, StepStatus};
pub use types::*;
