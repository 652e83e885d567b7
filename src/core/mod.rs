pub mod browser;
pub mod config;

pub use browser::BrowserDriver;
pub use config::{
    BrowserKind, BrowserSettings, Config, DiagnosticsSettings, Expectations, FilterValues,
    LocatorSet, Timeouts, Urls,
};
