pub mod locator;

pub use locator::{Locator, NamedTarget};
