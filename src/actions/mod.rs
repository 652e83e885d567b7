pub mod diagnostics;
pub mod filter;
pub mod interactor;
pub mod wait;

pub use diagnostics::Diagnostics;
pub use filter::{FilterControl, FilterResolver};
pub use interactor::Interactor;
pub use wait::{WaitEngine, WaitSpec};
