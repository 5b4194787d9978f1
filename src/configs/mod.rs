pub mod base;
pub mod logging;
pub mod transcript;

pub use base::*;
pub use logging::*;
pub use transcript::*;
