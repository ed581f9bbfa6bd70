//! Request handlers.

pub mod analyze;
pub mod health;
pub mod results;

pub use analyze::*;
pub use health::*;
pub use results::*;
