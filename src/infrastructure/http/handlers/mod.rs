//! HTTP Handlers

mod fallback;
mod health;

pub use fallback::*;
pub use health::*;
