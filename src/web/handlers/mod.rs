//! API handlers.

pub mod files;
pub mod share;

pub use files::*;
pub use share::*;
