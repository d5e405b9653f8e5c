//! Checker configuration
//!
//! YAML-backed settings: suppressed rules, per-rule severity overrides, the
//! product name the front-matter description template expects, the required
//! section layout and the line length limit.

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::CheckerConfig;
