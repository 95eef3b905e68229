//! # chapchap-core
//!
//! Core types, traits, configuration, and error handling for Chapchap.

pub mod config;
pub mod error;
pub mod format;
pub mod traits;
pub mod types;

pub use config::shellexpand;
