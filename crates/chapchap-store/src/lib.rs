//! # chapchap-store
//!
//! Local record store for Chapchap (SQLite-backed): the session marker and
//! the list of linked instances.

pub mod store;

pub use store::Store;
