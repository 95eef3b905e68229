//! # chapchap-evolution
//!
//! Evolution API gateway client: HTTP calls, response-shape normalization and
//! QR rendering.

pub mod client;
pub mod extract;
pub mod qr;

pub use client::EvolutionClient;
