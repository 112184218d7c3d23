//! VidBridge: scraped video sites behind an addon-protocol HTTP service
//!
//! Per-site scraping is data-driven (see [`providers::sites`]), watch pages
//! are resolved to playable streams by the [`extract`] engine, and the
//! [`web`] layer serves the manifest/catalog/meta/stream surface plus a
//! referer-injecting stream relay.

pub mod cache;
pub mod config;
pub mod errors;
pub mod extract;
pub mod fetch;
pub mod ids;
pub mod models;
pub mod providers;
pub mod web;

pub use config::Config;
pub use errors::{AppError, AppResult};
