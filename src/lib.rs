//! Two-tier HTTP gateway over an Elasticsearch document index.
//!
//! The backend gateway (`search-backend`) owns the engine connection and
//! exposes document CRUD and keyword search. The frontend gateway
//! (`search-frontend`) serves the browser UI and forwards to the backend.

pub mod api;
pub mod config;
pub mod documents;
pub mod engine;
pub mod error;
pub mod frontend;
pub mod models;
pub mod retry;
pub mod server;
pub mod telemetry;

pub use error::{AppError, Result};
