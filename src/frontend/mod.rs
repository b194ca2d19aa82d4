//! Frontend gateway: serves the browser UI and forwards reads and inserts to
//! the backend gateway. A broken backend never takes the frontend down.

pub mod client;
pub mod handlers;
pub mod routes;

pub use client::{BackendClient, ProbeReport};
pub use routes::build_frontend_router;

use std::sync::Arc;

/// Shared frontend state
#[derive(Clone)]
pub struct FrontendState {
    pub backend: Arc<BackendClient>,
}

impl FrontendState {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }
}
