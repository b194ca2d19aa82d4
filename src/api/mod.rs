pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::documents::DocumentService;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<DocumentService>,
}

impl AppState {
    pub fn new(documents: Arc<DocumentService>) -> Self {
        Self { documents }
    }
}
