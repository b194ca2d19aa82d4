//! Document CRUD and keyword search on top of the search engine.

mod service;

pub use service::DocumentService;
