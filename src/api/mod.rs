pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::search::ThreadSearchService;
use crate::state::ThreadStore;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ThreadStore>,
    pub search: Arc<ThreadSearchService>,
}

impl AppState {
    pub fn new(store: Arc<dyn ThreadStore>, search: Arc<ThreadSearchService>) -> Self {
        Self { store, search }
    }
}
