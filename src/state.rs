use std::sync::Arc;

use crate::{service::PersonService, store::PersonStore};

#[derive(Clone)]
pub struct AppState {
    pub persons: PersonService,
}

impl AppState {
    pub fn new(store: Arc<dyn PersonStore>) -> Self {
        Self {
            persons: PersonService::new(store),
        }
    }
}
