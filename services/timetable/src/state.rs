//! Application state shared across request handlers.

use std::sync::Arc;

use crate::service::TimetableService;

/// Shared application state.
///
/// This is passed to all request handlers via Axum's state extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    service: TimetableService,
}

impl AppState {
    pub fn new(service: TimetableService) -> Self {
        Self {
            inner: Arc::new(AppStateInner { service }),
        }
    }

    pub fn service(&self) -> &TimetableService {
        &self.inner.service
    }
}
