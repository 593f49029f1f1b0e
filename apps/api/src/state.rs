use crate::coordinator::CoordinatorHandle;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub coordinator: CoordinatorHandle,
}
