use std::sync::Arc;

use crate::parser_client::ResumeParser;
use crate::parsing::staging::FileStore;
use crate::parsing::store::ResultStore;

/// Shared application state injected into all route handlers via Axum
/// extractors. The three trait objects are the system's external
/// collaborators: the remote parsing API, the staging transport, and the
/// result store.
#[derive(Clone)]
pub struct AppState {
    pub parser: Arc<dyn ResumeParser>,
    pub files: Arc<dyn FileStore>,
    pub results: Arc<dyn ResultStore>,
}
