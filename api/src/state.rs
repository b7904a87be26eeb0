use std::sync::Arc;

use sqlx::PgPool;

use crate::generation::GenerationClient;

/// Process-wide handles, created once at startup and injected into handlers.
/// The generation client is a trait object so tests can substitute stubs.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub generation: Arc<dyn GenerationClient>,
}
