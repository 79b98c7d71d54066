//! State shared by every handler and by the route guard.

use crate::domain::{MetricsPtr, RepositoryPtr};
use crate::session::SessionKeys;
use std::sync::Arc;

/// Handles cloned into each request via axum's `State` extractor.
///
/// Built once in `create_router()`. The signing keys never change after
/// startup, so a token issued by one request verifies in any other.
#[derive(Clone)]
pub struct AppState {
    /// Prometheus-backed, or no-op when `ADMIN_METRICS_TYPE=noop`.
    metrics: MetricsPtr,

    /// User accounts: PostgreSQL in production, in-memory in tests.
    repository: RepositoryPtr,

    session_keys: Arc<SessionKeys>,
}

impl AppState {
    // ---

    pub fn new(metrics: MetricsPtr, repository: RepositoryPtr, session_keys: SessionKeys) -> Self {
        // ---
        AppState {
            metrics,
            repository,
            session_keys: Arc::new(session_keys),
        }
    }

    /// Get a reference to the metrics implementation.
    pub(crate) fn metrics(&self) -> &MetricsPtr {
        // ---
        &self.metrics
    }

    /// Get a reference to the repository implementation.
    pub(crate) fn repository(&self) -> &RepositoryPtr {
        // ---
        &self.repository
    }

    /// Get a reference to the session signing keys.
    pub(crate) fn session_keys(&self) -> &SessionKeys {
        // ---
        &self.session_keys
    }
}

#[cfg(test)]
mod tests {
    // ---

    use super::*;
    use crate::infrastructure::{create_memory_repository, create_noop_metrics};

    #[test]
    fn test_app_state_creation_and_clone() {
        // ---
        let metrics = create_noop_metrics().unwrap();
        let repository = create_memory_repository();
        let keys = SessionKeys::new(b"state-secret", true);

        let app_state = AppState::new(metrics, repository, keys);
        let cloned = app_state.clone();

        // Clones share the same keys
        assert!(std::ptr::eq(app_state.session_keys(), cloned.session_keys()));
        assert!(cloned.session_keys().secure_cookies());
        let _metrics_ref = app_state.metrics();
        let _repo_ref = app_state.repository();
    }
}
