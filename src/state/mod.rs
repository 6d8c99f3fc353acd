pub mod machine;

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{config::AppConfig, dao::quiz_store::QuizStore, error::ServiceError};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state holding the storage handle and configuration.
///
/// No mutable game data lives here: every request re-reads what it needs
/// through the store, so multiple server instances sharing one backend stay
/// consistent.
pub struct AppState {
    quiz_store: RwLock<Option<Arc<dyn QuizStore>>>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        Arc::new(Self {
            quiz_store: RwLock::new(None),
            config,
        })
    }

    /// Obtain a handle to the current quiz store, if one is installed.
    pub async fn quiz_store(&self) -> Option<Arc<dyn QuizStore>> {
        let guard = self.quiz_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the quiz store or fail with a degraded-mode error.
    pub async fn require_quiz_store(&self) -> Result<Arc<dyn QuizStore>, ServiceError> {
        self.quiz_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new quiz store implementation and leave degraded mode.
    pub async fn install_quiz_store(&self, store: Arc<dyn QuizStore>) {
        let mut guard = self.quiz_store.write().await;
        *guard = Some(store);
    }

    /// Remove the current quiz store and enter degraded mode.
    pub async fn clear_quiz_store(&self) {
        let mut guard = self.quiz_store.write().await;
        guard.take();
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.quiz_store.read().await;
        guard.is_none()
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
