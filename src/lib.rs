pub mod api;
pub mod auth;
pub mod models;
pub mod pipeline;
pub mod session;
pub mod stats;
pub mod utils;

use std::sync::Arc;

use auth::{CredentialPolicy, FixedCredential};
use pipeline::annotate::Annotator;
use pipeline::detect::EmotionDetector;
use pipeline::mood::MoodWriter;
use session::SessionStore;
use utils::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub stats: Arc<stats::Stats>,
    pub sessions: Arc<SessionStore>,
    pub credentials: Arc<dyn CredentialPolicy>,
    pub detector: Arc<dyn EmotionDetector>,
    pub mood: Arc<dyn MoodWriter>,
    pub annotator: Arc<Annotator>,
}

impl AppState {
    pub fn new(
        config: Config,
        detector: Arc<dyn EmotionDetector>,
        mood: Arc<dyn MoodWriter>,
        annotator: Arc<Annotator>,
    ) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new(config.session_ttl)),
            config,
            stats: Arc::new(stats::Stats::new()),
            credentials: Arc::new(FixedCredential::default()),
            detector,
            mood,
            annotator,
        }
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialPolicy>) -> Self {
        self.credentials = credentials;
        self
    }
}
