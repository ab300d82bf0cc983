use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use anyhow::Context;
use moodlens_backend::pipeline::annotate::{self, Annotator};
use moodlens_backend::pipeline::detect::DeepFaceDetector;
use moodlens_backend::pipeline::mood::OllamaMoodWriter;
use moodlens_backend::utils::config::Config;
use moodlens_backend::utils::logging;
use moodlens_backend::AppState;
use tracing::{debug, info};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cfg = Config::from_env();
    std::fs::create_dir_all(&cfg.upload_dir)
        .with_context(|| format!("Failed to create upload dir {:?}", cfg.upload_dir))?;

    let detector = DeepFaceDetector::new(&cfg.detector_url, &cfg.detector_backend, cfg.http_timeout)?;
    let mood = OllamaMoodWriter::new(&cfg.llm_url, &cfg.llm_model, cfg.http_timeout)?;
    info!("Emotion detector: {} (backend={})", cfg.detector_url, cfg.detector_backend);
    info!("Mood text: {} (model={})", cfg.llm_url, mood.model());

    // Font parsing touches the filesystem; keep it off the runtime threads.
    let font_path = cfg.font_path.clone();
    let font = tokio::task::spawn_blocking(move || annotate::load_label_font(font_path.as_deref())).await?;
    let annotator = Arc::new(Annotator::new(font));

    let addr = SocketAddr::new(cfg.bind, cfg.port);
    let state = Arc::new(AppState::new(cfg, Arc::new(detector), Arc::new(mood), annotator));

    {
        let sessions = state.sessions.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
            loop {
                ticker.tick().await;
                let dropped = sessions.sweep_expired();
                if dropped > 0 {
                    debug!("Expired {} idle sessions", dropped);
                }
            }
        });
    }

    let app = moodlens_backend::api::routes::router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening" = %addr);
    axum::serve(listener, app).await?;
    Ok(())
}
