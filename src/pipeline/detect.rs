use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::models::emotion::{BoundingBox, DetectionResult};

/// Locates a face in an image file and classifies its emotion.
///
/// `Ok(None)` means the image was analysed and no face was found; `Err` means
/// the classifier itself failed.
#[async_trait]
pub trait EmotionDetector: Send + Sync {
    async fn detect(&self, image_path: &Path) -> Result<Option<DetectionResult>>;
}

/// Client for a DeepFace REST server (`POST /analyze`).
pub struct DeepFaceDetector {
    client: reqwest::Client,
    analyze_url: String,
    backend: String,
}

impl DeepFaceDetector {
    pub fn new(base_url: &str, backend: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            analyze_url: format!("{}/analyze", base_url.trim_end_matches('/')),
            backend: backend.to_string(),
        })
    }
}

#[async_trait]
impl EmotionDetector for DeepFaceDetector {
    async fn detect(&self, image_path: &Path) -> Result<Option<DetectionResult>> {
        let bytes = tokio::fs::read(image_path)
            .await
            .with_context(|| format!("Failed to read image: {:?}", image_path))?;
        let mime = mime_guess::from_path(image_path).first_or_octet_stream();
        let img = format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(&bytes));

        let payload = serde_json::json!({
            "img": img,
            "actions": ["emotion"],
            "detector_backend": self.backend,
            "enforce_detection": false,
        });

        debug!("Sending {} bytes to {} (backend={})", bytes.len(), self.analyze_url, self.backend);
        let response = self
            .client
            .post(&self.analyze_url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("Emotion detector unreachable at {}", self.analyze_url))?;

        let status = response.status();
        let text = response.text().await.context("Failed to read detector response body")?;
        if !status.is_success() {
            anyhow::bail!("Emotion detector returned HTTP {}: {}", status, snippet(&text));
        }

        let body: AnalyzeBody = serde_json::from_str(&text)
            .with_context(|| format!("Unexpected detector response: {}", snippet(&text)))?;
        let result = interpret(body)?;
        match &result {
            Some(r) => info!("Detected {} ({:.1}%) at {:?}", r.label, r.confidence, r.bbox),
            None => info!("Detector found no face in {:?}", image_path),
        }
        Ok(result)
    }
}

fn snippet(text: &str) -> &str {
    let end = text.char_indices().nth(300).map(|(i, _)| i).unwrap_or(text.len());
    &text[..end]
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnalyzeBody {
    Wrapped { results: Vec<FaceAnalysis> },
    Bare(Vec<FaceAnalysis>),
}

#[derive(Debug, Deserialize)]
struct FaceAnalysis {
    region: Region,
    dominant_emotion: String,
    emotion: HashMap<String, f64>,
    #[serde(default)]
    face_confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Region {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

/// Reduce an analysis to the first face, or `None` when there is no face.
///
/// With `enforce_detection` off, DeepFace answers a faceless image with a
/// single whole-frame region and a face confidence of zero.
fn interpret(body: AnalyzeBody) -> Result<Option<DetectionResult>> {
    let results = match body {
        AnalyzeBody::Wrapped { results } => results,
        AnalyzeBody::Bare(results) => results,
    };
    let Some(face) = results.into_iter().next() else {
        return Ok(None);
    };
    if face.face_confidence.is_some_and(|c| c <= 0.0) {
        return Ok(None);
    }
    let bbox = BoundingBox {
        x: face.region.x.max(0.0).round() as i32,
        y: face.region.y.max(0.0).round() as i32,
        w: face.region.w.max(0.0).round() as u32,
        h: face.region.h.max(0.0).round() as u32,
    };
    if bbox.is_empty() {
        return Ok(None);
    }
    let score = face
        .emotion
        .get(&face.dominant_emotion)
        .copied()
        .with_context(|| format!("Detector gave no score for dominant emotion {:?}", face.dominant_emotion))?;
    Ok(Some(DetectionResult {
        bbox,
        label: face.dominant_emotion,
        confidence: score.clamp(0.0, 100.0),
    }))
}
