use serde::{Deserialize, Serialize};

/// Labels the emotion classifier can report as dominant.
pub const KNOWN_EMOTIONS: [&str; 7] = ["angry", "disgust", "fear", "happy", "sad", "surprise", "neutral"];

/// Pixel rectangle, origin top-left.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl BoundingBox {
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DetectionResult {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub label: String,
    /// Percentage in [0, 100].
    pub confidence: f64,
}

impl DetectionResult {
    /// Confidence as reported to clients and stored in history: one decimal place.
    pub fn rounded_confidence(&self) -> f64 {
        round_confidence(self.confidence)
    }

    /// Text drawn next to the box, e.g. `happy (93.4%)`.
    pub fn caption(&self) -> String {
        format!("{} ({:.1}%)", self.label, self.confidence)
    }
}

pub fn round_confidence(value: f64) -> f64 {
    (value.clamp(0.0, 100.0) * 10.0).round() / 10.0
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HistoryEntry {
    pub emotion: String,
    pub confidence: f64,
    /// Display name only; no file is kept under this name.
    pub filename: String,
}

impl HistoryEntry {
    pub fn from_detection(result: &DetectionResult, at: chrono::DateTime<chrono::Local>) -> Self {
        Self {
            emotion: result.label.clone(),
            confidence: result.rounded_confidence(),
            filename: format!("{}_{}", result.label, at.format("%Y%m%d_%H%M%S")),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct EmotionResponse {
    pub image: String,
    pub emotion: String,
    pub confidence: f64,
    pub mood_text: String,
}
