use ab_glyph::{FontArc, PxScale};
use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::path::Path;
use tracing::{info, warn};

use crate::models::emotion::DetectionResult;

pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BOX_THICKNESS: u32 = 2;
const LABEL_SCALE: f32 = 24.0;
const LABEL_GAP: i64 = 10;
const JPEG_MIME: &str = "image/jpeg";

/// Fonts tried, in order, when no font path is configured.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub fn load_font_file(path: &Path) -> Result<FontArc> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read font {:?}", path))?;
    FontArc::try_from_vec(data).with_context(|| format!("Not a usable TrueType font: {:?}", path))
}

/// Font for the emotion caption: the configured file, else the first system
/// font that loads. `None` means captions are skipped and only boxes drawn.
pub fn load_label_font(configured: Option<&Path>) -> Option<FontArc> {
    if let Some(path) = configured {
        match load_font_file(path) {
            Ok(font) => {
                info!("Using label font {:?}", path);
                return Some(font);
            }
            Err(e) => warn!("{:#}; falling back to system fonts", e),
        }
    }
    for candidate in FONT_CANDIDATES {
        let path = Path::new(candidate);
        if path.exists() {
            if let Ok(font) = load_font_file(path) {
                info!("Using label font {:?}", path);
                return Some(font);
            }
        }
    }
    warn!("No label font found; annotated images will carry the box only");
    None
}

pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).context("Failed to decode image")
}

pub struct Annotator {
    font: Option<FontArc>,
}

impl Annotator {
    pub fn new(font: Option<FontArc>) -> Self {
        Self { font }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Copy of `image` with the face box and caption drawn on it.
    pub fn annotate(&self, image: &DynamicImage, result: &DetectionResult) -> RgbImage {
        let mut canvas = image.to_rgb8();
        let dims = canvas.dimensions();
        let b = result.bbox;
        let (x, y, w, h) = (i64::from(b.x), i64::from(b.y), i64::from(b.w), i64::from(b.h));

        for i in 0..i64::from(BOX_THICKNESS) {
            let inset = 2 * i;
            if w <= inset || h <= inset {
                break;
            }
            if let Some(rect) = clip_outline(x + i, y + i, w - inset, h - inset, dims) {
                draw_hollow_rect_mut(&mut canvas, rect, BOX_COLOR);
            }
        }

        if let Some(font) = &self.font {
            let caption = result.caption();
            let scale = PxScale::from(LABEL_SCALE);
            let (text_w, text_h) = text_size(scale, font, &caption);
            let (text_w, text_h) = (i64::from(text_w), i64::from(text_h));
            let above = y - LABEL_GAP - text_h;
            let label_y = if above >= 0 { above } else { y + h + LABEL_GAP / 2 };
            let on_canvas = (-text_w..i64::from(dims.0)).contains(&x) && (-text_h..i64::from(dims.1)).contains(&label_y);
            // Both coordinates lie within a canvas-sized margin here, so they fit in i32.
            if on_canvas {
                draw_text_mut(&mut canvas, BOX_COLOR, x as i32, label_y as i32, scale, font, &caption);
            }
        }
        canvas
    }

    /// Annotate, JPEG-encode and wrap as a `data:` URI ready for an `<img src>`.
    pub fn render_data_uri(&self, image: &DynamicImage, result: &DetectionResult) -> Result<String> {
        let annotated = self.annotate(image, result);
        let jpeg = encode_jpeg(annotated)?;
        Ok(to_data_uri(&jpeg))
    }
}

/// Outline rectangle clipped to one pixel beyond each canvas edge.
///
/// Edges that fall outside the canvas stay outside, so the visible part of the
/// outline is unchanged while the coordinates stay small enough for `Rect`.
fn clip_outline(x: i64, y: i64, w: i64, h: i64, (canvas_w, canvas_h): (u32, u32)) -> Option<Rect> {
    let left = x.max(-1);
    let top = y.max(-1);
    let right = (x + w - 1).min(i64::from(canvas_w));
    let bottom = (y + h - 1).min(i64::from(canvas_h));
    if right < left || bottom < top {
        return None;
    }
    Some(Rect::at(left as i32, top as i32).of_size((right - left + 1) as u32, (bottom - top + 1) as u32))
}

pub fn encode_jpeg(image: RgbImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .context("Failed to encode annotated image")?;
    Ok(buf)
}

pub fn to_data_uri(jpeg: &[u8]) -> String {
    format!("data:{};base64,{}", JPEG_MIME, general_purpose::STANDARD.encode(jpeg))
}
