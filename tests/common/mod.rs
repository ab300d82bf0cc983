#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::serve;
use image::{Rgb, RgbImage};
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::net::TcpListener;

use moodlens_backend::api::routes;
use moodlens_backend::models::emotion::{BoundingBox, DetectionResult};
use moodlens_backend::pipeline::annotate::Annotator;
use moodlens_backend::pipeline::detect::EmotionDetector;
use moodlens_backend::pipeline::mood::MoodWriter;
use moodlens_backend::utils::config::Config;
use moodlens_backend::utils::logging;
use moodlens_backend::AppState;

#[derive(Clone, Debug)]
pub enum Detection {
    Face(DetectionResult),
    NoFace,
    Fail(String),
}

pub fn face(label: &str, confidence: f64) -> Detection {
    Detection::Face(DetectionResult {
        bbox: BoundingBox { x: 8, y: 16, w: 32, h: 32 },
        label: label.to_string(),
        confidence,
    })
}

/// Detector double: replays scripted outcomes in order, repeating the last.
pub struct StubDetector {
    script: Mutex<Vec<Detection>>,
    pub calls: AtomicUsize,
    pub file_present: AtomicBool,
    pub last_path: Mutex<Option<PathBuf>>,
}

impl StubDetector {
    pub fn new(script: Vec<Detection>) -> Self {
        assert!(!script.is_empty());
        Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
            file_present: AtomicBool::new(false),
            last_path: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmotionDetector for StubDetector {
    async fn detect(&self, image_path: &Path) -> anyhow::Result<Option<DetectionResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.file_present.store(image_path.exists(), Ordering::SeqCst);
        *self.last_path.lock() = Some(image_path.to_path_buf());
        let next = {
            let mut script = self.script.lock();
            if script.len() > 1 { script.remove(0) } else { script[0].clone() }
        };
        match next {
            Detection::Face(r) => Ok(Some(r)),
            Detection::NoFace => Ok(None),
            Detection::Fail(msg) => Err(anyhow::anyhow!(msg)),
        }
    }
}

pub struct StubMood {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl StubMood {
    pub fn ok() -> Self {
        Self { fail: false, calls: AtomicUsize::new(0) }
    }

    pub fn failing() -> Self {
        Self { fail: true, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl MoodWriter for StubMood {
    async fn write_mood(&self, emotion: &str, confidence: f64) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("model 'gemma3:1b' not found");
        }
        Ok(format!(
            "Tonight's vibe is {emotion}. I'm {confidence:.1}% sure about it... \
             For that reason, here are some songs to match the mood.\n1. One\n2. Two\n3. Three"
        ))
    }
}

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub state: Arc<AppState>,
    pub detector: Arc<StubDetector>,
    pub mood: Arc<StubMood>,
    pub upload_dir: TempDir,
}

pub async fn spawn_app(detector: StubDetector, mood: StubMood) -> TestApp {
    logging::init_for_tests();
    let upload_dir = TempDir::new().unwrap();
    let mut config = Config::from_env();
    config.upload_dir = upload_dir.path().to_path_buf();

    let detector = Arc::new(detector);
    let mood = Arc::new(mood);
    let state = Arc::new(AppState::new(
        config,
        detector.clone(),
        mood.clone(),
        Arc::new(Annotator::new(None)),
    ));

    let app = routes::router(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        serve(listener, app.into_make_service()).await.unwrap();
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        base_url: format!("http://127.0.0.1:{}", port),
        client,
        state,
        detector,
        mood,
        upload_dir,
    }
}

pub async fn spawn_default_app() -> TestApp {
    spawn_app(StubDetector::new(vec![face("happy", 93.46)]), StubMood::ok()).await
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Submit the login form; returns the `Cookie` header value on success.
    pub async fn login(&self, username: &str, password: &str) -> (reqwest::Response, Option<String>) {
        let resp = self
            .client
            .post(self.url("/login"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .unwrap();
        let cookie = session_cookie(&resp);
        (resp, cookie)
    }

    pub async fn login_ok(&self) -> String {
        let (resp, cookie) = self.login("user", "54321").await;
        assert_eq!(resp.status(), 303);
        cookie.expect("login should set a session cookie")
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(self.url(path));
        if let Some(c) = cookie {
            req = req.header(reqwest::header::COOKIE, c);
        }
        req.send().await.unwrap()
    }

    pub async fn post(&self, path: &str, cookie: Option<&str>) -> reqwest::Response {
        let mut req = self.client.post(self.url(path));
        if let Some(c) = cookie {
            req = req.header(reqwest::header::COOKIE, c);
        }
        req.send().await.unwrap()
    }

    pub async fn upload(&self, cookie: Option<&str>, filename: &str, bytes: Vec<u8>) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("image", part);
        let mut req = self.client.post(self.url("/api/process-emotion")).multipart(form);
        if let Some(c) = cookie {
            req = req.header(reqwest::header::COOKIE, c);
        }
        req.send().await.unwrap()
    }

    pub async fn history(&self, cookie: &str) -> Vec<serde_json::Value> {
        let resp = self.get("/api/get-history", Some(cookie)).await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        body["history"].as_array().unwrap().clone()
    }

    pub fn leftover_uploads(&self) -> usize {
        std::fs::read_dir(self.upload_dir.path()).unwrap().count()
    }
}

/// `name=value` pair from the session `Set-Cookie` header, ready to send back.
pub fn session_cookie(resp: &reqwest::Response) -> Option<String> {
    resp.headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.starts_with("moodlens_session=") && pair.len() > "moodlens_session=".len())
        .map(str::to_string)
}

pub fn location(resp: &reqwest::Response) -> String {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Small solid-colour JPEG.
pub fn jpeg_bytes() -> Vec<u8> {
    let img = RgbImage::from_pixel(64, 64, Rgb([200, 170, 150]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .unwrap();
    buf
}

pub fn png_bytes() -> Vec<u8> {
    let img = RgbImage::from_pixel(48, 48, Rgb([20, 40, 60]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}
