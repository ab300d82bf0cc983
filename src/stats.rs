use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

/// Process-wide counters for the emotion endpoint, reported by `/health`.
pub struct Stats {
    uploads_total: AtomicU64,
    detections_total: AtomicU64,
    no_face_total: AtomicU64,
    rejected_total: AtomicU64,
    failures_total: AtomicU64,
    started: Instant,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub uploads_total: u64,
    pub detections_total: u64,
    pub no_face_total: u64,
    pub rejected_total: u64,
    pub failures_total: u64,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    pub fn new() -> Self {
        Self {
            uploads_total: AtomicU64::new(0),
            detections_total: AtomicU64::new(0),
            no_face_total: AtomicU64::new(0),
            rejected_total: AtomicU64::new(0),
            failures_total: AtomicU64::new(0),
            started: Instant::now(),
        }
    }
    pub fn inc_uploads(&self) { self.uploads_total.fetch_add(1, Ordering::Relaxed); }
    pub fn inc_detections(&self) { self.detections_total.fetch_add(1, Ordering::Relaxed); }
    pub fn inc_no_face(&self) { self.no_face_total.fetch_add(1, Ordering::Relaxed); }
    pub fn inc_rejected(&self) { self.rejected_total.fetch_add(1, Ordering::Relaxed); }
    pub fn inc_failures(&self) { self.failures_total.fetch_add(1, Ordering::Relaxed); }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            uploads_total: self.uploads_total.load(Ordering::Relaxed),
            detections_total: self.detections_total.load(Ordering::Relaxed),
            no_face_total: self.no_face_total.load(Ordering::Relaxed),
            rejected_total: self.rejected_total.load(Ordering::Relaxed),
            failures_total: self.failures_total.load(Ordering::Relaxed),
        }
    }
}
