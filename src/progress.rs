//! Progress tracking for exports and batch combines.
//!
//! Scopes of an export are staged concurrently, so counters are atomics and the
//! tracker is shared behind an `Arc`. Callbacks are throttled to `emit_interval`,
//! except for the final item which always produces an update.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Snapshot handed to progress callbacks.
#[derive(Debug, Clone)]
pub struct ProgressState {
    pub total_items: u64,
    pub processed_items: u64,
    pub failed_items: u64,
    pub processed_bytes: u64,
    pub elapsed_time: Duration,
    pub progress_percent: f32,
    /// Scope-qualified name of the item that triggered this update.
    pub current: Option<String>,
}

impl ProgressState {
    pub fn is_complete(&self) -> bool {
        self.processed_items >= self.total_items
    }
}

/// Progress callback function type
pub type ProgressCallback = dyn Fn(ProgressState) + Send + Sync;

pub struct ProgressTracker {
    enabled: bool,
    total_items: AtomicU64,
    processed_items: AtomicU64,
    failed_items: AtomicU64,
    processed_bytes: AtomicU64,
    start_time: Instant,
    last_emit_time: Mutex<Instant>,
    emit_interval: Duration,
    callback: Option<Arc<ProgressCallback>>,
}

impl ProgressTracker {
    /// Create a disabled tracker; updates are dropped until a callback is installed.
    pub fn new(emit_interval: Duration) -> Self {
        Self {
            enabled: false,
            total_items: AtomicU64::new(0),
            processed_items: AtomicU64::new(0),
            failed_items: AtomicU64::new(0),
            processed_bytes: AtomicU64::new(0),
            start_time: Instant::now(),
            last_emit_time: Mutex::new(Instant::now()),
            emit_interval,
            callback: None,
        }
    }

    pub fn with_callback(emit_interval: Duration, callback: Arc<ProgressCallback>) -> Self {
        let mut tracker = Self::new(emit_interval);
        tracker.enabled = true;
        tracker.callback = Some(callback);
        tracker
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_total(&self, items: u64) {
        self.total_items.store(items, Ordering::Relaxed);
    }

    /// Record one finished item (written or failed).
    pub fn record_item(&self, bytes: u64, succeeded: bool, label: &str) {
        self.processed_items.fetch_add(1, Ordering::Relaxed);
        if succeeded {
            self.processed_bytes.fetch_add(bytes, Ordering::Relaxed);
        } else {
            self.failed_items.fetch_add(1, Ordering::Relaxed);
        }
        if !self.enabled {
            return;
        }

        let state = self.snapshot(Some(label.to_string()));
        let should_emit = state.is_complete() || {
            let mut last = self.last_emit_time.lock().unwrap_or_else(|e| e.into_inner());
            let now = Instant::now();
            if now.duration_since(*last) >= self.emit_interval {
                *last = now;
                true
            } else {
                false
            }
        };
        if should_emit {
            self.emit(state);
        }
    }

    fn emit(&self, state: ProgressState) {
        if let Some(callback) = &self.callback {
            callback(state);
        }
    }

    pub fn snapshot(&self, current: Option<String>) -> ProgressState {
        let total_items = self.total_items.load(Ordering::Relaxed);
        let processed_items = self.processed_items.load(Ordering::Relaxed);
        let progress_percent = if total_items > 0 {
            (processed_items as f32 / total_items as f32 * 100.0).min(100.0)
        } else {
            0.0
        };
        ProgressState {
            total_items,
            processed_items,
            failed_items: self.failed_items.load(Ordering::Relaxed),
            processed_bytes: self.processed_bytes.load(Ordering::Relaxed),
            elapsed_time: self.start_time.elapsed(),
            progress_percent,
            current,
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}
