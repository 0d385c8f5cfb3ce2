use crate::metrics::snapshot::MetricsSnapshot;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

/// How a single request against one endpoint ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    /// The page arrived but yielded no complete, valid tally
    Unusable,
    ChallengeDetected,
    NetworkError,
    HttpError,
}

#[derive(Clone)]
pub struct MetricsCollector {
    attempts_total: Arc<AtomicU64>,
    attempts_success: Arc<AtomicU64>,
    unusable_pages: Arc<AtomicU64>,
    challenges_detected: Arc<AtomicU64>,
    network_errors: Arc<AtomicU64>,
    http_errors: Arc<AtomicU64>,
    retries: Arc<AtomicU64>,
    incomplete_extractions: Arc<AtomicU64>,
    total_response_time_ms: Arc<AtomicU64>,
    start_time: Arc<Instant>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            attempts_total: Arc::new(AtomicU64::new(0)),
            attempts_success: Arc::new(AtomicU64::new(0)),
            unusable_pages: Arc::new(AtomicU64::new(0)),
            challenges_detected: Arc::new(AtomicU64::new(0)),
            network_errors: Arc::new(AtomicU64::new(0)),
            http_errors: Arc::new(AtomicU64::new(0)),
            retries: Arc::new(AtomicU64::new(0)),
            incomplete_extractions: Arc::new(AtomicU64::new(0)),
            total_response_time_ms: Arc::new(AtomicU64::new(0)),
            start_time: Arc::new(Instant::now()),
        }
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_attempt(&self, outcome: AttemptOutcome, duration: Duration) {
        self.attempts_total.fetch_add(1, Ordering::SeqCst);
        self.total_response_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
        let counter = match outcome {
            AttemptOutcome::Success => &self.attempts_success,
            AttemptOutcome::Unusable => &self.unusable_pages,
            AttemptOutcome::ChallengeDetected => &self.challenges_detected,
            AttemptOutcome::NetworkError => &self.network_errors,
            AttemptOutcome::HttpError => &self.http_errors,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    pub fn increment_retries(&self) {
        self.retries.fetch_add(1, Ordering::SeqCst);
    }

    pub fn increment_incomplete(&self) {
        self.incomplete_extractions.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let attempts = self.attempts_total.load(Ordering::SeqCst);
        let success = self.attempts_success.load(Ordering::SeqCst);
        let total_time = self.total_response_time_ms.load(Ordering::SeqCst);

        let success_rate = if attempts > 0 {
            (success as f64 / attempts as f64) * 100.0
        } else {
            0.0
        };

        let avg_response_time_ms = if attempts > 0 {
            total_time / attempts
        } else {
            0
        };

        MetricsSnapshot {
            attempts_total: attempts,
            attempts_success: success,
            unusable_pages: self.unusable_pages.load(Ordering::SeqCst),
            challenges_detected: self.challenges_detected.load(Ordering::SeqCst),
            network_errors: self.network_errors.load(Ordering::SeqCst),
            http_errors: self.http_errors.load(Ordering::SeqCst),
            retries: self.retries.load(Ordering::SeqCst),
            incomplete_extractions: self.incomplete_extractions.load(Ordering::SeqCst),
            success_rate,
            avg_response_time_ms,
            elapsed_seconds: self.start_time.elapsed().as_secs_f64(),
        }
    }
}
