use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub attempts_total: u64,
    pub attempts_success: u64,
    pub unusable_pages: u64,
    pub challenges_detected: u64,
    pub network_errors: u64,
    pub http_errors: u64,
    pub retries: u64,
    pub incomplete_extractions: u64,
    pub success_rate: f64,
    pub avg_response_time_ms: u64,
    pub elapsed_seconds: f64,
}
