//! Prometheus counters for the approval workflow and pass checks.
//!
//! Registered lazily in the global default registry and exposed at
//! `GET /metrics`.

use once_cell::sync::Lazy;
use prometheus::{opts, register_counter_vec, CounterVec, Encoder, TextEncoder};

use crate::models::request::RequestKind;
use crate::pass::PassKind;

static REQUESTS_SUBMITTED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        opts!("hostel_requests_submitted_total", "Leave and visitor requests submitted"),
        &["kind"]
    )
    .expect("failed to register hostel_requests_submitted_total")
});

static REQUESTS_DECIDED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        opts!("hostel_requests_decided_total", "Requests approved or rejected"),
        &["kind", "outcome"]
    )
    .expect("failed to register hostel_requests_decided_total")
});

static PASSES_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        opts!("hostel_passes_issued_total", "Signed passes issued"),
        &["kind"]
    )
    .expect("failed to register hostel_passes_issued_total")
});

static PASSES_VERIFIED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        opts!("hostel_passes_verified_total", "Pass verifications by result"),
        &["result"]
    )
    .expect("failed to register hostel_passes_verified_total")
});

pub fn record_request_submitted(kind: RequestKind) {
    REQUESTS_SUBMITTED.with_label_values(&[kind.as_str()]).inc();
}

pub fn record_request_decided(kind: RequestKind, outcome: &str) {
    REQUESTS_DECIDED
        .with_label_values(&[kind.as_str(), outcome])
        .inc();
}

pub fn record_pass_issued(kind: PassKind) {
    PASSES_ISSUED.with_label_values(&[kind.as_str()]).inc();
}

/// `result` is one of "valid", "expired" or "invalid".
pub fn record_pass_verified(result: &str) {
    PASSES_VERIFIED.with_label_values(&[result]).inc();
}

/// Encode all registered metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap_or_default();
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_show_up_in_output() {
        record_request_submitted(RequestKind::Leave);
        record_request_decided(RequestKind::Visitor, "approved");
        record_pass_verified("valid");

        let output = encode_metrics();
        assert!(output.contains("hostel_requests_submitted_total"));
        assert!(output.contains("hostel_requests_decided_total"));
        assert!(output.contains("hostel_passes_verified_total"));
    }
}
