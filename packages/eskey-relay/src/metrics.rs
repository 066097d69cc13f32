//! Prometheus metrics (lock-free atomics, zero allocation on hot path).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    // --- Traffic ---
    pub send_requests: AtomicU64,
    pub trustline_requests: AtomicU64,
    pub claim_requests: AtomicU64,

    // --- Outcomes ---
    pub unauthorized: AtomicU64,
    pub validation_errors: AtomicU64,
    pub ledger_errors: AtomicU64,
    pub payments_submitted: AtomicU64,
    pub trustline_envelopes: AtomicU64,

    // --- Latency (μs, updated via CAS) ---
    pub handler_duration_us_sum: AtomicU64,
    pub handler_duration_us_max: AtomicU64,

    // --- Horizon ---
    pub ledger_http_errors: AtomicU64,
}

impl Metrics {
    const fn new() -> Self {
        Self {
            send_requests: AtomicU64::new(0),
            trustline_requests: AtomicU64::new(0),
            claim_requests: AtomicU64::new(0),
            unauthorized: AtomicU64::new(0),
            validation_errors: AtomicU64::new(0),
            ledger_errors: AtomicU64::new(0),
            payments_submitted: AtomicU64::new(0),
            trustline_envelopes: AtomicU64::new(0),
            handler_duration_us_sum: AtomicU64::new(0),
            handler_duration_us_max: AtomicU64::new(0),
            ledger_http_errors: AtomicU64::new(0),
        }
    }

    /// Add one handler run to the latency sum and running max.
    pub fn record_duration(&self, start: Instant) {
        let us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.handler_duration_us_sum.fetch_add(us, Ordering::Relaxed);
        self.handler_duration_us_max.fetch_max(us, Ordering::Relaxed);
    }

    /// Count a handler failure under its error class.
    pub fn record_error(&self, err: &crate::Error) {
        let counter = match err {
            crate::Error::Unauthorized => &self.unauthorized,
            crate::Error::Validation(_) => &self.validation_errors,
            crate::Error::Ledger(_) | crate::Error::Config(_) => &self.ledger_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Render in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let send = self.send_requests.load(Ordering::Relaxed);
        let trustline = self.trustline_requests.load(Ordering::Relaxed);
        let claim = self.claim_requests.load(Ordering::Relaxed);
        let unauthorized = self.unauthorized.load(Ordering::Relaxed);
        let validation = self.validation_errors.load(Ordering::Relaxed);
        let ledger = self.ledger_errors.load(Ordering::Relaxed);
        let submitted = self.payments_submitted.load(Ordering::Relaxed);
        let envelopes = self.trustline_envelopes.load(Ordering::Relaxed);
        let dur_sum = self.handler_duration_us_sum.load(Ordering::Relaxed);
        let dur_max = self.handler_duration_us_max.swap(0, Ordering::Relaxed);
        let http_errors = self.ledger_http_errors.load(Ordering::Relaxed);

        // Convert μs to seconds for Prometheus conventions
        let dur_sum_s = dur_sum as f64 / 1_000_000.0;
        let dur_max_s = dur_max as f64 / 1_000_000.0;

        format!(
            "\
# HELP relay_requests_total Relay requests received, by endpoint.\n\
# TYPE relay_requests_total counter\n\
relay_requests_total{{endpoint=\"send_eskey\"}} {send}\n\
relay_requests_total{{endpoint=\"trustline\"}} {trustline}\n\
relay_requests_total{{endpoint=\"claim\"}} {claim}\n\
# HELP relay_unauthorized_total Requests rejected for a bad relay key.\n\
# TYPE relay_unauthorized_total counter\n\
relay_unauthorized_total {unauthorized}\n\
# HELP relay_validation_errors_total Requests rejected for missing or invalid fields.\n\
# TYPE relay_validation_errors_total counter\n\
relay_validation_errors_total {validation}\n\
# HELP relay_ledger_errors_total Requests failed by the ledger.\n\
# TYPE relay_ledger_errors_total counter\n\
relay_ledger_errors_total {ledger}\n\
# HELP relay_payments_submitted_total Payments accepted by the ledger.\n\
# TYPE relay_payments_submitted_total counter\n\
relay_payments_submitted_total {submitted}\n\
# HELP relay_trustline_envelopes_total Unsigned trust-line envelopes built.\n\
# TYPE relay_trustline_envelopes_total counter\n\
relay_trustline_envelopes_total {envelopes}\n\
# HELP relay_handler_duration_seconds_sum Total handler time (seconds).\n\
# TYPE relay_handler_duration_seconds_sum counter\n\
relay_handler_duration_seconds_sum {dur_sum_s:.6}\n\
# HELP relay_handler_duration_seconds_max Max handler time since last scrape (seconds).\n\
# TYPE relay_handler_duration_seconds_max gauge\n\
relay_handler_duration_seconds_max {dur_max_s:.6}\n\
# HELP relay_horizon_errors_total Failed Horizon HTTP calls.\n\
# TYPE relay_horizon_errors_total counter\n\
relay_horizon_errors_total {http_errors}\n"
        )
    }
}
