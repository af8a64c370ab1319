use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, IntCounterVec};

// Prometheus metrics (default registry)
pub static HOLD_OPERATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "holdkeeper_hold_operations_total",
        "Hold lifecycle operations by operation and outcome",
        &["op", "outcome"]
    )
    .expect("register hold_operations_total")
});

pub static BULK_ITEMS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "holdkeeper_bulk_items_total",
        "Items processed by bulk hold jobs by outcome",
        &["job", "outcome"]
    )
    .expect("register bulk_items_total")
});

pub static JOB_ATTEMPTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "holdkeeper_job_attempts_total",
        "Job attempts started",
        &["job"]
    )
    .expect("register job_attempts_total")
});

pub static JOB_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "holdkeeper_job_failures_total",
        "Jobs that exhausted all attempts",
        &["job"]
    )
    .expect("register job_failures_total")
});

pub fn record_hold_op(op: &str, outcome: &str) {
    HOLD_OPERATIONS_TOTAL.with_label_values(&[op, outcome]).inc();
}

pub fn record_bulk_item(job: &str, outcome: &str) {
    BULK_ITEMS_TOTAL.with_label_values(&[job, outcome]).inc();
}
