use std::sync::Arc;

/// Source of wall-clock time in epoch milliseconds.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A [`Clock`] backed by the system time.
pub fn system_clock() -> Clock {
    Arc::new(now_millis)
}
