use std::sync::atomic::{AtomicU64, Ordering};

/// Process-local counters for the sweep workflows. An exporter surface is
/// deliberately out of scope; the totals are logged on shutdown.
#[derive(Debug, Default)]
pub struct Stats {
    new_orders: AtomicU64,
    overdue_orders: AtomicU64,
    api_errors: AtomicU64,
}

impl Stats {
    pub fn incr_new_orders(&self) {
        self.new_orders.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_overdue_orders(&self) {
        self.overdue_orders.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_api_errors(&self) {
        self.api_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn new_orders(&self) -> u64 {
        self.new_orders.load(Ordering::Relaxed)
    }

    pub fn overdue_orders(&self) -> u64 {
        self.overdue_orders.load(Ordering::Relaxed)
    }

    pub fn api_errors(&self) -> u64 {
        self.api_errors.load(Ordering::Relaxed)
    }
}
