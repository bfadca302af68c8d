use std::{
    collections::BTreeMap,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use crate::http_probe::result::ProbeResult;

/// Aggregate counters shared by all virtual users of a run.
#[derive(Debug, Default)]
pub struct Counters {
    passed: AtomicU64,
    failed: AtomicU64,
    transport_errors: AtomicU64,
    status_codes: Mutex<BTreeMap<u16, u64>>,
}

impl Counters {
    pub fn record(&self, result: &ProbeResult) {
        if result.passed {
            self.passed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        if result.error.is_some() {
            self.transport_errors.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(status) = result.http_status {
            let mut codes = self
                .status_codes
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *codes.entry(status).or_insert(0) += 1;
        }
    }

    pub fn snapshot(&self, elapsed: Duration) -> RunSummary {
        RunSummary {
            passed: self.passed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            status_codes: self
                .status_codes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            elapsed,
        }
    }
}

/// Result of one scenario run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub passed: u64,
    pub failed: u64,
    pub transport_errors: u64,
    /// Response count per status code, transport errors excluded.
    pub status_codes: BTreeMap<u16, u64>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn total(&self) -> u64 {
        self.passed + self.failed
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn requests_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total() as f64 / secs
        } else {
            0.0
        }
    }

    /// `0` when every check passed, `1` otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.all_passed() { 0 } else { 1 }
    }

    /// e.g. `200 x198, 404 x2`
    pub fn status_histogram(&self) -> String {
        if self.status_codes.is_empty() {
            return "none".to_string();
        }
        self.status_codes
            .iter()
            .map(|(code, count)| format!("{code} x{count}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
