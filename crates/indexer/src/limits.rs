use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

pub const ENV_SCAN_CONCURRENCY: &str = "ECU_IDENT_SCAN_CONCURRENCY";

const MAX_SCAN_CONCURRENCY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConcurrencySnapshot {
    pub limit: usize,
    pub in_flight: usize,
    pub waiters: usize,
}

fn default_scan_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(2, 16)
}

fn parse_scan_concurrency(raw: Option<&str>, default_value: usize) -> usize {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default_value)
        .clamp(1, MAX_SCAN_CONCURRENCY)
}

/// File-processing concurrency from `ECU_IDENT_SCAN_CONCURRENCY`, defaulting to
/// the available parallelism.
pub fn scan_concurrency_from_env() -> usize {
    let raw = std::env::var(ENV_SCAN_CONCURRENCY).ok();
    parse_scan_concurrency(raw.as_deref(), default_scan_concurrency())
}

/// Caps how many files are read and hashed at once across every directory task.
///
/// Directory tasks themselves are cheap and unbounded; the expensive part is
/// holding file contents in memory while fingerprinting them.
#[derive(Debug)]
pub struct ScanLimiter {
    semaphore: Arc<Semaphore>,
    limit: usize,
    in_flight: Arc<AtomicUsize>,
    waiters: AtomicUsize,
}

impl ScanLimiter {
    pub fn new(limit: usize) -> Self {
        let limit = limit.clamp(1, MAX_SCAN_CONCURRENCY);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
            in_flight: Arc::new(AtomicUsize::new(0)),
            waiters: AtomicUsize::new(0),
        }
    }

    pub fn snapshot(&self) -> ScanConcurrencySnapshot {
        ScanConcurrencySnapshot {
            limit: self.limit,
            in_flight: self.in_flight.load(Ordering::Relaxed),
            waiters: self.waiters.load(Ordering::Relaxed),
        }
    }

    pub(crate) async fn acquire(&self) -> ScanPermit {
        self.waiters.fetch_add(1, Ordering::Relaxed);
        // The semaphore is never closed.
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .unwrap_or_else(|_| unreachable!("scan concurrency semaphore closed"));
        self.waiters.fetch_sub(1, Ordering::Relaxed);
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        ScanPermit {
            _permit: permit,
            in_flight: self.in_flight.clone(),
        }
    }
}

impl Default for ScanLimiter {
    fn default() -> Self {
        Self::new(scan_concurrency_from_env())
    }
}

pub(crate) struct ScanPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for ScanPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}
