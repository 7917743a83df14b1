//! Background, best-effort delivery of pin failure reports.
//!
//! The challenge path must never wait on the collector, so dispatch is a
//! non-blocking hand-off into a bounded queue. A dedicated worker thread
//! (running a current-thread tokio runtime) exclusively owns the HTTP
//! client and the de-duplication cache: no locks anywhere near the hot
//! path. Delivery failures are logged and dropped — the disposition was
//! already returned to the TLS layer before the report even queued.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::runtime::Builder;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::report::{ReportCacheKey, ViolationReport};

/// Most reports that may sit in the queue; overflow is dropped, not queued.
const QUEUE_CAPACITY: usize = 32;

/// Bound on each outbound report request.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Attempts per report URI before giving up.
const DELIVERY_ATTEMPTS: u32 = 2;

/// Pause between delivery attempts.
const RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Queues pin failure reports for background delivery.
pub struct ReportDispatcher {
    tx: mpsc::Sender<ViolationReport>,
    queued: Arc<AtomicU64>,
}

impl ReportDispatcher {
    /// Spawn the dispatcher worker.
    ///
    /// `cache_window` of `None` de-duplicates identical reports for the
    /// lifetime of the process; `Some(window)` uses a rolling window.
    #[must_use]
    pub fn new(cache_window: Option<Duration>) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let spawned = thread::Builder::new()
            .name("pin-report-dispatcher".into())
            .spawn(move || run_worker(rx, cache_window));
        if let Err(e) = spawned {
            warn!(error = %e, "failed to spawn report dispatcher; reports will be dropped");
        }
        Self {
            tx,
            queued: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Queue a report for delivery. Never blocks: when the queue is full or
    /// the worker is gone, the report is dropped with a warning.
    pub fn dispatch(&self, report: ViolationReport) {
        use mpsc::error::TrySendError;

        match self.tx.try_send(report) {
            Ok(()) => {
                self.queued.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Full(dropped)) => {
                warn!(
                    hostname = %dropped.report.hostname,
                    "report queue full, dropping pin failure report"
                );
            }
            Err(TrySendError::Closed(dropped)) => {
                warn!(
                    hostname = %dropped.report.hostname,
                    "report dispatcher unavailable, dropping pin failure report"
                );
            }
        }
    }

    /// Reports accepted into the queue since startup (monitoring hook;
    /// de-duplication happens later, in the worker).
    #[must_use]
    pub fn queued_report_count(&self) -> u64 {
        self.queued.load(Ordering::Relaxed)
    }
}

fn run_worker(mut rx: mpsc::Receiver<ViolationReport>, cache_window: Option<Duration>) {
    let runtime = match Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            warn!(error = %e, "failed to start report dispatcher runtime");
            return;
        }
    };

    runtime.block_on(async move {
        let client = match Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .user_agent(format!("certpin/{}", env!("CARGO_PKG_VERSION")))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "failed to build report HTTP client");
                return;
            }
        };

        let mut limiter = RateLimiter::new(cache_window);
        while let Some(violation) = rx.recv().await {
            if limiter.should_suppress(violation.cache_key()) {
                debug!(
                    hostname = %violation.report.hostname,
                    "identical report already sent within the window, suppressing"
                );
                continue;
            }
            deliver(&client, &violation).await;
        }
    });
}

async fn deliver(client: &Client, violation: &ViolationReport) {
    for uri in &violation.report_uris {
        for attempt in 1..=DELIVERY_ATTEMPTS {
            match client.post(uri.clone()).json(&violation.report).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(uri = %uri, attempt, "pin failure report delivered");
                    break;
                }
                Ok(response) => {
                    warn!(
                        uri = %uri,
                        attempt,
                        status = %response.status(),
                        "report endpoint returned non-success"
                    );
                }
                Err(e) => {
                    warn!(uri = %uri, attempt, error = %e, "failed to deliver pin failure report");
                }
            }
            if attempt < DELIVERY_ATTEMPTS {
                tokio::time::sleep(RETRY_PAUSE).await;
            }
        }
    }
}

/// Suppresses reports whose identity was already seen within the window.
///
/// Owned exclusively by the worker; needs no synchronization.
struct RateLimiter {
    seen: HashSet<ReportCacheKey>,
    window: Option<Duration>,
    window_started: Instant,
}

impl RateLimiter {
    fn new(window: Option<Duration>) -> Self {
        Self {
            seen: HashSet::new(),
            window,
            window_started: Instant::now(),
        }
    }

    /// Record `key` and return whether an identical report was already sent
    /// within the current window.
    fn should_suppress(&mut self, key: ReportCacheKey) -> bool {
        if let Some(window) = self.window {
            if self.window_started.elapsed() >= window {
                self.seen.clear();
                self.window_started = Instant::now();
            }
        }
        !self.seen.insert(key)
    }
}
