pub mod summary;

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use reqwest::Client;
use tokio::time::Instant;

use crate::config::ProbeConfig;
use crate::http_probe::prelude::*;
use summary::{Counters, RunSummary};

/// Run a scenario: spawn `concurrency` virtual users that keep probing the
/// target until the shared iteration budget is used up or the duration has
/// passed. Iterations already in flight at the deadline are finished and counted.
pub async fn run(client: Client, config: Arc<ProbeConfig>, label: &str) -> RunSummary {
    let counters = Arc::new(Counters::default());
    let issued = Arc::new(AtomicU64::new(0));
    let label: Arc<str> = Arc::from(label);

    let started = Instant::now();
    let deadline = config.duration().map(|d| started + d);

    let mut handles = Vec::with_capacity(config.concurrency());
    for vu in 1..=config.concurrency() {
        let client = client.clone();
        let config = config.clone();
        let counters = counters.clone();
        let issued = issued.clone();
        let label = label.clone();

        handles.push(tokio::spawn(async move {
            virtual_user(vu, &client, &config, &issued, deadline, &counters, &label).await;
        }));
    }

    for handle in handles {
        if let Err(e) = handle.await {
            log::error!("[{label}] Virtual user stopped unexpectedly: {e}");
        }
    }

    counters.snapshot(started.elapsed())
}

/// One line describing a failed check: status and body excerpt, or the error chain.
fn failure_diagnostic(check_name: &str, result: &ProbeResult) -> String {
    match (&result.error, result.http_status) {
        (Some(error), Some(status)) => {
            format!("❌ {check_name} failed: status={status} error={error}")
        }
        (Some(error), None) => format!("❌ {check_name} failed: no response, error={error}"),
        (None, status) => format!(
            "❌ {check_name} failed: status={} body={}",
            status.unwrap_or_default(),
            result.body_preview
        ),
    }
}

async fn virtual_user(
    vu: usize,
    client: &Client,
    config: &ProbeConfig,
    issued: &AtomicU64,
    deadline: Option<Instant>,
    counters: &Counters,
    label: &str,
) {
    let mut iterations = 0u64;
    loop {
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            break;
        }
        // Claim an iteration before issuing it so the total never overshoots
        if let Some(limit) = config.iterations() {
            if issued.fetch_add(1, Ordering::Relaxed) >= limit {
                break;
            }
        }

        let result = probe_url(client, config).await;
        if result.passed {
            log::debug!(
                "[{label}] vu={vu} ✅ {}: {:?} in {:.2}ms",
                config.check_name(),
                result.http_status,
                result.http_time * 1000.0
            );
        } else {
            log::warn!("[{label}] vu={vu} {}", failure_diagnostic(config.check_name(), &result));
        }
        counters.record(&result);
        iterations += 1;
    }
    log::debug!("[{label}] vu={vu} finished after {iterations} iterations");
}
