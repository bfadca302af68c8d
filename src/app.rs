use std::sync::Arc;

use unicode_truncate::{Alignment, UnicodeTruncateStr};

use crate::config::{AppConfig, ConfigError, build_client};
use crate::http_probe::report;
use crate::runner::{run, summary::RunSummary};

/// Process exit code when the configuration could not be loaded or used.
pub const CONFIG_ERROR_EXIT: u8 = 2;

pub fn to_fixed_width(input: &str, width: usize) -> String {
    input.unicode_pad(width, Alignment::Left, true).into_owned()
}

pub fn summary_lines(label: &str, check_name: &str, summary: &RunSummary) -> [String; 2] {
    let icon = if summary.all_passed() { "✅" } else { "❌" };
    [
        format!(
            "[{label}] {icon} {check_name}: {} passed, {} failed ({} requests in {:.2}s, {:.1} req/s)",
            summary.passed,
            summary.failed,
            summary.total(),
            summary.elapsed.as_secs_f64(),
            summary.requests_per_second()
        ),
        format!(
            "[{label}]    status codes: {}, transport errors: {}",
            summary.status_histogram(),
            summary.transport_errors
        ),
    ]
}

/// Run the loaded configuration and return the process exit code:
/// `0` when every check passed, `1` when any failed, [`CONFIG_ERROR_EXIT`]
/// when the configuration is unusable.
pub async fn run_app(loaded: Result<AppConfig, ConfigError>) -> u8 {
    match loaded {
        Ok(app_config) => run_scenarios(app_config).await,
        Err(e) => {
            log::error!("{}", report(&e));
            CONFIG_ERROR_EXIT
        }
    }
}

/// Run every scenario one after another, printing a summary for each.
pub async fn run_scenarios(app_config: AppConfig) -> u8 {
    println!(
        "Running {} scenario(s), started at {}",
        app_config.scenarios.len(),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    let mut exit_code: u8 = 0;
    for (name, probe_config) in app_config.scenarios {
        let label = to_fixed_width(&name, app_config.max_name_width);

        let client = match build_client(&probe_config) {
            Ok(client) => client,
            Err(e) => {
                log::error!("[{label}] Failed to create client: {}", report(&e));
                return CONFIG_ERROR_EXIT;
            }
        };

        log::info!(
            "[{label}] GET {} with {} virtual user(s) for {}",
            probe_config.target_url(),
            probe_config.concurrency(),
            probe_config.describe_run_length()
        );

        let probe_config = Arc::new(probe_config);
        let summary = run(client, probe_config.clone(), &label).await;
        for line in summary_lines(&label, probe_config.check_name(), &summary) {
            println!("{line}");
        }
        exit_code = exit_code.max(summary.exit_code());
    }

    exit_code
}
