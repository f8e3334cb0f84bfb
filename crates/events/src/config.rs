use std::time::Duration;

use printsuit_core::completion_email::{TemplateOptions, DEFAULT_DASHBOARD_URL, DEFAULT_PAPER_SIZE};
use printsuit_core::status;

/// Default interval between backlog sweeps.
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Default cap on concurrently handled change-feed events.
const DEFAULT_CHANGE_FEED_CONCURRENCY: usize = 8;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@printsuit.local";

/// Notification engine configuration.
///
/// Shared by the reconciler, the sweep scheduler and the change-feed
/// listener so that all three filter on the same completion status.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Time between scheduled sweeps; the first sweep runs at startup.
    pub sweep_interval: Duration,
    /// Status literal that marks a job as completed.
    pub completion_status: String,
    /// Whether to run the change-feed listener alongside the sweep.
    pub change_feed_enabled: bool,
    /// Maximum change-feed events reconciled at once (0 = unbounded).
    pub change_feed_concurrency: usize,
    /// RFC 5322 "From" address of completion emails.
    pub from_address: String,
    /// Template defaults.
    pub template: TemplateOptions,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            completion_status: status::COMPLETED.to_string(),
            change_feed_enabled: true,
            change_feed_concurrency: DEFAULT_CHANGE_FEED_CONCURRENCY,
            from_address: DEFAULT_FROM_ADDRESS.to_string(),
            template: TemplateOptions::default(),
        }
    }
}

impl NotifierConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                           |
    /// |---------------------------|-----------------------------------|
    /// | `SWEEP_INTERVAL_SECS`     | `300`                             |
    /// | `COMPLETION_STATUS`       | `completed`                       |
    /// | `CHANGE_FEED_ENABLED`     | `true`                            |
    /// | `CHANGE_FEED_CONCURRENCY` | `8`                               |
    /// | `SMTP_FROM`               | `noreply@printsuit.local`         |
    /// | `DEFAULT_PAPER_SIZE`      | `A4`                              |
    /// | `DASHBOARD_URL`           | `http://localhost:5173/dashboard` |
    pub fn from_env() -> Self {
        let sweep_interval_secs: u64 = std::env::var("SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_SWEEP_INTERVAL_SECS.to_string())
            .parse()
            .expect("SWEEP_INTERVAL_SECS must be a valid u64");
        assert!(sweep_interval_secs > 0, "SWEEP_INTERVAL_SECS must be positive");

        let completion_status = std::env::var("COMPLETION_STATUS")
            .map(|s| s.trim().to_string())
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| status::COMPLETED.to_string());

        let change_feed_enabled: bool = std::env::var("CHANGE_FEED_ENABLED")
            .unwrap_or_else(|_| "true".into())
            .parse()
            .expect("CHANGE_FEED_ENABLED must be true or false");

        let change_feed_concurrency: usize = std::env::var("CHANGE_FEED_CONCURRENCY")
            .unwrap_or_else(|_| DEFAULT_CHANGE_FEED_CONCURRENCY.to_string())
            .parse()
            .expect("CHANGE_FEED_CONCURRENCY must be a valid usize");

        let from_address =
            std::env::var("SMTP_FROM").unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string());

        let template = TemplateOptions {
            default_paper_size: std::env::var("DEFAULT_PAPER_SIZE")
                .unwrap_or_else(|_| DEFAULT_PAPER_SIZE.to_string()),
            dashboard_url: std::env::var("DASHBOARD_URL")
                .unwrap_or_else(|_| DEFAULT_DASHBOARD_URL.to_string()),
        };

        Self {
            sweep_interval: Duration::from_secs(sweep_interval_secs),
            completion_status,
            change_feed_enabled,
            change_feed_concurrency,
            from_address,
            template,
        }
    }
}
