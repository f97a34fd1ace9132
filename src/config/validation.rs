//! Semantic validation of a parsed configuration.
//!
//! Serde handles syntax; this checks ranges and cross-field rules and
//! reports every problem found, not just the first.

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::config::schema::{CatalogSourceKind, StorefrontConfig};
use crate::resilience::RetryPolicy;

/// Retried backend sequences one API request may chain (catalog read, then cart insert).
const SEQUENCES_PER_REQUEST: u32 = 2;

/// A single configuration problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate `config`, returning every issue found.
pub fn validate_config(config: &StorefrontConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        issues.push(ConfigIssue::new("listener.bind_address", "must be a socket address"));
    }
    if config.listener.request_timeout_secs == 0 {
        issues.push(ConfigIssue::new("listener.request_timeout_secs", "must be greater than 0"));
    }

    let retries = &config.retries;
    if retries.max_attempts == 0 {
        issues.push(ConfigIssue::new("retries.max_attempts", "must be at least 1"));
    }
    if retries.base_delay_ms == 0 {
        issues.push(ConfigIssue::new("retries.base_delay_ms", "must be greater than 0"));
    }
    if retries.max_delay_ms < retries.base_delay_ms {
        issues.push(ConfigIssue::new("retries.max_delay_ms", "must not be below base_delay_ms"));
    }
    if !(0.0..=1.0).contains(&retries.jitter_ratio) {
        issues.push(ConfigIssue::new("retries.jitter_ratio", "must be within 0.0..=1.0"));
    }

    match config.catalog.source {
        CatalogSourceKind::Remote => {
            if url::Url::parse(&config.backend.base_url).is_err() {
                issues.push(ConfigIssue::new("backend.base_url", "must be an absolute URL"));
            }
            if config.backend.request_timeout_secs == 0 {
                issues.push(ConfigIssue::new("backend.request_timeout_secs", "must be greater than 0"));
            } else if retries.max_attempts > 0 && config.listener.request_timeout_secs > 0 {
                let budget = remote_request_budget(config);
                if Duration::from_secs(config.listener.request_timeout_secs) <= budget {
                    issues.push(ConfigIssue::new(
                        "listener.request_timeout_secs",
                        format!(
                            "must exceed the worst-case backend time of {}s ({} retried calls of {} attempts)",
                            budget.as_secs_f64(),
                            SEQUENCES_PER_REQUEST,
                            retries.max_attempts
                        ),
                    ));
                }
            }
        }
        CatalogSourceKind::File => {
            if config.catalog.path.as_deref().map_or(true, str::is_empty) {
                issues.push(ConfigIssue::new("catalog.path", "required when source is \"file\""));
            }
        }
    }

    let mut names = HashSet::new();
    for (i, profile) in config.quantization.profiles.iter().enumerate() {
        let field = format!("quantization.profiles[{}]", i);
        if profile.name.trim().is_empty() {
            issues.push(ConfigIssue::new(format!("{}.name", field), "must not be empty"));
        } else if !names.insert(profile.name.as_str()) {
            issues.push(ConfigIssue::new(format!("{}.name", field), "duplicate profile name"));
        }
        if !(profile.fine_step > 0.0) || !(profile.coarse_step > 0.0) {
            issues.push(ConfigIssue::new(field.clone(), "steps must be greater than 0"));
        }
        if !profile.threshold.is_finite() {
            issues.push(ConfigIssue::new(format!("{}.threshold", field), "must be finite"));
        }
    }

    if config.pricing.currency.trim().is_empty() {
        issues.push(ConfigIssue::new("pricing.currency", "must not be empty"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        issues.push(ConfigIssue::new("observability.metrics_address", "must be a socket address"));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Longest time a request can spend on the backend: every attempt of every
/// chained sequence timing out, plus the backoff between attempts with full jitter.
pub fn remote_request_budget(config: &StorefrontConfig) -> Duration {
    let policy = RetryPolicy::from(&config.retries);
    let attempts = Duration::from_secs(config.backend.request_timeout_secs) * policy.max_attempts;
    let waits = policy
        .worst_case_wait()
        .mul_f64(1.0 + policy.jitter_ratio.clamp(0.0, 1.0));
    (attempts + waits) * SEQUENCES_PER_REQUEST
}
