use billing_scheduler_domain::TenantScope;
use rust_decimal::Decimal;
use std::{str::FromStr, time::Duration};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    /// Tenants the periodic jobs run for. Read from `BILLING_TENANTS` as a
    /// comma separated list of `<tenant_id>:<schema>` entries.
    pub tenants: Vec<TenantScope>,
    /// Base url of the billing back office api which provides document
    /// creation, templates, email sending, pdf rendering and directories.
    pub billing_api_url: Option<String>,
    pub billing_api_key: String,
    /// Whether generated documents and reminders are emailed at all
    pub notifications_enabled: bool,
    /// Whether documents are attached to emails as pdf
    pub attachments_enabled: bool,
    pub generation_job_interval: Duration,
    pub reminder_job_interval: Duration,
    /// Maximum duration of a single call to an external collaborator.
    /// A call taking longer fails the item it belongs to.
    pub collaborator_timeout: Duration,
    /// Yearly interest rate in percent used for tenants without their own rate
    pub default_interest_rate: Decimal,
}

impl Config {
    pub fn new() -> Self {
        let tenants = match std::env::var("BILLING_TENANTS") {
            Ok(entries) => parse_tenants(&entries),
            Err(_) => {
                info!("Did not find BILLING_TENANTS environment variable. No tenants will be processed by the job schedulers.");
                Vec::new()
            }
        };
        let billing_api_url = std::env::var("BILLING_API_URL")
            .ok()
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        let billing_api_key = std::env::var("BILLING_API_KEY").unwrap_or_default();

        Self {
            tenants,
            billing_api_url,
            billing_api_key,
            notifications_enabled: env_or("NOTIFICATIONS_ENABLED", true),
            attachments_enabled: env_or("ATTACHMENTS_ENABLED", true),
            generation_job_interval: Duration::from_secs(env_or(
                "GENERATION_JOB_INTERVAL_SECS",
                60 * 60,
            )),
            reminder_job_interval: Duration::from_secs(env_or("REMINDER_JOB_INTERVAL_SECS", 60 * 60)),
            collaborator_timeout: Duration::from_secs(env_or("COLLABORATOR_TIMEOUT_SECS", 30)),
            default_interest_rate: env_or("DEFAULT_INTEREST_RATE", Decimal::from(8)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn env_or<T: FromStr + std::fmt::Display>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(value) => match value.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    "The given {}: {} is not valid, falling back to the default: {}.",
                    key, value, default
                );
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_tenants(entries: &str) -> Vec<TenantScope> {
    entries
        .split(',')
        .filter(|entry| !entry.trim().is_empty())
        .filter_map(|entry| match entry.parse::<TenantScope>() {
            Ok(tenant) => Some(tenant),
            Err(e) => {
                warn!("Ignoring tenant entry: {}. Error: {}", entry, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use billing_scheduler_domain::ID;

    #[test]
    fn parses_tenant_list() {
        let first = ID::new();
        let second = ID::new();
        let tenants = parse_tenants(&format!("{}:acme, {}:globex,,broken", first, second));
        assert_eq!(tenants.len(), 2);
        assert_eq!(tenants[0].tenant_id, first);
        assert_eq!(tenants[1].schema(), "globex");
    }
}
