use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::TimeDelta;
use lifecycle::{ExpiryPolicy, Provider};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub image_builder_url: String,
    pub bind_addr: String,

    pub provisioning_enabled: bool,
    pub wizard_url: Option<String>,
    pub permissions: Vec<Provider>,

    pub status_poll_every: Duration,
    pub expiry_policy: ExpiryPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let image_builder_url = get("IMAGE_BUILDER_URL")?;
        let bind_addr =
            std::env::var("CATALOG_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let provisioning_enabled = std::env::var("PROVISIONING_ENABLED")
            .ok()
            .map(|v| truthy(&v))
            .unwrap_or(false);
        let wizard_url = std::env::var("PROVISIONING_WIZARD_URL").ok().filter(|v| !v.is_empty());
        let permissions = parse_providers(
            &std::env::var("PROVISIONING_PERMISSIONS").unwrap_or_default(),
        )?;

        let poll_secs: u64 = number("STATUS_POLL_SECS", 8)?;
        let s3_hours: i64 = number("S3_LINK_LIFETIME_HOURS", 6)?;
        let oci_days: i64 = number("OCI_LINK_LIFETIME_DAYS", 7)?;
        let download_lifetime = lifetime("S3_LINK_LIFETIME_HOURS", s3_hours, TimeDelta::try_hours)?;
        let object_storage_lifetime =
            lifetime("OCI_LINK_LIFETIME_DAYS", oci_days, TimeDelta::try_days)?;

        // fail fast, fail loud
        if !image_builder_url.starts_with("http://") && !image_builder_url.starts_with("https://") {
            bail!("IMAGE_BUILDER_URL must start with http:// or https://");
        }
        if let Some(url) = &wizard_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                bail!("PROVISIONING_WIZARD_URL must start with http:// or https://");
            }
        }
        if poll_secs == 0 {
            bail!("STATUS_POLL_SECS must be at least 1");
        }

        Ok(Self {
            image_builder_url: image_builder_url.trim_end_matches('/').to_string(),
            bind_addr,
            provisioning_enabled,
            wizard_url,
            permissions,
            status_poll_every: Duration::from_secs(poll_secs),
            expiry_policy: ExpiryPolicy {
                download_lifetime: Some(download_lifetime),
                object_storage_lifetime: Some(object_storage_lifetime),
            },
        })
    }
}

fn get(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Missing required env var: {key}"))
}

fn number<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} must be a number: {e}")),
        Err(_) => Ok(default),
    }
}

fn lifetime(key: &str, n: i64, to_delta: fn(i64) -> Option<TimeDelta>) -> Result<TimeDelta> {
    if n <= 0 {
        bail!("{key} must be positive");
    }
    to_delta(n).with_context(|| format!("{key} is out of range"))
}

fn truthy(v: &str) -> bool {
    matches!(v, "1" | "true" | "TRUE" | "yes" | "YES")
}

fn parse_providers(raw: &str) -> Result<Vec<Provider>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Provider>()
                .map_err(|e| anyhow::anyhow!("PROVISIONING_PERMISSIONS: {e}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn providers_list() {
        assert_eq!(parse_providers("aws, gcp").unwrap(), vec![Provider::Aws, Provider::Gcp]);
        assert!(parse_providers("").unwrap().is_empty());
        assert!(parse_providers("aws,ibm").is_err());
    }

    #[test]
    fn lifetimes_must_be_positive_and_representable() {
        assert_eq!(
            lifetime("S3_LINK_LIFETIME_HOURS", 6, TimeDelta::try_hours).unwrap(),
            TimeDelta::hours(6)
        );
        assert!(lifetime("S3_LINK_LIFETIME_HOURS", 0, TimeDelta::try_hours).is_err());
        assert!(lifetime("S3_LINK_LIFETIME_HOURS", -3, TimeDelta::try_hours).is_err());
        assert!(lifetime("OCI_LINK_LIFETIME_DAYS", i64::MAX, TimeDelta::try_days).is_err());
    }

    #[test]
    fn truthy_values() {
        assert!(truthy("yes"));
        assert!(!truthy("no"));
    }
}
