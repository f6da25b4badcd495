use crate::delivery::DEFAULT_FCM_ENDPOINT;
use anyhow::{Context, Result, bail};
use pushrelay_core::{Diagnostics, ResolverConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeliveryMode {
    Fcm,
    DryRun,
}

#[derive(Debug, Clone)]
pub(crate) struct DeliveryConfig {
    pub(crate) mode: DeliveryMode,
    pub(crate) project_id: Option<String>,
    pub(crate) access_token: Option<String>,
    pub(crate) credentials_path: Option<PathBuf>,
    pub(crate) endpoint: String,
    pub(crate) validate_only: bool,
    pub(crate) request_timeout: Duration,
}

pub(crate) fn server_addr_from_env(addr_override: Option<&str>) -> Result<SocketAddr> {
    server_addr_from(addr_override, env_lookup)
}

pub(crate) fn resolver_config_from_env(verbose: bool) -> ResolverConfig {
    resolver_config_from(verbose, env_lookup)
}

pub(crate) fn delivery_config_from_env() -> Result<DeliveryConfig> {
    delivery_config_from(env_lookup)
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn server_addr_from(
    addr_override: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SocketAddr> {
    let addr_text = match addr_override {
        Some(addr) => addr.to_string(),
        None => lookup("PUSHRELAY_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string()),
    };
    addr_text
        .parse()
        .with_context(|| format!("invalid PUSHRELAY_ADDR: {addr_text}"))
}

fn resolver_config_from(verbose: bool, lookup: impl Fn(&str) -> Option<String>) -> ResolverConfig {
    let mut config = ResolverConfig::default();
    if let Some(sound) = lookup("PUSHRELAY_IOS_CUSTOM_SOUND") {
        config = config.with_ios_custom_sound(&sound);
    }
    if verbose || lookup("PUSHRELAY_VERBOSE").is_some_and(|v| is_truthy(&v)) {
        config = config.with_diagnostics(Diagnostics::Verbose);
    }
    config
}

fn delivery_config_from(lookup: impl Fn(&str) -> Option<String>) -> Result<DeliveryConfig> {
    let mode = match lookup("PUSHRELAY_DELIVERY").as_deref() {
        None | Some("fcm") => DeliveryMode::Fcm,
        Some("dry-run") => DeliveryMode::DryRun,
        Some(other) => bail!("invalid PUSHRELAY_DELIVERY: {other} (expected fcm or dry-run)"),
    };

    let request_timeout = match lookup("PUSHRELAY_REQUEST_TIMEOUT_SECS") {
        Some(text) => {
            let secs: u64 = text
                .parse()
                .with_context(|| format!("invalid PUSHRELAY_REQUEST_TIMEOUT_SECS: {text}"))?;
            // 0 秒会让每个请求立即超时
            if secs == 0 {
                bail!("PUSHRELAY_REQUEST_TIMEOUT_SECS must be greater than 0");
            }
            Duration::from_secs(secs)
        }
        None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
    };

    Ok(DeliveryConfig {
        mode,
        project_id: lookup("PUSHRELAY_FCM_PROJECT_ID"),
        access_token: lookup("PUSHRELAY_FCM_ACCESS_TOKEN"),
        credentials_path: lookup("PUSHRELAY_FCM_CREDENTIALS").map(PathBuf::from),
        endpoint: lookup("PUSHRELAY_FCM_ENDPOINT")
            .unwrap_or_else(|| DEFAULT_FCM_ENDPOINT.to_string()),
        validate_only: lookup("PUSHRELAY_FCM_VALIDATE_ONLY").is_some_and(|v| is_truthy(&v)),
        request_timeout,
    })
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_server_addr_default() {
        let addr = server_addr_from(None, lookup_from(&[])).unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn test_server_addr_override_wins() {
        let lookup = lookup_from(&[("PUSHRELAY_ADDR", "127.0.0.1:8080")]);
        let addr = server_addr_from(Some("127.0.0.1:9090"), lookup).unwrap();
        assert_eq!(addr.port(), 9090);

        let lookup = lookup_from(&[("PUSHRELAY_ADDR", "127.0.0.1:8080")]);
        let addr = server_addr_from(None, lookup).unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_server_addr_invalid() {
        let err = server_addr_from(Some("not-an-addr"), lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("invalid PUSHRELAY_ADDR"));
    }

    #[test]
    fn test_resolver_config() {
        let config = resolver_config_from(false, lookup_from(&[]));
        assert_eq!(config, ResolverConfig::default());

        let lookup = lookup_from(&[
            ("PUSHRELAY_IOS_CUSTOM_SOUND", "shockding"),
            ("PUSHRELAY_VERBOSE", "true"),
        ]);
        let config = resolver_config_from(false, lookup);
        assert_eq!(config.ios_custom_sound, "shockding");
        assert_eq!(config.diagnostics, Diagnostics::Verbose);

        let config = resolver_config_from(true, lookup_from(&[]));
        assert_eq!(config.diagnostics, Diagnostics::Verbose);
    }

    #[test]
    fn test_delivery_config_defaults() {
        let config = delivery_config_from(lookup_from(&[])).unwrap();

        assert_eq!(config.mode, DeliveryMode::Fcm);
        assert_eq!(config.endpoint, DEFAULT_FCM_ENDPOINT);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(!config.validate_only);
        assert!(config.project_id.is_none());
    }

    #[test]
    fn test_delivery_config_from_values() {
        let lookup = lookup_from(&[
            ("PUSHRELAY_DELIVERY", "dry-run"),
            ("PUSHRELAY_FCM_PROJECT_ID", "demo"),
            ("PUSHRELAY_FCM_CREDENTIALS", "/etc/pushrelay/sa.json"),
            ("PUSHRELAY_FCM_VALIDATE_ONLY", "yes"),
            ("PUSHRELAY_REQUEST_TIMEOUT_SECS", "5"),
        ]);
        let config = delivery_config_from(lookup).unwrap();

        assert_eq!(config.mode, DeliveryMode::DryRun);
        assert_eq!(config.project_id.as_deref(), Some("demo"));
        assert_eq!(
            config.credentials_path,
            Some(PathBuf::from("/etc/pushrelay/sa.json"))
        );
        assert!(config.validate_only);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_delivery_config_rejects_unknown_mode() {
        let lookup = lookup_from(&[("PUSHRELAY_DELIVERY", "carrier-pigeon")]);
        assert!(delivery_config_from(lookup).is_err());
    }

    #[test]
    fn test_delivery_config_rejects_zero_timeout() {
        let lookup = lookup_from(&[("PUSHRELAY_REQUEST_TIMEOUT_SECS", "0")]);
        let err = delivery_config_from(lookup).unwrap_err();
        assert!(err.to_string().contains("greater than 0"));

        let lookup = lookup_from(&[("PUSHRELAY_REQUEST_TIMEOUT_SECS", "-1")]);
        assert!(delivery_config_from(lookup).is_err());
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
    }
}
