use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

// Token authority configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct EotaConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub mdq_url: String,
    pub mdq_timeout: Duration,
    pub audience: String,
    pub token_ttl: Duration,
    pub keystore_path: PathBuf,
    // Dangerous: accepts the `test` proof method without verification.
    pub insecure_test_mode: bool,
}

#[derive(Debug, Deserialize)]
struct EotaConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    mdq_url: Option<String>,
    mdq_timeout_secs: Option<u64>,
    audience: Option<String>,
    token_ttl_secs: Option<u64>,
    keystore_path: Option<PathBuf>,
    insecure_test_mode: Option<bool>,
}

impl EotaConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("EOTA_BIND")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .with_context(|| "parse EOTA_BIND")?;
        let metrics_bind = std::env::var("EOTA_METRICS_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .with_context(|| "parse EOTA_METRICS_BIND")?;
        let mdq_url = std::env::var("EOTA_MDQ_URL").with_context(|| "EOTA_MDQ_URL is required")?;
        let mdq_timeout = Duration::from_secs(
            std::env::var("EOTA_MDQ_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .with_context(|| "parse EOTA_MDQ_TIMEOUT_SECS")?,
        );
        let audience =
            std::env::var("EOTA_AUDIENCE").with_context(|| "EOTA_AUDIENCE is required")?;
        // Ten days, matching the federation's default token lifetime.
        let token_ttl = Duration::from_secs(
            std::env::var("EOTA_TOKEN_TTL_SECS")
                .unwrap_or_else(|_| "864000".to_string())
                .parse()
                .with_context(|| "parse EOTA_TOKEN_TTL_SECS")?,
        );
        let keystore_path =
            PathBuf::from(std::env::var("EOTA_KEYSTORE").unwrap_or_else(|_| {
                "keystore.jwks".to_string()
            }));
        let insecure_test_mode = std::env::var("EOTA_INSECURE_TEST_MODE")
            .map(|value| value == "true")
            .unwrap_or(false);
        Ok(Self {
            bind_addr,
            metrics_bind,
            mdq_url,
            mdq_timeout,
            audience,
            token_ttl,
            keystore_path,
            insecure_test_mode,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("EOTA_CONFIG") {
            let contents =
                fs::read_to_string(&path).with_context(|| format!("read EOTA_CONFIG: {path}"))?;
            let override_cfg: EotaConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse eota config yaml")?;
            if let Some(value) = override_cfg.bind_addr {
                config.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
            }
            if let Some(value) = override_cfg.metrics_bind {
                config.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
            }
            if let Some(value) = override_cfg.mdq_url {
                config.mdq_url = value;
            }
            if let Some(value) = override_cfg.mdq_timeout_secs {
                config.mdq_timeout = Duration::from_secs(value);
            }
            if let Some(value) = override_cfg.audience {
                config.audience = value;
            }
            if let Some(value) = override_cfg.token_ttl_secs {
                config.token_ttl = Duration::from_secs(value);
            }
            if let Some(value) = override_cfg.keystore_path {
                config.keystore_path = value;
            }
            if let Some(value) = override_cfg.insecure_test_mode {
                config.insecure_test_mode = value;
            }
        }
        Ok(config)
    }
}
