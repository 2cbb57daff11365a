//! Configuration management

use lambdawrap::{ClientConfig, InvocationOptions, InvocationType, LogType, StaticCredentials};
use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub client: ClientSection,

    #[serde(default)]
    pub invocation: InvocationSection,
}

/// Default invocation options; snake_case keys like the rest of the file
#[derive(Debug, Deserialize, Default, Clone)]
pub struct InvocationSection {
    pub handler_name: Option<String>,

    pub invocation_type: Option<String>,

    pub log_type: Option<String>,
}

impl InvocationSection {
    pub fn into_options(self) -> anyhow::Result<InvocationOptions> {
        let mut options = InvocationOptions::default();
        if let Some(name) = self.handler_name {
            options.handler_name = name;
        }
        if let Some(s) = self.invocation_type {
            options.invocation_type = InvocationType::from_str(&s)
                .ok_or_else(|| anyhow::anyhow!("Unknown invocation type '{}'", s))?;
        }
        if let Some(s) = self.log_type {
            options.log_type =
                LogType::from_str(&s).ok_or_else(|| anyhow::anyhow!("Unknown log type '{}'", s))?;
        }
        Ok(options)
    }
}

/// Settings for the remote Lambda client
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ClientSection {
    pub region: Option<String>,

    pub endpoint_url: Option<String>,

    pub access_key_id: Option<String>,

    pub secret_access_key: Option<String>,
}

impl ClientSection {
    /// Static credentials are used only when both halves are set
    pub fn into_client_config(self) -> ClientConfig {
        let credentials = match (self.access_key_id, self.secret_access_key) {
            (Some(key), Some(secret)) => Some(StaticCredentials::new(key, secret)),
            _ => None,
        };

        ClientConfig {
            region: self.region,
            endpoint_url: self.endpoint_url,
            credentials,
        }
    }
}

impl Config {
    /// Load configuration from `lambdawrap.toml` and `LAMBDAWRAP_*` variables,
    /// e.g. `LAMBDAWRAP_CLIENT__REGION`
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("lambdawrap").required(false))
            .add_source(
                config::Environment::with_prefix("LAMBDAWRAP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize::<Config>()?)
    }
}
