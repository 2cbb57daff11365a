//! Shared client configuration
//!
//! Remote invocations read their region, endpoint and credentials from a
//! [`SharedClientConfig`]. A descriptor that names a region writes it into the
//! shared configuration before invoking, so the region sticks for later calls
//! through the same handle. Concurrent invocations naming different regions
//! race: the last writer before each call wins.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;

static GLOBAL: Lazy<SharedClientConfig> = Lazy::new(SharedClientConfig::default);

/// Static access key pair, used instead of the default credential chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl StaticCredentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }
}

/// Client settings used to build the remote transport for a call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    pub region: Option<String>,
    /// Override for the service endpoint (e.g. a local emulator)
    pub endpoint_url: Option<String>,
    pub credentials: Option<StaticCredentials>,
}

/// Thread-safe handle to a client configuration
#[derive(Debug, Clone, Default)]
pub struct SharedClientConfig {
    inner: Arc<RwLock<ClientConfig>>,
}

impl SharedClientConfig {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// The process-wide configuration
    pub fn global() -> Self {
        GLOBAL.clone()
    }

    pub fn update_region(&self, region: impl Into<String>) {
        self.inner.write().region = Some(region.into());
    }

    pub fn update(&self, f: impl FnOnce(&mut ClientConfig)) {
        f(&mut self.inner.write());
    }

    pub fn region(&self) -> Option<String> {
        self.inner.read().region.clone()
    }

    /// Copy of the current configuration
    pub fn snapshot(&self) -> ClientConfig {
        self.inner.read().clone()
    }

    /// Whether both handles point at the same configuration
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_region_is_shared() {
        let config = SharedClientConfig::default();
        let other = config.clone();

        config.update_region("eu-west-1");
        assert_eq!(other.region().as_deref(), Some("eu-west-1"));

        other.update_region("us-west-2");
        assert_eq!(config.snapshot().region.as_deref(), Some("us-west-2"));
    }

    #[test]
    fn test_update_keeps_other_fields() {
        let config = SharedClientConfig::new(ClientConfig {
            endpoint_url: Some("http://localhost:4566".to_string()),
            ..Default::default()
        });

        config.update(|c| c.credentials = Some(StaticCredentials::new("test", "test")));
        config.update_region("us-east-1");

        let snapshot = config.snapshot();
        assert_eq!(snapshot.endpoint_url.as_deref(), Some("http://localhost:4566"));
        assert_eq!(snapshot.region.as_deref(), Some("us-east-1"));
        assert!(snapshot.credentials.is_some());
    }

    #[test]
    fn test_global_is_one_instance() {
        assert!(SharedClientConfig::global().ptr_eq(&SharedClientConfig::global()));
        assert!(!SharedClientConfig::global().ptr_eq(&SharedClientConfig::default()));
    }
}
