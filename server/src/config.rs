use std::time::Duration;

use anyhow::{Context, Result};
use platform_authz::AuthzConfig;
use platform_db::DatabaseSettings;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseSettings,
    pub authz: AuthzConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let database = DatabaseSettings::from_env();
        let authz = AuthzConfig::from_env().context("invalid access engine configuration")?;
        Ok(Self { database, authz })
    }

    /// Command-line timeout overrides `ACCESS_CHECK_TIMEOUT_MS`.
    pub fn with_timeout_override(mut self, millis: Option<u64>) -> Self {
        if let Some(millis) = millis.filter(|m| *m > 0) {
            self.authz = self.authz.with_lookup_timeout(Duration::from_millis(millis));
        }
        self
    }
}
