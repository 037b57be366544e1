use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::escalation::RoleEscalationTable;
use crate::hierarchy::ReportDepth;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("failed to read role escalation table {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse role escalation table {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Tunables for scope resolution and decision evaluation.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthzConfig {
    pub report_depth: ReportDepth,
    /// Upper bound on a whole `check_access` call, lookups included.
    #[serde(with = "millis")]
    pub lookup_timeout: Option<Duration>,
    pub role_escalation: RoleEscalationTable,
}

impl AuthzConfig {
    /// Reads `DIRECT_REPORTS_TRANSITIVE`, `ACCESS_CHECK_TIMEOUT_MS` and
    /// `ROLE_ESCALATION_FILE`. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("DIRECT_REPORTS_TRANSITIVE") {
            config.report_depth = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => ReportDepth::Transitive,
                "0" | "false" | "no" | "" => ReportDepth::Direct,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "DIRECT_REPORTS_TRANSITIVE",
                        value: raw,
                    });
                }
            };
        }

        if let Ok(raw) = std::env::var("ACCESS_CHECK_TIMEOUT_MS") {
            let millis: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "ACCESS_CHECK_TIMEOUT_MS",
                value: raw.clone(),
            })?;
            config.lookup_timeout = (millis > 0).then(|| Duration::from_millis(millis));
        }

        if let Ok(path) = std::env::var("ROLE_ESCALATION_FILE") {
            config.role_escalation = load_escalation_table(Path::new(path.trim()))?;
        }

        Ok(config)
    }

    pub fn with_report_depth(mut self, depth: ReportDepth) -> Self {
        self.report_depth = depth;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = Some(timeout);
        self
    }

    pub fn with_role_escalation(mut self, table: RoleEscalationTable) -> Self {
        self.role_escalation = table;
        self
    }
}

pub fn load_escalation_table(path: &Path) -> Result<RoleEscalationTable, ConfigError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: display.clone(),
        source,
    })?;
    RoleEscalationTable::from_json(&raw).map_err(|source| ConfigError::Parse {
        path: display,
        source,
    })
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<u64>::deserialize(deserializer)?;
        Ok(value.filter(|ms| *ms > 0).map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_partial_config() {
        let config: AuthzConfig = serde_json::from_str(
            r#"{ "report_depth": "transitive", "lookup_timeout": 250 }"#,
        )
        .unwrap();
        assert_eq!(config.report_depth, ReportDepth::Transitive);
        assert_eq!(config.lookup_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.role_escalation, RoleEscalationTable::default());
    }

    #[test]
    fn missing_escalation_file_is_reported() {
        let err = load_escalation_table(Path::new("/nonexistent/escalation.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
