use crate::error::{AnalyticsError, Result};
use crate::queries::consolidation::ConsolidationPolicy;
use crate::queries::metrics::UtilizationScope;
use serde::Deserialize;
use std::fs;
use std::path::Path;

const CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub warehouse: WarehouseConfig,
    pub consolidation: ConsolidationConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/shipments.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    /// Total warehouse capacity in cubic centimeters.
    pub capacity_cm3: i64,
    /// Which rows count as occupying warehouse space.
    pub utilization_scope: UtilizationScope,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            capacity_cm3: 60_000_000_000,
            utilization_scope: UtilizationScope::ReceivedOnly,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    pub policy: ConsolidationPolicy,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            policy: ConsolidationPolicy::ArrivalReceived,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8000 }
    }
}

impl Config {
    /// Load `config.toml` from the working directory, falling back to
    /// defaults when the file is absent.
    pub fn load() -> Result<Self> {
        if !Path::new(CONFIG_PATH).exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(CONFIG_PATH).map_err(|e| {
            AnalyticsError::Config(format!("failed to read config file '{CONFIG_PATH}': {e}"))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| AnalyticsError::Config(format!("invalid config: {e}")))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_warehouse_constants() {
        let config = Config::default();
        assert_eq!(config.warehouse.capacity_cm3, 60_000_000_000);
        assert_eq!(
            config.warehouse.utilization_scope,
            UtilizationScope::ReceivedOnly
        );
        assert_eq!(
            config.consolidation.policy,
            ConsolidationPolicy::ArrivalReceived
        );
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn parses_partial_config() {
        let config: Config = toml::from_str(
            r#"
            [warehouse]
            capacity_cm3 = 1000
            utilization_scope = "all_rows"
            "#,
        )
        .unwrap();
        assert_eq!(config.warehouse.capacity_cm3, 1000);
        assert_eq!(config.warehouse.utilization_scope, UtilizationScope::AllRows);
        assert_eq!(config.database.path, "data/shipments.db");
    }
}
