//! Ledger configuration with TOML file support.

use accesskey_types::{Address, LedgerParams};
use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// Configuration for an access-key ledger.
///
/// Can be loaded from a TOML file via [`LedgerConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Account allowed to manage tiers, rewards and parameters.
    #[serde(default = "default_admin")]
    pub admin: Address,

    /// Receives resolved debt and liquidation surplus.
    #[serde(default = "default_treasury")]
    pub treasury: Address,

    /// Holds all locked collateral and the reward reserve.
    #[serde(default = "default_custody")]
    pub custody: Address,

    /// The collateral asset; USD-priced tiers must be quoted in it.
    #[serde(default = "default_price_asset")]
    pub price_asset: String,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub params: LedgerParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_admin() -> Address {
    Address::new("admin")
}

fn default_treasury() -> Address {
    Address::new("treasury")
}

fn default_custody() -> Address {
    Address::new("custody")
}

fn default_price_asset() -> String {
    "CMK".to_string()
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl LedgerConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, LedgerError> {
        let content = std::fs::read_to_string(path).map_err(|e| LedgerError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, LedgerError> {
        toml::from_str(s).map_err(|e| LedgerError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("LedgerConfig is always serializable to TOML")
    }

    /// Check accounts and parameters.
    pub fn validate(&self) -> Result<(), LedgerError> {
        for (role, account) in [("admin", &self.admin), ("treasury", &self.treasury), ("custody", &self.custody)] {
            if !account.is_valid() {
                return Err(LedgerError::Config(format!("invalid {role} address {account:?}")));
            }
        }
        if self.custody == self.treasury {
            return Err(LedgerError::Config("custody and treasury must differ".into()));
        }
        self.params.validate()?;
        Ok(())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            admin: default_admin(),
            treasury: default_treasury(),
            custody: default_custody(),
            price_asset: default_price_asset(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            params: LedgerParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = LedgerConfig::default();
        let toml_str = config.to_toml_string();
        let parsed = LedgerConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = LedgerConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.treasury, Address::new("treasury"));
        assert_eq!(config.params.liquidator_reward_bps, 500);
        assert!(config.params.count_pending_rewards_toward_solvency);
        assert_eq!(config.log_format, "human");
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            treasury = "dao"

            [params]
            liquidator_reward_bps = 250
            vault_sweep_share_bps = 5000
        "#;
        let config = LedgerConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.treasury, Address::new("dao"));
        assert_eq!(config.params.liquidator_reward_bps, 250);
        assert_eq!(config.params.vault_sweep_share_bps, 5_000);
        assert_eq!(config.params.seconds_per_month, 2_592_000); // default
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "admin = \"root\"\nlog_level = \"debug\"").unwrap();
        let config = LedgerConfig::from_toml_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.admin, Address::new("root"));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = LedgerConfig::from_toml_file("/nonexistent/accesskey.toml");
        assert!(matches!(result, Err(LedgerError::Config(_))));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = LedgerConfig::default();
        config.params.vault_sweep_share_bps = 10_001;
        assert_eq!(config.validate(), Err(LedgerError::InvalidBasisPoints(10_001)));

        let config = LedgerConfig {
            custody: Address::new("treasury"),
            ..LedgerConfig::default()
        };
        assert!(matches!(config.validate(), Err(LedgerError::Config(_))));
    }
}
