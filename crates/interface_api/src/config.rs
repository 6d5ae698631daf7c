//! API configuration
//!
//! Loaded from an optional `config/ledger.toml`, then environment variables
//! prefixed with `LEDGER_` where `__` separates nested keys:
//!
//! ```text
//! LEDGER_PORT=8080
//! LEDGER_DATABASE__URL=postgres://ledger@db/ledger
//! LEDGER_ACCOUNTS__BANK=1-1100
//! ```
//!
//! A plain `DATABASE_URL` overrides `database.url` when set.

use serde::Deserialize;

use core_kernel::Timezone;
use domain_ledger::AccountCodes;
use domain_payroll::PayrollConfig;
use infra_db::DatabaseConfig;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Fallback filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Timezone that business dates are taken in
    pub timezone: Timezone,
    pub database: DatabaseConfig,
    /// Account codes resolved into the payment-method mapping at startup
    pub accounts: AccountCodes,
    pub payroll: PayrollConfig,
    /// Create the standard chart of accounts when codes are missing
    pub provision_chart: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            timezone: Timezone::default(),
            database: DatabaseConfig::default(),
            accounts: AccountCodes::default(),
            payroll: PayrollConfig::default(),
            provision_chart: true,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `config/ledger.toml` and the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::builder(config::File::with_name("config/ledger").required(false))?
            .build()?
            .try_deserialize()
    }

    fn builder<S>(file: S) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("LEDGER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};
    use domain_ledger::ShopChartOfAccounts;

    #[test]
    fn test_defaults_use_standard_chart() {
        let config = ApiConfig::default();

        assert_eq!(config.accounts.cash, ShopChartOfAccounts::CASH);
        assert_eq!(config.accounts.bank, ShopChartOfAccounts::BANK);
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert!(config.provision_chart);
    }

    #[test]
    fn test_file_overrides_nested_sections() {
        let toml = r#"
            port = 9090

            [accounts]
            bank = "1-1200"
            payroll = "1-1100"

            [database]
            url = "postgres://db/ledger"
            max_connections = 4
        "#;

        let config: ApiConfig = config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.accounts.bank, "1-1200");
        assert_eq!(config.accounts.payroll, "1-1100");
        assert_eq!(config.accounts.cash, ShopChartOfAccounts::CASH);
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.timezone, Timezone::default());
    }
}
