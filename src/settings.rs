//! Application configuration loading and validation.
//!
//! Settings are read once at startup from a TOML file. The tenant tables
//! become the immutable [`TenantConfigResolver`] shared by every job.
//!
//! ```toml
//! [ledger]
//! api_base_path = "/savingsaccounts/"
//! locale = "en"
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [tenants.T1.payment_type_ids]
//! "SCT.revertInAms.ConversionAccount.WithdrawTransactionAmount" = 21
//! ```

use crate::domain::account::{AccountRecord, Iban};
use crate::domain::config::TenantConfigResolver;
use crate::error::{ConnectorError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt};

/// Where and how booking requests are addressed on the ledger.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    /// Savings-account API path; a leading slash is ignored.
    pub api_base_path: String,
    /// Datatable receiving the statement detail of every posting.
    pub statement_details_table: String,
    pub locale: String,
    /// Date pattern sent alongside every transaction date.
    pub date_format: String,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            api_base_path: "/savingsaccounts/".into(),
            statement_details_table: "dt_savings_transaction_details".into(),
            locale: "en".into(),
            date_format: "yyyyMMdd".into(),
        }
    }
}

impl LedgerSettings {
    /// The API base path as used inside batch item URLs.
    pub fn relative_base_path(&self) -> &str {
        self.api_base_path.trim_start_matches('/')
    }

    /// Translates `date_format` (`yyyyMMdd` style) into a chrono format string.
    ///
    /// Only the `yyyy`, `MM` and `dd` fields are understood; any other letter run
    /// is rejected rather than passed through as literal text.
    pub fn chrono_date_format(&self) -> Result<String> {
        let mut format = String::new();
        let mut chars = self.date_format.chars().peekable();
        while let Some(c) = chars.next() {
            if !c.is_ascii_alphabetic() {
                match c {
                    '%' => format.push_str("%%"),
                    '\'' => {
                        return Err(ConnectorError::SettingsError(
                            "quoted literals are not supported in ledger.date_format".into(),
                        ));
                    }
                    _ => format.push(c),
                }
                continue;
            }
            let mut run = c.to_string();
            while chars.next_if_eq(&c).is_some() {
                run.push(c);
            }
            match run.as_str() {
                "yyyy" => format.push_str("%Y"),
                "MM" => format.push_str("%m"),
                "dd" => format.push_str("%d"),
                other => {
                    return Err(ConnectorError::SettingsError(format!(
                        "unsupported token '{}' in ledger.date_format",
                        other
                    )));
                }
            }
        }
        Ok(format)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

impl LoggingConfig {
    /// Initialize the tracing subscriber. `RUST_LOG` overrides the configured level.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                fmt()
                    .json()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
            _ => {
                fmt()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }
    }
}

/// Operation mappings of one tenant.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TenantSettings {
    pub payment_type_ids: HashMap<String, i64>,
    #[serde(default)]
    pub payment_type_codes: Option<HashMap<String, String>>,
    #[serde(default)]
    pub technical_accounts: Option<HashMap<String, i64>>,
}

/// Opening balance of an account on the in-memory ledger.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSeed {
    pub tenant: String,
    pub id: i64,
    #[serde(default)]
    pub balance: Decimal,
}

/// Accounts held by a customer IBAN, answered by account lookups.
#[derive(Debug, Clone, Deserialize)]
pub struct IbanAccountSeed {
    pub tenant: String,
    pub iban: String,
    pub conversion_account_id: i64,
    pub disposal_account_id: i64,
    #[serde(default)]
    pub flags: Vec<String>,
}

impl IbanAccountSeed {
    pub fn record(&self) -> AccountRecord {
        AccountRecord {
            conversion_account_id: self.conversion_account_id,
            disposal_account_id: self.disposal_account_id,
            flags: self.flags.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub ledger: LedgerSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub tenants: HashMap<String, TenantSettings>,
    #[serde(default)]
    pub accounts: Vec<AccountSeed>,
    #[serde(default)]
    pub iban_accounts: Vec<IbanAccountSeed>,
}

impl Settings {
    /// Loads and validates settings from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ConnectorError::SettingsError(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let settings: Settings =
            toml::from_str(content).map_err(|e| ConnectorError::SettingsError(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.tenants.is_empty() {
            return Err(ConnectorError::SettingsError(
                "at least one tenant must be configured".into(),
            ));
        }
        if self.ledger.relative_base_path().is_empty() {
            return Err(ConnectorError::SettingsError(
                "ledger.api_base_path must not be empty".into(),
            ));
        }
        self.ledger.chrono_date_format()?;
        for seed in &self.iban_accounts {
            Iban::parse(&seed.iban)
                .map_err(|e| ConnectorError::SettingsError(e.to_string()))?;
        }
        Ok(())
    }

    /// Builds the read-only tenant resolver from the tenant tables.
    pub fn resolver(&self) -> TenantConfigResolver {
        self.tenants
            .iter()
            .fold(TenantConfigResolver::new(), |resolver, (tenant, config)| {
                let mut resolver =
                    resolver.with_payment_type_ids(tenant.clone(), config.payment_type_ids.clone());
                if let Some(codes) = &config.payment_type_codes {
                    resolver = resolver.with_payment_type_codes(tenant.clone(), codes.clone());
                }
                if let Some(accounts) = &config.technical_accounts {
                    resolver = resolver.with_technical_accounts(tenant.clone(), accounts.clone());
                }
                resolver
            })
    }
}
