//! Tenant-scoped payment-type and technical-account lookups.
//!
//! All maps are built once at startup and only ever read afterwards, so a
//! resolver is shared between jobs behind an `Arc` without locking.

use crate::error::{ConnectorError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Composite key identifying scheme, lifecycle stage, account role and action,
/// rendered as `<scheme>.<stage>.<accountRole>.<action>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationKey(String);

impl OperationKey {
    pub fn new(scheme: &str, stage: &str, account_role: &str, action: &str) -> Self {
        Self(format!("{}.{}.{}.{}", scheme, stage, account_role, action))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The payment-type mapping of a single tenant.
#[derive(Debug, Clone)]
pub struct TenantConfig {
    tenant: String,
    payment_type_ids: Arc<HashMap<String, i64>>,
    payment_type_codes: Option<Arc<HashMap<String, String>>>,
    technical_accounts: Option<Arc<HashMap<String, i64>>>,
}

impl TenantConfig {
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// Looks up the payment-type id for `key`.
    ///
    /// A booking cannot proceed without it, so an unmapped key is an error.
    pub fn find_payment_type_id(&self, key: &OperationKey) -> Result<i64> {
        self.payment_type_ids
            .get(key.as_str())
            .copied()
            .ok_or_else(|| ConnectorError::OperationNotConfigured {
                tenant: self.tenant.clone(),
                key: key.to_string(),
            })
    }

    /// Looks up the optional payment-type code for `key`.
    pub fn find_payment_type_code(&self, key: &OperationKey) -> Option<&str> {
        self.payment_type_codes
            .as_ref()
            .and_then(|codes| codes.get(key.as_str()))
            .map(String::as_str)
    }

    /// Resolves the technical account booked for a scheme and case, keyed
    /// `<scheme>.<caseIdentifier>`.
    pub fn find_technical_account(&self, scheme: &str, case_identifier: &str) -> Result<i64> {
        let key = format!("{}.{}", scheme, case_identifier);
        self.technical_accounts
            .as_ref()
            .and_then(|accounts| accounts.get(&key))
            .copied()
            .ok_or_else(|| ConnectorError::TechnicalAccountNotConfigured {
                tenant: self.tenant.clone(),
                key,
            })
    }
}

/// Process-wide resolver over the configuration of every tenant.
#[derive(Debug, Default)]
pub struct TenantConfigResolver {
    payment_type_ids: HashMap<String, Arc<HashMap<String, i64>>>,
    payment_type_codes: HashMap<String, Arc<HashMap<String, String>>>,
    technical_accounts: HashMap<String, Arc<HashMap<String, i64>>>,
}

impl TenantConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the payment-type ids of a tenant. Builder-style, used at startup only.
    pub fn with_payment_type_ids(
        mut self,
        tenant: impl Into<String>,
        ids: HashMap<String, i64>,
    ) -> Self {
        self.payment_type_ids.insert(tenant.into(), Arc::new(ids));
        self
    }

    pub fn with_payment_type_codes(
        mut self,
        tenant: impl Into<String>,
        codes: HashMap<String, String>,
    ) -> Self {
        self.payment_type_codes
            .insert(tenant.into(), Arc::new(codes));
        self
    }

    pub fn with_technical_accounts(
        mut self,
        tenant: impl Into<String>,
        accounts: HashMap<String, i64>,
    ) -> Self {
        self.technical_accounts
            .insert(tenant.into(), Arc::new(accounts));
        self
    }

    /// Returns the configuration of `tenant`.
    ///
    /// Fails with `ConfigNotFound` when no payment-type id mapping exists; the
    /// code mapping is optional.
    pub fn resolve(&self, tenant: &str) -> Result<TenantConfig> {
        let payment_type_ids = self
            .payment_type_ids
            .get(tenant)
            .cloned()
            .ok_or_else(|| ConnectorError::ConfigNotFound(tenant.to_string()))?;

        Ok(TenantConfig {
            tenant: tenant.to_string(),
            payment_type_ids,
            payment_type_codes: self.payment_type_codes.get(tenant).cloned(),
            technical_accounts: self.technical_accounts.get(tenant).cloned(),
        })
    }

    pub fn tenants(&self) -> impl Iterator<Item = &str> {
        self.payment_type_ids.keys().map(String::as_str)
    }
}
