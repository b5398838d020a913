use crate::domain::account::{AccountAmsStatus, Iban};
use crate::domain::config::TenantConfigResolver;
use crate::domain::job::{AccountLookupRequest, Variables, parse_request};
use crate::domain::ports::LedgerGatewayRef;
use crate::error::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Resolves customer IBANs to the conversion and disposal accounts that later
/// stages book on.
pub struct AccountLookup {
    resolver: Arc<TenantConfigResolver>,
    ledger: LedgerGatewayRef,
}

impl AccountLookup {
    pub fn new(resolver: Arc<TenantConfigResolver>, ledger: LedgerGatewayRef) -> Self {
        Self { resolver, ledger }
    }

    /// Returns `variables` augmented with `accountAmsStatus` and, for a known
    /// IBAN, the account ids and flags.
    ///
    /// An unknown IBAN is not an error: the customer is reported as not ready
    /// to receive money and no account ids are added.
    pub async fn execute(&self, variables: &Variables) -> Result<Variables> {
        let request: AccountLookupRequest = parse_request(variables)?;
        let config = self.resolver.resolve(&request.tenant_identifier)?;
        let iban = Iban::parse(&request.iban)?;

        let record = self.ledger.lookup_account(config.tenant(), &iban).await?;
        let status = AccountAmsStatus::of(record.as_ref());
        info!(%iban, status = status.as_str(), found = record.is_some(), "Looked up account");

        let mut output = variables.clone();
        output.insert("accountAmsStatus".into(), Value::from(status.as_str()));
        if let Some(record) = record {
            output.insert(
                "conversionAccountAmsId".into(),
                Value::from(record.conversion_account_id),
            );
            output.insert(
                "disposalAccountAmsId".into(),
                Value::from(record.disposal_account_id),
            );
            output.insert("accountAmsFlags".into(), Value::from(record.flags));
        }
        Ok(output)
    }
}
