use super::account::{AccountRecord, Iban};
use super::batch::Batch;
use super::message::{CancellationReference, CreditDebit, MessageKind, StatementEntry};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Outcome of a fully applied batch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchReceipt {
    /// Resource id created by each item, in submission order.
    pub resource_ids: Vec<i64>,
}

/// Accounting backend executing batches atomically.
///
/// Implementations either apply every item or none; a returned error means
/// nothing was posted.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    async fn submit_batch(&self, tenant: &str, batch: &Batch) -> Result<BatchReceipt>;

    /// Finds the accounts registered for a customer IBAN, or `None` if it is unknown.
    async fn lookup_account(&self, tenant: &str, iban: &Iban) -> Result<Option<AccountRecord>>;
}

/// Converts decoded payment messages into statement entries.
pub trait MessageAdapter: Send + Sync {
    /// Builds the statement entry for `raw`, optionally forcing its credit/debit indicator.
    fn statement_entry(
        &self,
        kind: MessageKind,
        raw: &str,
        direction: Option<CreditDebit>,
    ) -> Result<StatementEntry>;

    /// Extracts the original-payment reference from a cancellation request.
    fn cancellation_reference(&self, raw: &str) -> Result<CancellationReference>;
}

pub type LedgerGatewayRef = Arc<dyn LedgerGateway>;
pub type MessageAdapterRef = Arc<dyn MessageAdapter>;
