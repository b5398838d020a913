use crate::domain::account::{AccountRecord, Iban};
use crate::domain::batch::{Batch, BatchItem, RESOURCE_ID_PLACEHOLDER};
use crate::domain::ports::{BatchReceipt, LedgerGateway};
use crate::domain::transaction::LedgerAction;
use crate::error::{ConnectorError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A savings-account transaction posted by the in-memory ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct PostedTransaction {
    pub resource_id: i64,
    pub account_id: i64,
    pub action: LedgerAction,
    pub amount: Decimal,
    pub payment_type_id: i64,
}

/// A datatable row attached to a posted resource.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDetail {
    pub table: String,
    pub resource_id: i64,
    pub columns: Value,
}

#[derive(Debug, Default, Clone)]
struct TenantBook {
    balances: HashMap<i64, Decimal>,
    transactions: Vec<PostedTransaction>,
    details: Vec<RecordedDetail>,
    accounts_by_iban: HashMap<String, AccountRecord>,
}

#[derive(Debug)]
struct LedgerState {
    books: HashMap<String, TenantBook>,
    next_resource_id: i64,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            books: HashMap::new(),
            next_resource_id: 1,
        }
    }
}

/// A thread-safe in-memory ledger with all-or-nothing batch semantics.
///
/// Uses `Arc<RwLock<..>>` so clones share the same books. Each batch is applied
/// to a copy of the tenant's book and only swapped in once every item succeeded,
/// so a rejected batch leaves no postings behind.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

enum Operation {
    Transaction {
        account_id: i64,
        action: LedgerAction,
    },
    Detail {
        table: String,
        resource_id: i64,
    },
}

fn parse_operation(relative_url: &str) -> std::result::Result<Operation, String> {
    let (path, query) = relative_url
        .split_once('?')
        .unwrap_or((relative_url, ""));
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        ["datatables", table, resource_id] => {
            let resource_id = resource_id
                .parse()
                .map_err(|_| format!("invalid resource id in {}", relative_url))?;
            Ok(Operation::Detail {
                table: table.to_string(),
                resource_id,
            })
        }
        [.., account_id, "transactions"] => {
            let account_id = account_id
                .parse()
                .map_err(|_| format!("invalid account id in {}", relative_url))?;
            let action = match query {
                "command=withdrawal" => LedgerAction::Withdrawal,
                "command=deposit" => LedgerAction::Deposit,
                other => return Err(format!("unsupported command '{}'", other)),
            };
            Ok(Operation::Transaction { account_id, action })
        }
        _ => Err(format!("unsupported operation {}", relative_url)),
    }
}

fn parse_body(body: &str) -> std::result::Result<Value, String> {
    serde_json::from_str(body).map_err(|e| format!("malformed body: {}", e))
}

impl InMemoryLedger {
    /// Creates a new, empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens (or resets) an account of `tenant` with the given balance.
    pub async fn open_account(&self, tenant: &str, account_id: i64, balance: Decimal) {
        let mut state = self.state.write().await;
        state
            .books
            .entry(tenant.to_string())
            .or_default()
            .balances
            .insert(account_id, balance);
    }

    pub async fn balance(&self, tenant: &str, account_id: i64) -> Option<Decimal> {
        let state = self.state.read().await;
        state
            .books
            .get(tenant)
            .and_then(|book| book.balances.get(&account_id).copied())
    }

    pub async fn transactions(&self, tenant: &str) -> Vec<PostedTransaction> {
        let state = self.state.read().await;
        state
            .books
            .get(tenant)
            .map(|book| book.transactions.clone())
            .unwrap_or_default()
    }

    pub async fn details(&self, tenant: &str) -> Vec<RecordedDetail> {
        let state = self.state.read().await;
        state
            .books
            .get(tenant)
            .map(|book| book.details.clone())
            .unwrap_or_default()
    }

    /// Registers the accounts held by a customer IBAN of `tenant`.
    pub async fn register_iban(&self, tenant: &str, iban: &Iban, record: AccountRecord) {
        let mut state = self.state.write().await;
        state
            .books
            .entry(tenant.to_string())
            .or_default()
            .accounts_by_iban
            .insert(iban.as_str().to_string(), record);
    }

    fn apply_item(
        book: &mut TenantBook,
        item: &BatchItem,
        resource_id: i64,
    ) -> std::result::Result<i64, String> {
        let body = parse_body(&item.body)?;
        match parse_operation(&item.relative_url)? {
            Operation::Transaction { account_id, action } => {
                let amount: Decimal = body
                    .get("transactionAmount")
                    .cloned()
                    .and_then(|v| serde_json::from_value(v).ok())
                    .ok_or("missing transactionAmount")?;
                if amount <= Decimal::ZERO {
                    return Err(format!("non-positive amount {}", amount));
                }
                let payment_type_id = body
                    .get("paymentTypeId")
                    .and_then(Value::as_i64)
                    .ok_or("missing paymentTypeId")?;
                let balance = book
                    .balances
                    .get_mut(&account_id)
                    .ok_or_else(|| format!("unknown account {}", account_id))?;
                match action {
                    LedgerAction::Deposit => *balance += amount,
                    LedgerAction::Withdrawal => {
                        if *balance < amount {
                            return Err(format!("insufficient funds on account {}", account_id));
                        }
                        *balance -= amount;
                    }
                }
                book.transactions.push(PostedTransaction {
                    resource_id,
                    account_id,
                    action,
                    amount,
                    payment_type_id,
                });
                Ok(resource_id)
            }
            Operation::Detail { table, resource_id } => {
                if !book.transactions.iter().any(|t| t.resource_id == resource_id) {
                    return Err(format!("no resource {} to attach details to", resource_id));
                }
                book.details.push(RecordedDetail {
                    table,
                    resource_id,
                    columns: body,
                });
                Ok(resource_id)
            }
        }
    }
}

#[async_trait]
impl LedgerGateway for InMemoryLedger {
    async fn submit_batch(&self, tenant: &str, batch: &Batch) -> Result<BatchReceipt> {
        let mut state = self.state.write().await;
        let mut book = state
            .books
            .get(tenant)
            .cloned()
            .ok_or_else(|| ConnectorError::LedgerError(format!("unknown tenant {}", tenant)))?;
        let mut next_resource_id = state.next_resource_id;
        let mut receipt = BatchReceipt::default();
        let mut previous: Option<i64> = None;

        for (index, item) in batch.items().iter().enumerate() {
            let resolved;
            let item = if item.resource_id_dependent {
                let Some(previous) = previous else {
                    return Err(ConnectorError::LedgerRejected {
                        index,
                        reason: "dependent item has no preceding resource".into(),
                    });
                };
                let id = previous.to_string();
                resolved = BatchItem {
                    relative_url: item.relative_url.replace(RESOURCE_ID_PLACEHOLDER, &id),
                    body: item.body.replace(RESOURCE_ID_PLACEHOLDER, &id),
                    resource_id_dependent: true,
                };
                &resolved
            } else {
                item
            };

            let created = Self::apply_item(&mut book, item, next_resource_id).map_err(|reason| {
                tracing::warn!(tenant, index, %reason, "Ledger rejected batch item");
                ConnectorError::LedgerRejected { index, reason }
            })?;
            if created == next_resource_id {
                next_resource_id += 1;
            }
            tracing::debug!(
                tenant,
                index,
                resource_id = created,
                url = %item.relative_url,
                "Applied batch item"
            );
            receipt.resource_ids.push(created);
            previous = Some(created);
        }

        state.books.insert(tenant.to_string(), book);
        state.next_resource_id = next_resource_id;
        Ok(receipt)
    }

    async fn lookup_account(&self, tenant: &str, iban: &Iban) -> Result<Option<AccountRecord>> {
        let state = self.state.read().await;
        let book = state
            .books
            .get(tenant)
            .ok_or_else(|| ConnectorError::LedgerError(format!("unknown tenant {}", tenant)))?;
        Ok(book.accounts_by_iban.get(iban.as_str()).cloned())
    }
}
