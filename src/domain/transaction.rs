use super::money::Amount;
use serde::Serialize;

/// Savings-account command issued by a money-moving leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerAction {
    Withdrawal,
    Deposit,
}

impl LedgerAction {
    /// The `command` query parameter understood by the ledger.
    pub fn command(&self) -> &'static str {
        match self {
            LedgerAction::Withdrawal => "withdrawal",
            LedgerAction::Deposit => "deposit",
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            LedgerAction::Withdrawal => "Withdraw",
            LedgerAction::Deposit => "Deposit",
        }
    }

    /// The opposite action, used when a booking is reverted.
    pub fn inverse(&self) -> Self {
        match self {
            LedgerAction::Withdrawal => LedgerAction::Deposit,
            LedgerAction::Deposit => LedgerAction::Withdrawal,
        }
    }
}

/// Which part of the payment a leg moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegPart {
    TransactionAmount,
    TransactionFee,
}

/// Builds the action segment of an operation key, e.g. `WithdrawTransactionFee`.
pub fn action_segment(action: LedgerAction, part: LegPart) -> String {
    let part = match part {
        LegPart::TransactionAmount => "TransactionAmount",
        LegPart::TransactionFee => "TransactionFee",
    };
    format!("{}{}", action.verb(), part)
}

/// Ledger accounts a booking leg can target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountRole {
    Conversion,
    Disposal,
    /// Technical account selected by the case identifier of the job.
    Technical(String),
}

impl AccountRole {
    pub fn key_segment(&self) -> &str {
        match self {
            AccountRole::Conversion => "ConversionAccount",
            AccountRole::Disposal => "DisposalAccount",
            AccountRole::Technical(case_identifier) => case_identifier,
        }
    }
}

/// Body of a savings-account withdrawal or deposit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBody {
    pub transaction_date: String,
    pub transaction_amount: Amount,
    pub payment_type_id: i64,
    pub note: String,
    pub date_format: String,
    pub locale: String,
}

/// Statement record attached to the resource created by a money-moving leg.
///
/// Serialized as datatable columns; empty optional columns are left out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementDetail {
    pub internal_correlation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_transaction_details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_account_iban: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_type_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remittance_information: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_purpose_code: Option<String>,
}
