//! Job contract shared with the workflow orchestrator.
//!
//! A job names its stage and carries a flat map of variables. Each stage reads
//! its own typed request out of that map; fields a stage does not know about
//! are ignored and passed back untouched on completion.

use super::money::{Amount, Fee};
use crate::error::{ConnectorError, ErrorKind, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub type Variables = Map<String, Value>;

/// One activated job as delivered by the orchestrator.
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub key: u64,
    #[serde(rename = "type")]
    pub stage: String,
    #[serde(default)]
    pub variables: Variables,
}

/// Booking intents, one per orchestrator job type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    CreditTechnicalAccount,
    CreditConversionAccount,
    CreditConversionAccountRecall,
    CreditConversionAccountReturn,
    BookOnConversionAccount,
    RevertInAms,
    RevertWithoutFee,
    DepositOnDisposal,
    /// Resolves a customer IBAN to its ledger accounts; books nothing.
    AccountLookup,
}

impl Stage {
    pub const ALL: [Stage; 9] = [
        Stage::CreditTechnicalAccount,
        Stage::CreditConversionAccount,
        Stage::CreditConversionAccountRecall,
        Stage::CreditConversionAccountReturn,
        Stage::BookOnConversionAccount,
        Stage::RevertInAms,
        Stage::RevertWithoutFee,
        Stage::DepositOnDisposal,
        Stage::AccountLookup,
    ];

    /// The job type name the orchestrator dispatches on.
    pub fn job_type(&self) -> &'static str {
        match self {
            Stage::CreditTechnicalAccount => "bookCreditedAmountFromTechnicalAccount",
            Stage::CreditConversionAccount => "bookCreditedAmountToConversionAccount",
            Stage::CreditConversionAccountRecall => "bookCreditedAmountToConversionAccountInRecall",
            Stage::CreditConversionAccountReturn => "bookCreditedAmountToConversionAccountInReturn",
            Stage::BookOnConversionAccount => "bookOnConversionAccountInAms",
            Stage::RevertInAms => "revertInAms",
            Stage::RevertWithoutFee => "revertWithoutFeeInAms",
            Stage::DepositOnDisposal => "depositTheAmountOnDisposalInAms",
            Stage::AccountLookup => "getAccountDetailsFromAms",
        }
    }

    /// The signal raised to the orchestrator when the booking must be handled by hand.
    pub fn failure_signal(&self) -> &'static str {
        match self {
            Stage::CreditTechnicalAccount => "Error_BookFromTechnicalAccountToBeHandledManually",
            Stage::CreditConversionAccount
            | Stage::CreditConversionAccountRecall
            | Stage::CreditConversionAccountReturn => "Error_BookToConversionToBeHandledManually",
            Stage::BookOnConversionAccount => "Error_BookOnConversionToBeHandledManually",
            Stage::RevertInAms | Stage::RevertWithoutFee => "Error_RevertToBeHandledManually",
            Stage::DepositOnDisposal => "Error_DepositOnDisposalToBeHandledManually",
            Stage::AccountLookup => "Error_AccountLookupToBeHandledManually",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.job_type())
    }
}

impl FromStr for Stage {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.job_type() == s)
            .ok_or_else(|| ConnectorError::UnknownStage(s.to_string()))
    }
}

/// Result reported back to the orchestrator. There is no partial success.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The batch was applied; carries the input variables plus any resolved fields.
    Completed(Variables),
    /// Nothing was booked; the orchestrator routes the signal to human remediation.
    NeedsManualHandling {
        signal: &'static str,
        kind: ErrorKind,
        reason: String,
    },
}

/// Reads a typed stage request out of the job variables.
pub fn parse_request<T: DeserializeOwned>(variables: &Variables) -> Result<T> {
    T::deserialize(Value::Object(variables.clone()))
        .map_err(|e| ConnectorError::InvalidVariables(e.to_string()))
}

/// Fields every booking stage shares.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingContext {
    pub tenant_identifier: String,
    pub payment_scheme: String,
    #[serde(default)]
    pub internal_correlation_id: Option<String>,
    #[serde(default)]
    pub transaction_group_id: Option<String>,
    #[serde(default)]
    pub transaction_category_purpose_code: Option<String>,
}

/// Incoming credit booked off a technical account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalAccountCredit {
    #[serde(flatten)]
    pub context: BookingContext,
    pub transaction_date: String,
    pub amount: Amount,
    pub case_identifier: String,
    pub original_pacs008: String,
}

/// Incoming credit, recall or return booked onto the conversion account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionAccountCredit {
    #[serde(flatten)]
    pub context: BookingContext,
    pub transaction_date: String,
    pub amount: Amount,
    pub conversion_account_ams_id: i64,
    #[serde(default)]
    pub original_pacs008: Option<String>,
    #[serde(default)]
    pub pacs004: Option<String>,
    #[serde(default)]
    pub creditor_iban: Option<String>,
}

/// Outgoing payment debited from the conversion account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionAccountDebit {
    #[serde(flatten)]
    pub context: BookingContext,
    pub transaction_date: String,
    pub amount: Amount,
    pub transaction_fee_amount: Fee,
    #[serde(default)]
    pub transaction_fee_category_purpose_code: Option<String>,
    pub conversion_account_ams_id: i64,
    pub original_pain001: String,
}

/// Compensation of an earlier conversion-account debit.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertRequest {
    #[serde(flatten)]
    pub context: BookingContext,
    #[serde(default)]
    pub transaction_date: Option<String>,
    pub amount: Amount,
    pub transaction_fee_amount: Fee,
    #[serde(default)]
    pub transaction_fee_category_purpose_code: Option<String>,
    pub conversion_account_ams_id: i64,
    pub disposal_account_ams_id: i64,
    pub original_pain001: String,
    #[serde(default)]
    pub debtor_iban: Option<String>,
}

/// Lookup of the ledger accounts behind a customer IBAN.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountLookupRequest {
    pub tenant_identifier: String,
    #[serde(alias = "valueFilter")]
    pub iban: String,
}

/// Cancellation inflow moved from the conversion to the disposal account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisposalDeposit {
    #[serde(flatten)]
    pub context: BookingContext,
    #[serde(default)]
    pub transaction_date: Option<String>,
    pub amount: Amount,
    pub conversion_account_ams_id: i64,
    pub disposal_account_ams_id: i64,
    pub camt056: String,
    #[serde(default)]
    pub debtor_iban: Option<String>,
}
