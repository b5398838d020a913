use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Upstream ISO 20022 message families the connector receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// FI-to-FI customer credit transfer.
    Pacs008,
    /// Payment return.
    Pacs004,
    /// Customer credit transfer initiation.
    Pain001,
    /// FI-to-FI payment cancellation request.
    Camt056,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageKind::Pacs008 => "pacs.008",
            MessageKind::Pacs004 => "pacs.004",
            MessageKind::Pain001 => "pain.001",
            MessageKind::Camt056 => "camt.056",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditDebit {
    #[serde(rename = "CRDT")]
    Credit,
    #[serde(rename = "DBIT")]
    Debit,
}

/// Counterparty data lifted from a message for the statement detail record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartyDetails {
    pub account_iban: Option<String>,
    pub name: Option<String>,
    pub remittance_information: Option<String>,
}

/// Statement entry produced by a [`MessageAdapter`](super::ports::MessageAdapter).
///
/// The payload is opaque to the booking logic; it is only serialized into the
/// statement detail of each leg.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementEntry {
    pub payload: Value,
    pub party: PartyDetails,
}

impl StatementEntry {
    /// Placeholder entry used when the original credit message is not available.
    pub fn empty() -> Self {
        Self {
            payload: Value::Object(Default::default()),
            party: PartyDetails::default(),
        }
    }

    pub fn serialized_payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.payload)
    }
}

/// Reference to the original payment named by a cancellation request.
#[derive(Debug, Clone, PartialEq)]
pub struct CancellationReference {
    pub original_debtor_bic: String,
    pub original_creation_date: NaiveDate,
    pub original_end_to_end_id: String,
}

impl CancellationReference {
    /// Correlation id of the original payment: `<bic>_<yyyyMMdd>_<endToEndId>`.
    pub fn correlation_id(&self) -> String {
        format!(
            "{}_{}_{}",
            self.original_debtor_bic,
            self.original_creation_date.format("%Y%m%d"),
            self.original_end_to_end_id
        )
    }
}
