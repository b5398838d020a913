use crate::domain::message::{
    CancellationReference, CreditDebit, MessageKind, PartyDetails, StatementEntry,
};
use crate::domain::ports::MessageAdapter;
use crate::error::{ConnectorError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Value, json};

/// Field locations of one message family, relative to its first transaction.
struct Layout {
    transaction: &'static str,
    amount: &'static str,
    end_to_end_id: &'static str,
    partner_iban: &'static str,
    partner_name: &'static str,
    remittance: &'static str,
    default_direction: CreditDebit,
}

fn layout(kind: MessageKind) -> Layout {
    match kind {
        MessageKind::Pacs008 => Layout {
            transaction: "/FIToFICstmrCdtTrf/CdtTrfTxInf/0",
            amount: "/IntrBkSttlmAmt",
            end_to_end_id: "/PmtId/EndToEndId",
            partner_iban: "/CdtrAcct/Id/IBAN",
            partner_name: "/Dbtr/Nm",
            remittance: "/RmtInf/Ustrd",
            default_direction: CreditDebit::Credit,
        },
        MessageKind::Pacs004 => Layout {
            transaction: "/PmtRtr/TxInf/0",
            amount: "/RtrdIntrBkSttlmAmt",
            end_to_end_id: "/OrgnlEndToEndId",
            partner_iban: "/OrgnlTxRef/DbtrAcct/Id/IBAN",
            partner_name: "/OrgnlTxRef/Cdtr/Nm",
            remittance: "/OrgnlTxRef/RmtInf/Ustrd",
            default_direction: CreditDebit::Credit,
        },
        MessageKind::Pain001 => Layout {
            transaction: "/Document/PmtInf/0/CdtTrfTxInf/0",
            amount: "/Amt/InstdAmt",
            end_to_end_id: "/PmtId/EndToEndId",
            partner_iban: "/CdtrAcct/Id/IBAN",
            partner_name: "/Cdtr/Nm",
            remittance: "/RmtInf/Ustrd",
            default_direction: CreditDebit::Debit,
        },
        MessageKind::Camt056 => Layout {
            transaction: "/FIToFIPmtCxlReq/Undrlyg/0/TxInf/0",
            amount: "/OrgnlIntrBkSttlmAmt",
            end_to_end_id: "/OrgnlEndToEndId",
            partner_iban: "/OrgnlTxRef/DbtrAcct/Id/IBAN",
            partner_name: "/OrgnlTxRef/Dbtr/Nm",
            remittance: "/OrgnlTxRef/RmtInf/Ustrd",
            default_direction: CreditDebit::Debit,
        },
    }
}

/// Message adapter for upstream messages delivered as JSON documents using the
/// ISO 20022 element names.
///
/// Produces a camt.053-shaped report entry per message. Full codec support is
/// the job of the upstream converters; this adapter only lifts the fields the
/// statement records need.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonMessageAdapter;

impl JsonMessageAdapter {
    pub fn new() -> Self {
        Self
    }

    fn parse(kind: MessageKind, raw: &str) -> Result<Value> {
        serde_json::from_str(raw)
            .map_err(|e| ConnectorError::DecodeError(format!("malformed {}: {}", kind, e)))
    }

    fn transaction<'a>(kind: MessageKind, document: &'a Value, pointer: &str) -> Result<&'a Value> {
        document.pointer(pointer).ok_or_else(|| {
            ConnectorError::DecodeError(format!("{} carries no transaction information", kind))
        })
    }
}

fn text(node: &Value, pointer: &str) -> Option<String> {
    match node.pointer(pointer)? {
        Value::String(s) => Some(s.clone()),
        Value::Array(lines) => {
            let joined = lines
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(" ");
            (!joined.is_empty()).then_some(joined)
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_creation_date(value: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.date_naive())
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date())
        })
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .ok()
}

impl MessageAdapter for JsonMessageAdapter {
    fn statement_entry(
        &self,
        kind: MessageKind,
        raw: &str,
        direction: Option<CreditDebit>,
    ) -> Result<StatementEntry> {
        let layout = layout(kind);
        let document = Self::parse(kind, raw)?;
        let transaction = Self::transaction(kind, &document, layout.transaction)?;

        let indicator = direction.unwrap_or(layout.default_direction);
        let remittance = text(transaction, layout.remittance);
        let payload = json!({
            "Amt": transaction.pointer(layout.amount).cloned().unwrap_or(Value::Null),
            "CdtDbtInd": indicator,
            "NtryDtls": [{
                "TxDtls": [{
                    "Refs": { "EndToEndId": text(transaction, layout.end_to_end_id) },
                    "CdtDbtInd": indicator,
                    "RmtInf": { "Ustrd": remittance.clone() },
                }]
            }],
            "AddtlNtryInf": kind.to_string(),
        });

        Ok(StatementEntry {
            payload,
            party: PartyDetails {
                account_iban: text(transaction, layout.partner_iban),
                name: text(transaction, layout.partner_name),
                remittance_information: remittance,
            },
        })
    }

    fn cancellation_reference(&self, raw: &str) -> Result<CancellationReference> {
        let kind = MessageKind::Camt056;
        let document = Self::parse(kind, raw)?;
        let transaction = Self::transaction(kind, &document, layout(kind).transaction)?;

        let missing =
            |field: &str| ConnectorError::DecodeError(format!("{} lacks {}", kind, field));

        let original_debtor_bic = text(transaction, "/OrgnlTxRef/DbtrAgt/FinInstnId/BIC")
            .or_else(|| text(transaction, "/OrgnlTxRef/DbtrAgt/FinInstnId/BICFI"))
            .ok_or_else(|| missing("the original debtor agent BIC"))?;
        let original_creation_date = text(transaction, "/OrgnlGrpInf/OrgnlCreDtTm")
            .as_deref()
            .and_then(parse_creation_date)
            .ok_or_else(|| missing("a valid original creation date"))?;
        let original_end_to_end_id = text(transaction, "/OrgnlEndToEndId")
            .ok_or_else(|| missing("the original end-to-end id"))?;

        Ok(CancellationReference {
            original_debtor_bic,
            original_creation_date,
            original_end_to_end_id,
        })
    }
}
