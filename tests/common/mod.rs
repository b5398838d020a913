#![allow(dead_code)]

use ams_connector::application::account_lookup::AccountLookup;
use ams_connector::application::booking::BookingOrchestrator;
use ams_connector::application::worker::JobWorker;
use ams_connector::domain::account::Iban;
use ams_connector::domain::job::Variables;
use ams_connector::infrastructure::in_memory::InMemoryLedger;
use ams_connector::infrastructure::json_adapter::JsonMessageAdapter;
use ams_connector::settings::Settings;
use serde_json::{Value, json};
use std::sync::Arc;

pub const TENANT: &str = "T1";
pub const CONVERSION_ACCOUNT: i64 = 11;
pub const DISPOSAL_ACCOUNT: i64 = 12;
pub const TECHNICAL_ACCOUNT: i64 = 90;

pub const SETTINGS: &str = r#"
[ledger]
api_base_path = "/savingsaccounts/"
statement_details_table = "dt_savings_transaction_details"

[logging]
level = "warn"

[tenants.T1.payment_type_ids]
"SCT.bookCreditedAmountFromTechnicalAccount.recall.WithdrawTransactionAmount" = 1
"SCT.bookCreditedAmountToConversionAccount.ConversionAccount.DepositTransactionAmount" = 2
"SCT.bookCreditedAmountToConversionAccountInRecall.ConversionAccount.DepositTransactionAmount" = 3
"SCT.bookCreditedAmountToConversionAccountInReturn.ConversionAccount.DepositTransactionAmount" = 4
"SCT.bookOnConversionAccountInAms.ConversionAccount.WithdrawTransactionAmount" = 5
"SCT.bookOnConversionAccountInAms.ConversionAccount.WithdrawTransactionFee" = 6
"SCT.revertInAms.ConversionAccount.WithdrawTransactionAmount" = 7
"SCT.revertInAms.ConversionAccount.WithdrawTransactionFee" = 8
"SCT.revertInAms.DisposalAccount.DepositTransactionAmount" = 9
"SCT.revertInAms.DisposalAccount.DepositTransactionFee" = 10

[tenants.T1.payment_type_codes]
"SCT.revertInAms.DisposalAccount.DepositTransactionAmount" = "RVT-DEP"

[tenants.T1.technical_accounts]
"SCT.recall" = 90

[[accounts]]
tenant = "T1"
id = 11
balance = "1000.00"

[[accounts]]
tenant = "T1"
id = 12
balance = "0"

[[accounts]]
tenant = "T1"
id = 90
balance = "1000.00"

[[iban_accounts]]
tenant = "T1"
iban = "HU42117730161111101800000000"
conversion_account_id = 11
disposal_account_id = 12

[[iban_accounts]]
tenant = "T1"
iban = "HU09117730161111101800000012"
conversion_account_id = 21
disposal_account_id = 22
flags = ["BLOCKED"]
"#;

pub const PACS008: &str = r#"{"FIToFICstmrCdtTrf":{"CdtTrfTxInf":[{
    "PmtId":{"EndToEndId":"E2E-1"},
    "IntrBkSttlmAmt":{"Ccy":"HUF","value":"100.00"},
    "Dbtr":{"Nm":"Alice"},
    "CdtrAcct":{"Id":{"IBAN":"HU42117730161111101800000000"}},
    "RmtInf":{"Ustrd":["invoice","42"]}}]}}"#;

pub const PACS004: &str = r#"{"PmtRtr":{"TxInf":[{
    "OrgnlEndToEndId":"E2E-1",
    "RtrdIntrBkSttlmAmt":{"Ccy":"HUF","value":"100.00"},
    "OrgnlTxRef":{
        "DbtrAcct":{"Id":{"IBAN":"HU93116000060000000012345676"}},
        "Cdtr":{"Nm":"Carol"},
        "RmtInf":{"Ustrd":"refund"}}}]}}"#;

pub const PAIN001: &str = r#"{"Document":{"PmtInf":[{"CdtTrfTxInf":[{
    "PmtId":{"EndToEndId":"E2E-7"},
    "Amt":{"InstdAmt":{"Ccy":"HUF","value":"100.00"}},
    "Cdtr":{"Nm":"Bob"},
    "CdtrAcct":{"Id":{"IBAN":"HU80117730161111101800000001"}},
    "RmtInf":{"Ustrd":"rent"}}]}]}}"#;

pub const CAMT056: &str = r#"{"FIToFIPmtCxlReq":{"Undrlyg":[{"TxInf":[{
    "OrgnlEndToEndId":"E2E-9",
    "OrgnlIntrBkSttlmAmt":{"Ccy":"HUF","value":"100.00"},
    "OrgnlGrpInf":{"OrgnlCreDtTm":"2023-10-24T23:30:00+02:00"},
    "OrgnlTxRef":{
        "DbtrAgt":{"FinInstnId":{"BIC":"HBBAHUHB"}},
        "Dbtr":{"Nm":"Dave"}}}]}]}}"#;

pub fn settings() -> Settings {
    Settings::parse(SETTINGS).unwrap()
}

/// A ledger seeded with the accounts from [`SETTINGS`].
pub async fn seeded_ledger() -> InMemoryLedger {
    let ledger = InMemoryLedger::new();
    for seed in settings().accounts {
        ledger.open_account(&seed.tenant, seed.id, seed.balance).await;
    }
    for seed in settings().iban_accounts {
        let iban = Iban::parse(&seed.iban).unwrap();
        ledger.register_iban(&seed.tenant, &iban, seed.record()).await;
    }
    ledger
}

pub fn orchestrator(ledger: &InMemoryLedger) -> BookingOrchestrator {
    let settings = settings();
    BookingOrchestrator::new(
        Arc::new(settings.resolver()),
        Arc::new(ledger.clone()),
        Arc::new(JsonMessageAdapter::new()),
        settings.ledger,
    )
}

pub fn worker(ledger: &InMemoryLedger) -> JobWorker {
    let resolver = Arc::new(settings().resolver());
    let accounts = AccountLookup::new(Arc::clone(&resolver), Arc::new(ledger.clone()));
    JobWorker::new(Arc::new(orchestrator(ledger)), Arc::new(accounts))
}

/// Builds job variables: the shared booking context merged with `extra`.
pub fn variables(extra: Value) -> Variables {
    let mut variables = json!({
        "tenantIdentifier": TENANT,
        "paymentScheme": "SCT",
        "transactionDate": "20231024",
        "internalCorrelationId": "corr-1",
        "transactionGroupId": "grp-1",
        "transactionCategoryPurposeCode": "CASH"
    })
    .as_object()
    .unwrap()
    .clone();
    if let Value::Object(extra) = extra {
        variables.extend(extra);
    }
    variables
}

pub fn revert_variables(fee: &str) -> Variables {
    variables(json!({
        "amount": "100.00",
        "transactionFeeAmount": fee,
        "transactionFeeCategoryPurposeCode": "FEES",
        "conversionAccountAmsId": CONVERSION_ACCOUNT,
        "disposalAccountAmsId": DISPOSAL_ACCOUNT,
        "originalPain001": PAIN001,
        "debtorIban": "HU11117730161111101800009999"
    }))
}

pub fn conversion_debit_variables(fee: &str) -> Variables {
    variables(json!({
        "amount": "100.00",
        "transactionFeeAmount": fee,
        "transactionFeeCategoryPurposeCode": "FEES",
        "conversionAccountAmsId": CONVERSION_ACCOUNT,
        "originalPain001": PAIN001
    }))
}

/// Parses the JSON body of the `index`th batch item.
pub fn body(batch: &ams_connector::domain::batch::Batch, index: usize) -> Value {
    serde_json::from_str(&batch.items()[index].body).unwrap()
}
