mod common;

use ams_connector::domain::job::Stage;
use ams_connector::error::{ConnectorError, ErrorKind};
use common::*;
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn test_conversion_debit_without_fee_has_two_legs() {
    let ledger = seeded_ledger().await;
    let planned = orchestrator(&ledger)
        .plan(Stage::BookOnConversionAccount, &conversion_debit_variables("0"))
        .unwrap();
    let items = planned.batch.items();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].relative_url, "savingsaccounts/11/transactions?command=withdrawal");
    assert!(!items[0].resource_id_dependent);
    assert_eq!(
        items[1].relative_url,
        "datatables/dt_savings_transaction_details/$.resourceId"
    );
    assert!(items[1].resource_id_dependent);

    let money = body(&planned.batch, 0);
    assert_eq!(money["transactionDate"], "20231024");
    assert_eq!(money["transactionAmount"], "100.00");
    assert_eq!(money["paymentTypeId"], 5);
    assert_eq!(money["dateFormat"], "yyyyMMdd");
    assert_eq!(money["locale"], "en");

    let detail = body(&planned.batch, 1);
    assert_eq!(detail["internal_correlation_id"], "corr-1");
    assert_eq!(detail["transaction_group_id"], "grp-1");
    assert_eq!(detail["category_purpose_code"], "CASH");
    assert_eq!(detail["partner_name"], "Bob");
    assert!(detail.get("payment_type_code").is_none());
}

#[tokio::test]
async fn test_conversion_debit_books_amount_and_fee() {
    let ledger = seeded_ledger().await;
    orchestrator(&ledger)
        .execute(Stage::BookOnConversionAccount, &conversion_debit_variables("2.50"))
        .await
        .unwrap();

    assert_eq!(ledger.balance(TENANT, CONVERSION_ACCOUNT).await, Some(dec!(897.50)));
    let transactions = ledger.transactions(TENANT).await;
    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[1].payment_type_id, 6);

    let details = ledger.details(TENANT).await;
    assert_eq!(details.len(), 2);
    assert_eq!(details[0].resource_id, transactions[0].resource_id);
    assert_eq!(details[1].resource_id, transactions[1].resource_id);
    assert_eq!(details[1].columns["category_purpose_code"], "FEES");
}

#[tokio::test]
async fn test_unconfigured_tenant_builds_nothing() {
    let ledger = seeded_ledger().await;
    let mut variables = revert_variables("2.50");
    variables.insert("tenantIdentifier".into(), json!("T9"));

    let result = orchestrator(&ledger).execute(Stage::RevertInAms, &variables).await;

    assert!(matches!(result, Err(ConnectorError::ConfigNotFound(ref t)) if t == "T9"));
    assert!(ledger.transactions(TENANT).await.is_empty());
}

#[tokio::test]
async fn test_unmapped_operation_is_configuration_fault() {
    let ledger = seeded_ledger().await;
    let mut variables = conversion_debit_variables("0");
    variables.insert("paymentScheme".into(), json!("INST"));

    let err = orchestrator(&ledger)
        .plan(Stage::BookOnConversionAccount, &variables)
        .unwrap_err();

    assert!(matches!(
        err,
        ConnectorError::OperationNotConfigured { ref key, .. }
            if key == "INST.bookOnConversionAccountInAms.ConversionAccount.WithdrawTransactionAmount"
    ));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn test_technical_account_credit_resolves_account() {
    let ledger = seeded_ledger().await;
    let variables = variables(json!({
        "amount": "100.00",
        "caseIdentifier": "recall",
        "originalPacs008": PACS008
    }));

    let output = orchestrator(&ledger)
        .execute(Stage::CreditTechnicalAccount, &variables)
        .await
        .unwrap();

    assert_eq!(output["technicalAccountAmsId"], 90);
    assert_eq!(output["internalCorrelationId"], "corr-1");
    assert_eq!(ledger.balance(TENANT, TECHNICAL_ACCOUNT).await, Some(dec!(900.00)));

    let details = ledger.details(TENANT).await;
    assert_eq!(details.len(), 1);
    assert!(details[0].columns.get("partner_account_iban").is_none());
    let statement: serde_json::Value =
        serde_json::from_str(details[0].columns["structured_transaction_details"].as_str().unwrap())
            .unwrap();
    assert_eq!(statement["NtryDtls"][0]["TxDtls"][0]["Refs"]["EndToEndId"], "E2E-1");
}

#[tokio::test]
async fn test_unknown_case_has_no_technical_account() {
    let ledger = seeded_ledger().await;
    let variables = variables(json!({
        "amount": "100.00",
        "caseIdentifier": "return",
        "originalPacs008": PACS008
    }));

    let err = orchestrator(&ledger)
        .plan(Stage::CreditTechnicalAccount, &variables)
        .unwrap_err();

    assert!(matches!(err, ConnectorError::TechnicalAccountNotConfigured { .. }));
}

#[tokio::test]
async fn test_conversion_credit_forces_credit_indicator() {
    let ledger = seeded_ledger().await;
    let variables = variables(json!({
        "amount": "100.00",
        "conversionAccountAmsId": CONVERSION_ACCOUNT,
        "originalPacs008": PACS008
    }));

    let planned = orchestrator(&ledger)
        .plan(Stage::CreditConversionAccountRecall, &variables)
        .unwrap();

    assert_eq!(planned.batch.len(), 2);
    assert_eq!(body(&planned.batch, 0)["paymentTypeId"], 3);
    let detail = body(&planned.batch, 1);
    assert_eq!(detail["partner_account_iban"], "HU42117730161111101800000000");
    assert_eq!(detail["partner_name"], "Alice");
    assert_eq!(detail["remittance_information"], "invoice 42");
    let statement: serde_json::Value =
        serde_json::from_str(detail["structured_transaction_details"].as_str().unwrap()).unwrap();
    assert_eq!(statement["CdtDbtInd"], "CRDT");
}

#[tokio::test]
async fn test_incoming_credit_falls_back_to_creditor_iban() {
    let ledger = seeded_ledger().await;
    let without_creditor_account =
        PACS008.replace(r#""CdtrAcct":{"Id":{"IBAN":"HU42117730161111101800000000"}},"#, "");
    let variables = variables(json!({
        "amount": "100.00",
        "conversionAccountAmsId": CONVERSION_ACCOUNT,
        "originalPacs008": without_creditor_account,
        "creditorIban": "HU09117730161111101800000012"
    }));

    let orchestrator = orchestrator(&ledger);
    let planned = orchestrator
        .plan(Stage::CreditConversionAccount, &variables)
        .unwrap();
    assert_eq!(planned.batch.len(), 2);
    assert_eq!(body(&planned.batch, 0)["paymentTypeId"], 2);

    let output = orchestrator
        .execute(Stage::CreditConversionAccount, &variables)
        .await
        .unwrap();

    assert_eq!(output["creditorIban"], "HU09117730161111101800000012");
    assert_eq!(ledger.balance(TENANT, CONVERSION_ACCOUNT).await, Some(dec!(1100.00)));
    let transactions = ledger.transactions(TENANT).await;
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].payment_type_id, 2);

    let details = ledger.details(TENANT).await;
    assert_eq!(details.len(), 1);
    let detail = &details[0].columns;
    assert_eq!(detail["partner_account_iban"], "HU09117730161111101800000012");
    assert_eq!(detail["partner_name"], "Alice");
    let statement: serde_json::Value =
        serde_json::from_str(detail["structured_transaction_details"].as_str().unwrap()).unwrap();
    assert_eq!(statement["CdtDbtInd"], "CRDT");
}

#[tokio::test]
async fn test_recall_requires_original_credit() {
    let ledger = seeded_ledger().await;
    let variables = variables(json!({
        "amount": "100.00",
        "conversionAccountAmsId": CONVERSION_ACCOUNT
    }));

    let result = orchestrator(&ledger).plan(Stage::CreditConversionAccountRecall, &variables);

    assert!(matches!(
        result,
        Err(ConnectorError::MissingVariable("originalPacs008"))
    ));
}

#[tokio::test]
async fn test_return_without_original_credit_uses_empty_entry() {
    let ledger = seeded_ledger().await;
    let variables = variables(json!({
        "amount": "100.00",
        "conversionAccountAmsId": CONVERSION_ACCOUNT,
        "pacs004": PACS004
    }));

    let output = orchestrator(&ledger)
        .execute(Stage::CreditConversionAccountReturn, &variables)
        .await
        .unwrap();

    assert_eq!(output["pacs004"], PACS004);
    assert_eq!(ledger.balance(TENANT, CONVERSION_ACCOUNT).await, Some(dec!(1100.00)));
    let detail = &ledger.details(TENANT).await[0].columns;
    assert_eq!(detail["structured_transaction_details"], "{}");
    assert_eq!(detail["partner_name"], "Carol");
    assert_eq!(detail["partner_account_iban"], "HU93116000060000000012345676");
    assert_eq!(detail["remittance_information"], "refund");
}

#[tokio::test]
async fn test_invalid_amount_is_caller_error() {
    let ledger = seeded_ledger().await;
    let mut variables = conversion_debit_variables("0");
    variables.insert("amount".into(), json!("-5"));

    let err = orchestrator(&ledger)
        .plan(Stage::BookOnConversionAccount, &variables)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[tokio::test]
async fn test_every_money_leg_is_followed_by_its_detail() {
    let ledger = seeded_ledger().await;
    let planned = orchestrator(&ledger)
        .plan(Stage::RevertInAms, &revert_variables("1.25"))
        .unwrap();

    for pair in planned.batch.items().chunks(2) {
        assert!(pair[0].relative_url.contains("/transactions?command="));
        assert!(!pair[0].resource_id_dependent);
        assert!(pair[1].relative_url.starts_with("datatables/"));
        assert!(pair[1].resource_id_dependent);
    }
}
