mod common;

use ams_connector::domain::job::{Job, JobOutcome, Stage, Variables};
use ams_connector::error::ErrorKind;
use common::*;
use serde_json::json;

fn lookup_job(tenant: &str, iban: &str) -> Job {
    Job {
        key: 1,
        stage: Stage::AccountLookup.job_type().to_string(),
        variables: json!({"tenantIdentifier": tenant, "valueFilter": iban})
            .as_object()
            .unwrap()
            .clone(),
    }
}

fn completed(outcome: JobOutcome) -> Variables {
    match outcome {
        JobOutcome::Completed(variables) => variables,
        other => panic!("expected completion, got {:?}", other),
    }
}

#[tokio::test]
async fn test_seeded_iban_is_ready() {
    let ledger = seeded_ledger().await;

    let outcome = worker(&ledger)
        .handle(&lookup_job(TENANT, "HU42117730161111101800000000"))
        .await;

    let variables = completed(outcome);
    assert_eq!(variables["accountAmsStatus"], "READY_TO_RECEIVE_MONEY");
    assert_eq!(variables["conversionAccountAmsId"], CONVERSION_ACCOUNT);
    assert_eq!(variables["disposalAccountAmsId"], DISPOSAL_ACCOUNT);
    assert_eq!(variables["accountAmsFlags"], json!([]));
}

#[tokio::test]
async fn test_flagged_iban_is_not_ready() {
    let ledger = seeded_ledger().await;

    let outcome = worker(&ledger)
        .handle(&lookup_job(TENANT, "HU09117730161111101800000012"))
        .await;

    let variables = completed(outcome);
    assert_eq!(variables["accountAmsStatus"], "NOT_READY_TO_RECEIVE_MONEY");
    assert_eq!(variables["conversionAccountAmsId"], 21);
    assert_eq!(variables["accountAmsFlags"], json!(["BLOCKED"]));
}

#[tokio::test]
async fn test_unknown_iban_is_not_ready_without_fallback_ids() {
    let ledger = seeded_ledger().await;

    let outcome = worker(&ledger)
        .handle(&lookup_job(TENANT, "HU93116000060000000012345676"))
        .await;

    let variables = completed(outcome);
    assert_eq!(variables["accountAmsStatus"], "NOT_READY_TO_RECEIVE_MONEY");
    assert!(!variables.contains_key("conversionAccountAmsId"));
    assert!(!variables.contains_key("disposalAccountAmsId"));
}

#[tokio::test]
async fn test_malformed_iban_is_decode_fault() {
    let ledger = seeded_ledger().await;

    let outcome = worker(&ledger)
        .handle(&lookup_job(TENANT, "HU42 1177 3016 1111 1018 0000 0000"))
        .await;

    assert!(matches!(
        outcome,
        JobOutcome::NeedsManualHandling {
            signal: "Error_AccountLookupToBeHandledManually",
            kind: ErrorKind::Decode,
            ..
        }
    ));
}

#[tokio::test]
async fn test_lookup_for_unconfigured_tenant() {
    let ledger = seeded_ledger().await;

    let outcome = worker(&ledger)
        .handle(&lookup_job("T9", "HU42117730161111101800000000"))
        .await;

    assert!(matches!(
        outcome,
        JobOutcome::NeedsManualHandling {
            kind: ErrorKind::Configuration,
            ..
        }
    ));
}

#[tokio::test]
async fn test_lookup_does_not_book() {
    let ledger = seeded_ledger().await;

    worker(&ledger)
        .handle(&lookup_job(TENANT, "HU42117730161111101800000000"))
        .await;

    assert!(ledger.transactions(TENANT).await.is_empty());
    assert!(ledger.details(TENANT).await.is_empty());
}
