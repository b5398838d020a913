use crate::application::account_lookup::AccountLookup;
use crate::application::booking::BookingOrchestrator;
use crate::domain::job::{Job, JobOutcome, Stage, Variables};
use crate::error::{ConnectorError, ErrorKind, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::{Instrument, Span, error, field, info_span, warn};

/// Signal raised for jobs whose type no stage handles.
pub const UNSUPPORTED_JOB_SIGNAL: &str = "Error_JobTypeNotSupported";

/// Turns activated jobs into outcomes.
///
/// Every failure becomes a [`JobOutcome::NeedsManualHandling`]; the worker
/// never retries a booking on its own.
#[derive(Clone)]
pub struct JobWorker {
    orchestrator: Arc<BookingOrchestrator>,
    accounts: Arc<AccountLookup>,
}

fn variable<'a>(job: &'a Job, name: &str) -> Option<&'a str> {
    job.variables.get(name).and_then(Value::as_str)
}

impl JobWorker {
    pub fn new(orchestrator: Arc<BookingOrchestrator>, accounts: Arc<AccountLookup>) -> Self {
        Self {
            orchestrator,
            accounts,
        }
    }

    pub async fn handle(&self, job: &Job) -> JobOutcome {
        let stage = match job.stage.parse::<Stage>() {
            Ok(stage) => stage,
            Err(e) => {
                warn!(key = job.key, job_type = %job.stage, "No handler for job type");
                return JobOutcome::NeedsManualHandling {
                    signal: UNSUPPORTED_JOB_SIGNAL,
                    kind: e.kind(),
                    reason: e.to_string(),
                };
            }
        };

        // Filled in once known; disposal deposits may derive it from the camt.056.
        let span = info_span!(
            "job",
            key = job.key,
            stage = %stage,
            tenant = variable(job, "tenantIdentifier").unwrap_or("-"),
            internal_correlation_id = field::Empty,
        );

        async {
            let mut correlation_id = variable(job, "internalCorrelationId").map(str::to_string);
            if let Some(id) = &correlation_id {
                Span::current().record("internal_correlation_id", id.as_str());
            }
            match self.run(stage, &job.variables, &mut correlation_id).await {
                Ok(variables) => JobOutcome::Completed(variables),
                Err(e) => failed(stage, correlation_id.as_deref().unwrap_or("-"), e),
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        stage: Stage,
        variables: &Variables,
        correlation_id: &mut Option<String>,
    ) -> Result<Variables> {
        if stage == Stage::AccountLookup {
            return self.accounts.execute(variables).await;
        }
        let planned = self.orchestrator.plan(stage, variables)?;
        Span::current().record("internal_correlation_id", planned.correlation_id.as_str());
        *correlation_id = Some(planned.correlation_id.clone());
        self.orchestrator.submit(planned, variables).await
    }
}

fn failed(stage: Stage, correlation_id: &str, e: ConnectorError) -> JobOutcome {
    let kind: ErrorKind = e.kind();
    error!(
        internal_correlation_id = correlation_id,
        kind = ?kind,
        error = %e,
        "Job failed, raising {}",
        stage.failure_signal()
    );
    JobOutcome::NeedsManualHandling {
        signal: stage.failure_signal(),
        kind,
        reason: e.to_string(),
    }
}
