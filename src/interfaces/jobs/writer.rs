use crate::domain::job::{Job, JobOutcome, Variables};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum OutcomeRecord<'a> {
    Completed {
        key: u64,
        #[serde(rename = "type")]
        job_type: &'a str,
        variables: &'a Variables,
    },
    Failed {
        key: u64,
        #[serde(rename = "type")]
        job_type: &'a str,
        signal: &'a str,
        kind: String,
        reason: &'a str,
    },
}

/// Writes job outcomes as JSON Lines, one per job.
pub struct OutcomeWriter<W: Write> {
    writer: W,
}

impl<W: Write> OutcomeWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_outcome(&mut self, job: &Job, outcome: &JobOutcome) -> io::Result<()> {
        let record = match outcome {
            JobOutcome::Completed(variables) => OutcomeRecord::Completed {
                key: job.key,
                job_type: &job.stage,
                variables,
            },
            JobOutcome::NeedsManualHandling {
                signal,
                kind,
                reason,
            } => OutcomeRecord::Failed {
                key: job.key,
                job_type: &job.stage,
                signal,
                kind: format!("{:?}", kind),
                reason,
            },
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
