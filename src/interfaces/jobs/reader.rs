use crate::domain::job::Job;
use crate::error::{ConnectorError, Result};
use std::io::{BufRead, BufReader, Read};

/// Reads activated jobs from a JSON Lines source.
///
/// One job per line; blank lines are skipped. A line that does not parse
/// yields an error item, so callers can report it and keep going.
pub struct JobReader<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> JobReader<R> {
    /// Creates a new `JobReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        Self {
            reader: BufReader::new(source),
        }
    }

    /// Returns an iterator that lazily reads and deserializes jobs, paired with
    /// their 1-based line number.
    pub fn jobs(self) -> impl Iterator<Item = (usize, Result<Job>)> {
        self.reader
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line.map_err(ConnectorError::from)))
            .filter(|(_, line)| !matches!(line, Ok(l) if l.trim().is_empty()))
            .map(|(number, line)| {
                let job = line.and_then(|l| Ok(serde_json::from_str::<Job>(&l)?));
                (number, job)
            })
    }
}
