//! Drives a decoded command stream through a [`FastRmq`].

use std::fmt;
use std::time::Instant;

use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::command::{Command, CommandStream, StreamError};
use crate::config::{InvalidMarkPolicy, RmqConfig};
use crate::report::RunReport;
use crate::rmq::{FastRmq, Position, RmqError};

/// Printed length is the number of appended values minus this.
pub const REPORTED_LENGTH_OFFSET: i64 = 1;

/// One output line: mark key, reported length, minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub key: Position,
    pub reported_len: i64,
    pub value: i32,
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.key, self.reported_len, self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("mark key {0} is negative")]
    NegativeKey(i32),
    #[error(transparent)]
    Mark(#[from] RmqError),
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error("command {index} ({command}): {source}")]
    Command {
        index: usize,
        command: Command,
        #[source]
        source: CommandError,
    },
}

pub struct Runner {
    rmq: FastRmq<i32>,
    policy: InvalidMarkPolicy,
    report: RunReport,
}

impl Runner {
    pub fn new(config: &RmqConfig) -> Self {
        Self {
            rmq: config.build(),
            policy: config.on_invalid_mark,
            report: RunReport::default(),
        }
    }

    pub fn rmq(&self) -> &FastRmq<i32> {
        &self.rmq
    }

    /// Applies one command. Queries and closes yield their output line.
    pub fn execute(&mut self, command: Command) -> Result<Option<Answer>, CommandError> {
        self.report.count(command);
        match command {
            Command::Value(v) => {
                self.rmq.append(v);
                Ok(None)
            }
            Command::Mark => {
                self.rmq.mark();
                Ok(None)
            }
            Command::Query(raw) => {
                let key = mark_key(raw)?;
                let value = self.rmq.query(key)?;
                Ok(Some(self.answer(key, value)))
            }
            Command::Close(raw) => {
                let key = mark_key(raw)?;
                let value = self.rmq.close(key)?;
                Ok(Some(self.answer(key, value)))
            }
        }
    }

    /// Runs every command of `stream` in order and collects the output lines.
    /// Under [`InvalidMarkPolicy::Abort`] the first bad query ends the run
    /// with no lines at all.
    pub fn run(&mut self, stream: &CommandStream) -> Result<Vec<Answer>, RunError> {
        let started = Instant::now();
        if usize::try_from(stream.declared_marks).ok() != Some(stream.mark_count()) {
            warn!(
                "header announces {} marks, stream holds {}",
                stream.declared_marks,
                stream.mark_count()
            );
        }

        let mut answers = Vec::new();
        for (index, &command) in stream.commands.iter().enumerate() {
            match self.execute(command) {
                Ok(Some(answer)) => answers.push(answer),
                Ok(None) => {}
                Err(err) if self.policy == InvalidMarkPolicy::Skip => {
                    warn!("skipping command {index} ({command}): {err}");
                    self.report.skipped += 1;
                }
                Err(source) => {
                    self.report.elapsed += started.elapsed();
                    return Err(RunError::Command {
                        index,
                        command,
                        source,
                    });
                }
            }
        }
        self.report.elapsed += started.elapsed();
        Ok(answers)
    }

    /// Statistics so far, growth figures included.
    pub fn report(&self) -> RunReport {
        let growth = self.rmq.growth_stats();
        RunReport {
            rebuilds: growth.rebuilds,
            slots_dropped: growth.slots_dropped,
            marks_dropped: growth.marks_dropped,
            peak_open_marks: self.rmq.peak_open_marks(),
            peak_capacity: growth.peak_capacity,
            final_capacity: self.rmq.capacity(),
            final_len: self.rmq.len(),
            ..self.report.clone()
        }
    }

    fn answer(&self, key: Position, value: i32) -> Answer {
        Answer {
            key,
            reported_len: i64::from(self.rmq.len()) - REPORTED_LENGTH_OFFSET,
            value,
        }
    }
}

fn mark_key(raw: i32) -> Result<Position, CommandError> {
    Position::try_from(raw).map_err(|_| CommandError::NegativeKey(raw))
}

/// Decodes `bytes` and runs them under `config`.
pub fn run_bytes(bytes: &[u8], config: &RmqConfig) -> Result<(Vec<Answer>, RunReport), RunError> {
    let stream = CommandStream::decode(bytes)?;
    let mut runner = Runner::new(config);
    let answers = runner.run(&stream)?;
    let report = runner.report();
    info!(
        "{} commands, {} answers, {} rebuilds",
        report.commands(),
        answers.len(),
        report.rebuilds
    );
    Ok((answers, report))
}
