use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::command::Command;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub values: usize,
    pub marks: usize,
    pub queries: usize,
    pub closes: usize,
    /// Queries and closes dropped under the skip policy.
    pub skipped: usize,
    pub rebuilds: usize,
    pub slots_dropped: usize,
    pub marks_dropped: usize,
    pub peak_open_marks: usize,
    pub peak_capacity: usize,
    pub final_capacity: usize,
    pub final_len: u32,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn count(&mut self, command: Command) {
        match command {
            Command::Value(_) => self.values += 1,
            Command::Mark => self.marks += 1,
            Command::Query(_) => self.queries += 1,
            Command::Close(_) => self.closes += 1,
        }
    }

    pub fn commands(&self) -> usize {
        self.values + self.marks + self.queries + self.closes
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run report")?;
        writeln!(
            f,
            "commands: {} (values {}, marks {}, queries {}, closes {})",
            self.commands(),
            self.values,
            self.marks,
            self.queries,
            self.closes
        )?;
        if self.skipped > 0 {
            writeln!(f, "skipped: {}", self.skipped)?;
        }
        writeln!(
            f,
            "rebuilds: {} (slots dropped {}, closed marks dropped {})",
            self.rebuilds, self.slots_dropped, self.marks_dropped
        )?;
        writeln!(
            f,
            "peak open marks: {}, peak capacity: {}, final capacity: {}",
            self.peak_open_marks, self.peak_capacity, self.final_capacity
        )?;
        writeln!(f, "sequence length: {}", self.final_len)?;
        write!(f, "elapsed: {:?}", self.elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_opcode() {
        let mut report = RunReport::default();
        for command in [
            Command::Value(1),
            Command::Value(2),
            Command::Mark,
            Command::Query(2),
            Command::Close(2),
        ] {
            report.count(command);
        }
        assert_eq!(report.commands(), 5);
        assert_eq!(report.values, 2);
        let rendered = report.to_string();
        assert!(rendered.contains("commands: 5 (values 2, marks 1, queries 1, closes 1)"));
        assert!(!rendered.contains("skipped"));
    }
}
