#![allow(dead_code)]

use std::collections::HashMap;

use fast_rmq::command::Command;
use fast_rmq::rmq::{Position, RmqError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Linear-scan model of the structure.
#[derive(Debug, Default)]
pub struct Oracle {
    values: Vec<i32>,
    /// Mark key to whether it is still open.
    marks: HashMap<Position, bool>,
}

impl Oracle {
    pub fn len(&self) -> Position {
        self.values.len() as Position
    }

    pub fn append(&mut self, value: i32) {
        self.values.push(value);
    }

    pub fn mark(&mut self) -> Position {
        let key = self.len();
        self.marks.insert(key, true);
        key
    }

    pub fn open_keys(&self) -> Vec<Position> {
        let mut keys: Vec<Position> = self
            .marks
            .iter()
            .filter(|(_, open)| **open)
            .map(|(key, _)| *key)
            .collect();
        keys.sort_unstable();
        keys
    }

    pub fn query(&self, key: Position) -> Result<i32, RmqError> {
        match self.marks.get(&key) {
            None | Some(false) => Err(RmqError::NotOpen(key)),
            Some(true) if self.values.is_empty() => Err(RmqError::EmptyRange(key)),
            Some(true) => {
                let from = (key as usize).saturating_sub(1);
                Ok(*self.values[from..].iter().min().unwrap())
            }
        }
    }

    pub fn close(&mut self, key: Position) -> Result<i32, RmqError> {
        let value = self.query(key)?;
        self.marks.insert(key, false);
        Ok(value)
    }
}

/// Random valid command sequence: every query and close names an open mark
/// with at least one value behind it.
pub fn random_commands(seed: u64, len: usize, value_range: i32) -> Vec<Command> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut oracle = Oracle::default();
    let mut commands = Vec::with_capacity(len);
    while commands.len() < len {
        let open = oracle.open_keys();
        let roll = rng.random_range(0..100);
        let command = if roll < 45 {
            Command::Value(rng.random_range(-value_range..=value_range))
        } else if roll < 70 || open.is_empty() || oracle.len() == 0 {
            Command::Mark
        } else {
            let key = open[rng.random_range(0..open.len())];
            if rng.random_bool(0.6) {
                Command::Query(key as i32)
            } else {
                Command::Close(key as i32)
            }
        };
        apply(&mut oracle, command);
        commands.push(command);
    }
    commands
}

/// Runs `command` against the oracle and returns its output, if any.
pub fn apply(oracle: &mut Oracle, command: Command) -> Option<Result<i32, RmqError>> {
    match command {
        Command::Value(v) => {
            oracle.append(v);
            None
        }
        Command::Mark => {
            oracle.mark();
            None
        }
        Command::Query(key) => Some(oracle.query(key as Position)),
        Command::Close(key) => Some(oracle.close(key as Position)),
    }
}
