use std::mem;

use log::debug;

use crate::rmq::error::RmqError;
use crate::rmq::generation::{Generation, GenerationSnapshot};
use crate::rmq::growth::{GrowthManager, GrowthStats};
use crate::rmq::ids::Position;
use crate::rmq::value::RmqValue;

/// Union-find capacity of the first generation unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 4;

/// Range-minimum queries over a growing sequence.
///
/// Values are appended one at a time; `mark` hands out a key naming the
/// current position, and `query(key)` returns the minimum of every value
/// appended from that position on, the value at the position itself included.
/// All four operations run in amortized constant time. Generation rebuilds
/// happen inside `mark` and are invisible to callers.
#[derive(Debug, Clone)]
pub struct FastRmq<T = i32> {
    generation: Generation<T>,
    growth: GrowthManager,
    check_invariants: bool,
    peak_open: usize,
}

impl<T: RmqValue> Default for FastRmq<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RmqValue> FastRmq<T> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Starts with room for `capacity` marks before the first rebuild.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut growth = GrowthManager::new();
        growth.note_capacity(capacity);
        Self {
            generation: Generation::with_capacity(capacity),
            growth,
            check_invariants: false,
            peak_open: 0,
        }
    }

    /// Verify every invariant after each operation and panic on the first
    /// violation.
    pub fn with_invariant_checks(mut self, enabled: bool) -> Self {
        self.check_invariants = enabled;
        self
    }

    /// Number of values appended so far.
    pub fn len(&self) -> Position {
        self.generation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generation.is_empty()
    }

    pub fn open_marks(&self) -> usize {
        self.generation.open_marks()
    }

    pub fn peak_open_marks(&self) -> usize {
        self.peak_open
    }

    /// Marks the current generation can hold before it is rebuilt.
    pub fn capacity(&self) -> usize {
        self.generation.capacity()
    }

    pub fn growth_stats(&self) -> GrowthStats {
        self.growth.stats()
    }

    pub fn generation(&self) -> &Generation<T> {
        &self.generation
    }

    pub fn snapshot(&self) -> GenerationSnapshot<T> {
        self.generation.snapshot()
    }

    pub fn append(&mut self, value: T) {
        self.generation.append(value);
        self.verify();
    }

    /// Places a mark after the latest value and returns its key, which is the
    /// number of values appended so far.
    pub fn mark(&mut self) -> Position {
        if self.generation.needs_growth() {
            self.grow();
        }
        let key = self.generation.mark();
        self.peak_open = self.peak_open.max(self.generation.open_marks());
        self.verify();
        key
    }

    /// Minimum since `key`. Path compression aside, nothing observable
    /// changes.
    pub fn query(&mut self, key: Position) -> Result<T, RmqError> {
        self.generation.query(key)
    }

    /// Answers `key` a final time and retires it.
    pub fn close(&mut self, key: Position) -> Result<T, RmqError> {
        let value = self.generation.close(key)?;
        self.verify();
        Ok(value)
    }

    fn grow(&mut self) {
        debug!(
            "union-find exhausted at {} nodes with {} open marks",
            self.generation.capacity(),
            self.generation.open_marks()
        );
        let old = mem::replace(&mut self.generation, Generation::with_capacity(0));
        self.generation = self.growth.rebuild(old);
        self.verify();
    }

    fn verify(&mut self) {
        if !self.check_invariants {
            return;
        }
        if let Err(violation) = self.generation.check_invariants() {
            panic!("internal invariant violated: {violation}");
        }
    }
}
