//! One self-consistent instance of stack, partition and index.

use std::collections::HashMap;

use itertools::Itertools;
use serde::Serialize;

use crate::rmq::error::{InvariantViolation, RmqError};
use crate::rmq::ids::{Position, SlotId, UfId};
use crate::rmq::index_vec::Idx;
use crate::rmq::mark_index::{Entry, MarkIndex};
use crate::rmq::stack::{MonotonicStack, StackSlot};
use crate::rmq::union_find::{UfNode, UnionFind};
use crate::rmq::value::RmqValue;

#[derive(Debug, Clone)]
pub struct Generation<T> {
    pub(crate) stack: MonotonicStack<T>,
    pub(crate) uf: UnionFind,
    pub(crate) index: MarkIndex,
    /// Values appended so far; also the key the next mark receives.
    pub(crate) len: Position,
}

/// Node of the class that the slot tagged `tag` belongs to.
fn class_of(index: &MarkIndex, tag: Position) -> UfId {
    index
        .lookup(tag)
        .unwrap_or_else(|| panic!("stack slot tagged with unknown mark {tag}"))
}

impl<T: RmqValue> Generation<T> {
    /// Generation with room for `capacity` marks.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            stack: MonotonicStack::with_capacity(capacity),
            uf: UnionFind::with_capacity(capacity),
            index: MarkIndex::with_capacity(capacity),
            len: 0,
        }
    }

    pub fn len(&self) -> Position {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.uf.capacity()
    }

    pub fn open_marks(&self) -> usize {
        self.index.len()
    }

    pub fn stack(&self) -> &MonotonicStack<T> {
        &self.stack
    }

    pub fn index(&self) -> &MarkIndex {
        &self.index
    }

    /// Whether the next mark needs a node this generation cannot provide.
    pub fn needs_growth(&self) -> bool {
        self.uf.is_full() && self.index.get(self.len) == Entry::Empty
    }

    pub fn append(&mut self, value: T) {
        self.len += 1;
        let index = &self.index;
        let uf = &mut self.uf;
        self.stack.append(value, self.len, |below, top| {
            uf.union(class_of(index, below), class_of(index, top));
        });
    }

    /// Places a mark at the current position and returns its key.
    pub fn mark(&mut self) -> Position {
        let key = self.len;
        match self.index.get(key) {
            Entry::Open { .. } => return key,
            Entry::Closed { .. } => {
                self.index.reopen(key);
                return key;
            }
            Entry::Empty => {}
        }

        let node = self.uf.make_set(self.stack.stub());
        self.index.insert(key, node);
        if self.stack.was_stub() {
            self.stack.commit_stub(key);
        } else {
            debug_assert!(!self.stack.is_bare(), "mark over a bare stack");
            let top = class_of(&self.index, self.stack.tag(self.stack.top()));
            self.uf.union(node, top);
        }
        key
    }

    /// Minimum of the values appended from position `key` onwards.
    pub fn query(&mut self, key: Position) -> Result<T, RmqError> {
        match self.index.get(key) {
            Entry::Empty | Entry::Closed { .. } => Err(RmqError::NotOpen(key)),
            Entry::Open { .. } if self.is_empty() => Err(RmqError::EmptyRange(key)),
            Entry::Open { uf, .. } => {
                let slot = self.uf.slot_of(uf);
                Ok(self.stack.value(slot))
            }
        }
    }

    /// Answers `key` one last time and retires it.
    pub fn close(&mut self, key: Position) -> Result<T, RmqError> {
        let value = self.query(key)?;
        self.index.close(key);
        Ok(value)
    }

    pub fn check_invariants(&mut self) -> Result<(), InvariantViolation> {
        if 2 * self.index.occupied() > self.index.size() {
            return Err(InvariantViolation::IndexOverflow {
                occupied: self.index.occupied(),
                size: self.index.size(),
            });
        }
        if self.uf.len() > self.uf.capacity() {
            return Err(InvariantViolation::UnionFindOverflow {
                len: self.uf.len(),
                capacity: self.uf.capacity(),
            });
        }
        let top = self.stack.top();
        if top.index() > self.stack.capacity() {
            return Err(InvariantViolation::StackOverflow {
                top,
                capacity: self.stack.capacity(),
            });
        }

        if let Some(((_, _), (slot, _))) = self
            .stack
            .live()
            .tuple_windows()
            .find(|((_, lower), (_, upper))| lower.value >= upper.value)
        {
            return Err(InvariantViolation::NotIncreasing { slot });
        }

        let live: Vec<(SlotId, Position)> = self
            .stack
            .live()
            .map(|(slot, entry)| (slot, entry.tag))
            .collect();
        let mut claimed: HashMap<UfId, SlotId> = HashMap::new();
        for (slot, tag) in live {
            let Some(node) = self.index.lookup(tag) else {
                return Err(InvariantViolation::UntaggedSlot { slot, tag });
            };
            let root = self.uf.find(node);
            let resolved = self.uf.slot_of(root);
            if resolved != slot {
                return Err(InvariantViolation::SlotMismatch { slot, resolved });
            }
            if self.index.contains(tag) {
                if let Some(&first) = claimed.get(&root) {
                    return Err(InvariantViolation::MixedClasses {
                        first,
                        second: slot,
                        root,
                    });
                }
                claimed.insert(root, slot);
            }
        }

        let open: Vec<(Position, UfId)> = self.index.open_entries().collect();
        for (key, node) in open {
            let slot = self.uf.slot_of(node);
            if slot == SlotId::SENTINEL || slot > top {
                return Err(InvariantViolation::DanglingMark { key, slot });
            }
        }
        Ok(())
    }

    pub fn snapshot(&self) -> GenerationSnapshot<T> {
        GenerationSnapshot {
            len: self.len,
            capacity: self.capacity(),
            stack: self.stack.live().map(|(_, slot)| *slot).collect(),
            stub: *self.stack.slot(self.stack.stub()),
            stub_pending: self.stack.was_stub(),
            marks: self
                .index
                .entries()
                .iter()
                .copied()
                .filter(|entry| *entry != Entry::Empty)
                .collect(),
            nodes: self.uf.nodes().iter().copied().collect(),
        }
    }
}

/// Serialisable picture of a generation, for dumps and trace logs.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationSnapshot<T> {
    pub len: Position,
    pub capacity: usize,
    /// Committed slots above the sentinel.
    pub stack: Vec<StackSlot<T>>,
    pub stub: StackSlot<T>,
    pub stub_pending: bool,
    pub marks: Vec<Entry>,
    pub nodes: Vec<UfNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generation() -> Generation<i32> {
        Generation::with_capacity(8)
    }

    #[test]
    fn mark_commits_the_pending_stub() {
        let mut g = generation();
        g.append(5);
        g.append(3);
        assert_eq!(g.mark(), 2);
        assert_eq!(g.stack.top(), SlotId::new(1));
        assert_eq!(g.stack.value(SlotId::new(1)), 3);
        assert!(!g.stack.was_stub());
        g.check_invariants().unwrap();
    }

    #[test]
    fn reference_scenario() {
        let mut g = generation();
        g.append(5);
        g.append(3);
        let key = g.mark();
        g.append(4);
        g.append(1);
        assert_eq!(g.query(key), Ok(1));
        assert_eq!(g.len(), 4);
        g.check_invariants().unwrap();
    }

    #[test]
    fn mark_after_contraction_joins_top_class() {
        let mut g = generation();
        g.append(5);
        let first = g.mark();
        g.append(3);
        let second = g.mark();
        assert_eq!(g.uf.find(UfId::new(0)), g.uf.find(UfId::new(1)));
        assert_eq!(g.query(first), Ok(3));
        assert_eq!(g.query(second), Ok(3));
        g.append(7);
        assert_eq!(g.query(second), Ok(3));
        g.check_invariants().unwrap();
    }

    #[test]
    fn contraction_merges_classes() {
        let mut g = generation();
        let mut keys = Vec::new();
        for v in [2, 6, 8] {
            g.append(v);
            keys.push(g.mark());
        }
        g.append(4);
        assert_eq!(g.query(keys[0]), Ok(2));
        assert_eq!(g.query(keys[1]), Ok(4));
        assert_eq!(g.query(keys[2]), Ok(4));
        assert_eq!(g.stack.top(), SlotId::new(2));
        g.check_invariants().unwrap();
    }

    #[test]
    fn repeated_mark_reuses_the_entry() {
        let mut g = generation();
        g.append(1);
        let key = g.mark();
        assert_eq!(g.mark(), key);
        assert_eq!(g.uf.len(), 1);

        g.close(key).unwrap();
        assert_eq!(g.mark(), key);
        assert_eq!(g.uf.len(), 1);
        assert_eq!(g.query(key), Ok(1));
        g.check_invariants().unwrap();
    }

    #[test]
    fn mark_before_first_value() {
        let mut g = generation();
        let key = g.mark();
        assert_eq!(key, 0);
        assert_eq!(g.query(key), Err(RmqError::EmptyRange(0)));
        g.append(5);
        g.append(3);
        g.append(7);
        assert_eq!(g.query(key), Ok(3));
        g.check_invariants().unwrap();
    }

    #[test]
    fn closed_and_unknown_marks_are_rejected() {
        let mut g = generation();
        g.append(1);
        let key = g.mark();
        assert_eq!(g.close(key), Ok(1));
        assert_eq!(g.query(key), Err(RmqError::NotOpen(key)));
        assert_eq!(g.close(key), Err(RmqError::NotOpen(key)));
        assert_eq!(g.query(42), Err(RmqError::NotOpen(42)));
    }

    #[test]
    fn needs_growth_only_for_new_keys() {
        let mut g: Generation<i32> = Generation::with_capacity(1);
        g.append(1);
        assert!(!g.needs_growth());
        g.mark();
        assert!(!g.needs_growth());
        g.append(2);
        assert!(g.needs_growth());
    }

    #[test]
    fn invariant_check_detects_broken_stack() {
        let mut g = generation();
        g.append(1);
        g.mark();
        g.append(2);
        g.mark();
        g.stack.push_stub(0, 0);
        g.stack.commit_stub(0);
        assert!(matches!(
            g.check_invariants(),
            Err(InvariantViolation::NotIncreasing { .. })
        ));
    }

    #[test]
    fn snapshot_serialises() {
        let mut g = generation();
        g.append(4);
        g.mark();
        g.append(9);
        let snapshot = g.snapshot();
        assert_eq!(snapshot.stack.len(), 1);
        assert_eq!(snapshot.stub, StackSlot { value: 9, tag: 2 });
        assert!(snapshot.stub_pending);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"stub_pending\":true"));
    }
}
