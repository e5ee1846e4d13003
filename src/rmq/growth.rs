//! Generational rebuild.
//!
//! When the union-find arena of a generation is exhausted, a successor is
//! built from the open marks alone, sized by the current number of open marks
//! rather than by the historical peak. The old generation is consumed.
//!
//! The migration runs in four passes:
//! 1. flag every stack slot an open mark resolves to;
//! 2. copy the flagged slots, in order, into the new stack and record where
//!    each one went;
//! 3. give every open mark a fresh node in the new partition, pointing at the
//!    forwarded slot, and retag that slot with the mark's key;
//! 4. join each fresh node with the owner of its slot's tag. Marks sharing a
//!    slot shared a class before, so this rebuilds the old partition exactly.

use log::{Level, debug, log_enabled, trace};
use serde::Serialize;

use crate::rmq::generation::Generation;
use crate::rmq::ids::{SlotId, UfId};
use crate::rmq::index_vec::Idx;
use crate::rmq::mark_index::prime_at_least;
use crate::rmq::value::RmqValue;

/// Smallest union-find capacity a rebuilt generation gets.
pub const MIN_CAPACITY: usize = 2;

/// Union-find capacity of a generation rebuilt around `open` marks.
///
/// Always leaves room for at least one more mark than `open`, which the
/// rebuild trigger relies on.
pub fn target_capacity(open: usize) -> usize {
    prime_at_least((2 * open).max(MIN_CAPACITY))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GrowthStats {
    pub rebuilds: usize,
    /// Committed slots left behind because no open mark resolved to them.
    pub slots_dropped: usize,
    /// Closed marks whose tombstones were discarded.
    pub marks_dropped: usize,
    pub peak_capacity: usize,
}

#[derive(Debug, Clone, Default)]
pub struct GrowthManager {
    stats: GrowthStats,
}

impl GrowthManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> GrowthStats {
        self.stats
    }

    pub(crate) fn note_capacity(&mut self, capacity: usize) {
        self.stats.peak_capacity = self.stats.peak_capacity.max(capacity);
    }

    /// Replaces `old` by a compacted successor answering every open mark
    /// exactly as `old` did.
    pub fn rebuild<T: RmqValue>(&mut self, old: Generation<T>) -> Generation<T> {
        if log_enabled!(Level::Trace) {
            trace!("retiring generation: {:?}", old.snapshot());
        }

        let Generation {
            stack,
            mut uf,
            index,
            len,
        } = old;
        let open = index.len();
        let capacity = target_capacity(open);
        let mut next = Generation::with_capacity(capacity);
        next.len = len;

        let top = stack.top();
        let mut referenced = vec![false; top.index() + 1];
        for (_, node) in index.open_entries() {
            referenced[uf.slot_of(node).index()] = true;
        }

        let mut forward: Vec<Option<SlotId>> = vec![None; top.index() + 1];
        for (slot, entry) in stack.live() {
            if referenced[slot.index()] {
                forward[slot.index()] = Some(next.stack.push_migrated(*entry));
            }
        }
        let kept = next.stack.top().index();

        // With no reservation pending, the top slot holds the latest value. If
        // it is about to vanish, keep that value as the reservation so the
        // next mark still starts from it.
        if !stack.was_stub() && !stack.is_bare() && !referenced[top.index()] {
            next.stack.carry_stub(*stack.slot(top), true);
        } else {
            next.stack.carry_stub(*stack.slot(stack.stub()), stack.was_stub());
        }

        let mut created: Vec<(UfId, SlotId)> = Vec::with_capacity(open);
        for (key, node) in index.open_entries() {
            let old_slot = uf.slot_of(node);
            let Some(slot) = forward[old_slot.index()] else {
                panic!("open mark {key} resolves to unflagged slot {old_slot:?}");
            };
            let fresh = next.uf.make_set(slot);
            next.index.insert(key, fresh);
            next.stack.set_tag(slot, key);
            created.push((fresh, slot));
        }

        for (fresh, slot) in created {
            let owner = next
                .index
                .lookup(next.stack.tag(slot))
                .unwrap_or_else(|| panic!("forwarded slot {slot:?} lost its tag"));
            next.uf.union(fresh, owner);
        }

        self.stats.rebuilds += 1;
        self.stats.slots_dropped += top.index() - kept;
        self.stats.marks_dropped += index.occupied() - open;
        self.note_capacity(capacity);
        debug!(
            "rebuild #{}: capacity {} -> {}, {} open marks, stack {} -> {} slots",
            self.stats.rebuilds,
            uf.capacity(),
            capacity,
            open,
            top.index(),
            kept
        );
        if log_enabled!(Level::Trace) {
            trace!("new generation: {:?}", next.snapshot());
        }
        next
    }
}
