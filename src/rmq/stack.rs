//! Monotonic stack of suffix-minimum candidates.
//!
//! Slot 0 holds the sentinel `T::MIN`. Slots `1..=top` are committed and
//! strictly increasing in value. Slot `top + 1` is the stub: it holds the
//! latest appended value while nothing forces it onto the stack, and is only
//! committed when a mark needs a slot of its own.

use serde::Serialize;

use crate::rmq::ids::{Position, SlotId};
use crate::rmq::index_vec::{Idx, IndexVec};
use crate::rmq::value::RmqValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StackSlot<T> {
    pub value: T,
    /// Key of a mark whose class resolves to this slot.
    pub tag: Position,
}

#[derive(Debug, Clone)]
pub struct MonotonicStack<T> {
    slots: IndexVec<SlotId, StackSlot<T>>,
    top: SlotId,
    stub_pending: bool,
}

impl<T: RmqValue> MonotonicStack<T> {
    /// Stack able to commit `capacity` slots above the sentinel.
    ///
    /// The stub starts out reserved with `T::MAX`, so a mark taken before the
    /// first append gets a slot that the first append contracts into.
    pub fn with_capacity(capacity: usize) -> Self {
        let filler = StackSlot {
            value: T::MAX,
            tag: 0,
        };
        let mut slots = IndexVec::from_elem(filler, capacity + 2);
        slots[SlotId::SENTINEL] = StackSlot {
            value: T::MIN,
            tag: 0,
        };
        Self {
            slots,
            top: SlotId::SENTINEL,
            stub_pending: true,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len() - 2
    }

    pub fn top(&self) -> SlotId {
        self.top
    }

    pub fn second_from_top(&self) -> SlotId {
        self.top.prev()
    }

    pub fn stub(&self) -> SlotId {
        self.top.next()
    }

    pub fn is_bare(&self) -> bool {
        self.top == SlotId::SENTINEL
    }

    /// Whether the last stack operation left a reservation in the stub.
    pub fn was_stub(&self) -> bool {
        self.stub_pending
    }

    pub fn slot(&self, slot: SlotId) -> &StackSlot<T> {
        &self.slots[slot]
    }

    pub fn value(&self, slot: SlotId) -> T {
        self.slots[slot].value
    }

    pub fn tag(&self, slot: SlotId) -> Position {
        self.slots[slot].tag
    }

    pub fn set_tag(&mut self, slot: SlotId, tag: Position) {
        self.slots[slot].tag = tag;
    }

    /// Committed slots above the sentinel, bottom to top.
    pub fn live(&self) -> impl Iterator<Item = (SlotId, &StackSlot<T>)> {
        self.slots
            .iter_enumerated()
            .skip(1)
            .take(self.top.index())
    }

    /// Writes `value` into the stub without committing it.
    pub fn push_stub(&mut self, value: T, tag: Position) {
        let stub = self.stub();
        self.slots[stub] = StackSlot { value, tag };
        self.stub_pending = true;
    }

    /// Promotes the stub to a committed slot and returns it.
    pub fn commit_stub(&mut self, tag: Position) -> SlotId {
        assert!(
            self.top.index() < self.capacity(),
            "stack overflow: {} committed slots",
            self.top.index()
        );
        self.top = self.top.next();
        self.slots[self.top].tag = tag;
        self.stub_pending = false;
        self.top
    }

    pub fn pop(&mut self) {
        debug_assert!(self.top > SlotId::new(1), "popping into the sentinel");
        self.top = self.top.prev();
        self.stub_pending = false;
    }

    /// Feeds one value through the stack.
    ///
    /// A value above the top only refreshes the stub. Otherwise every
    /// committed slot at or above `value` collapses into the one below it:
    /// `merge(below_tag, top_tag)` is called before each pop so the caller can
    /// join the two mark classes, and the surviving top takes `value`.
    pub fn append<F>(&mut self, value: T, position: Position, mut merge: F)
    where
        F: FnMut(Position, Position),
    {
        if self.is_bare() || self.value(self.top) < value {
            self.push_stub(value, position);
            return;
        }

        let top_tag = self.tag(self.top);
        while self.top > SlotId::new(1) && self.value(self.second_from_top()) >= value {
            merge(self.tag(self.second_from_top()), top_tag);
            self.pop();
        }
        let top = self.top;
        self.slots[top].value = value;
        self.stub_pending = false;
    }

    /// Appends a slot carried over from a previous generation.
    pub(crate) fn push_migrated(&mut self, slot: StackSlot<T>) -> SlotId {
        let id = self.commit_stub(slot.tag);
        self.slots[id].value = slot.value;
        id
    }

    /// Installs the stub carried over from a previous generation.
    pub(crate) fn carry_stub(&mut self, slot: StackSlot<T>, pending: bool) {
        let stub = self.stub();
        self.slots[stub] = slot;
        self.stub_pending = pending;
    }
}
