use thiserror::Error;

use crate::rmq::ids::{Position, SlotId, UfId};

/// Rejected query or close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RmqError {
    /// Never placed, or closed. The two are not told apart: closed marks are
    /// forgotten by the next rebuild.
    #[error("mark {0} is not open")]
    NotOpen(Position),
    #[error("mark {0} covers no values yet")]
    EmptyRange(Position),
}

/// Broken internal consistency of a generation. Always a logic fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("mark index overflow: {occupied} entries in {size} buckets")]
    IndexOverflow { occupied: usize, size: usize },
    #[error("union-find overflow: {len} nodes for capacity {capacity}")]
    UnionFindOverflow { len: usize, capacity: usize },
    #[error("stack overflow: top {top:?} beyond capacity {capacity}")]
    StackOverflow { top: SlotId, capacity: usize },
    #[error("stack not strictly increasing at {slot:?}")]
    NotIncreasing { slot: SlotId },
    #[error("slot {slot:?} tagged with unknown mark {tag}")]
    UntaggedSlot { slot: SlotId, tag: Position },
    #[error("slot {slot:?} belongs to a class resolving to {resolved:?}")]
    SlotMismatch { slot: SlotId, resolved: SlotId },
    #[error("slots {first:?} and {second:?} share class {root:?}")]
    MixedClasses {
        first: SlotId,
        second: SlotId,
        root: UfId,
    },
    #[error("open mark {key} resolves to {slot:?} outside the live stack")]
    DanglingMark { key: Position, slot: SlotId },
}
