//! 类型化句柄：栈槽位与并查集节点的强类型下标。
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rmq::index_vec::Idx;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(pub u32);

        impl $name {
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, stringify!($name))?;
                f.debug_tuple("").field(&self.0).finish()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Idx for $name {
            fn index(self) -> usize {
                self.0 as usize
            }

            fn from_usize(idx: usize) -> Self {
                debug_assert!(idx <= u32::MAX as usize, "handle {idx} does not fit in u32");
                Self(idx as u32)
            }
        }
    };
}

define_id!(
    /// Position of a slot in the monotonic stack. Slot 0 is the sentinel.
    SlotId
);
define_id!(
    /// Node of the union-find partition over marks.
    UfId
);

impl SlotId {
    pub const SENTINEL: SlotId = SlotId(0);

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn prev(self) -> Self {
        debug_assert!(self.0 > 0, "sentinel has no predecessor");
        Self(self.0 - 1)
    }
}

/// External identity of a mark: the sequence position it was placed at.
pub type Position = u32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_and_display_formats() {
        let slot = SlotId::new(7);
        assert_eq!(format!("{slot:?}"), "SlotId(7)");
        assert_eq!(format!("{slot}"), "7");
        assert_eq!(UfId::from_usize(3).index(), 3);
    }

    #[test]
    fn slot_neighbours() {
        let slot = SlotId::new(2);
        assert_eq!(slot.next(), SlotId::new(3));
        assert_eq!(slot.prev(), SlotId::new(1));
        assert!(SlotId::SENTINEL < slot);
    }
}
