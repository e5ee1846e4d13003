//! Union-find over marks, carrying the stack slot of each class's minimum.
//!
//! Union by rank with full path compression. Every root stores the lowest
//! stack slot claimed by any member of its class, so `find` doubles as "where
//! is the current minimum for this mark".

use serde::Serialize;
use smallvec::SmallVec;

use crate::rmq::ids::{SlotId, UfId};
use crate::rmq::index_vec::IndexVec;

/// Longest parent chain `find` can meet.
///
/// Union by rank keeps a tree of rank `r` at `2^r` nodes or more, and node
/// handles are `u32`, so no chain exceeds 32 links. The path buffer lives on
/// the stack up to this bound.
pub const MAX_FIND_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Link {
    Root { rank: u8 },
    Parent(UfId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UfNode {
    pub link: Link,
    /// Only meaningful at roots.
    pub slot: SlotId,
}

#[derive(Debug, Clone)]
pub struct UnionFind {
    nodes: IndexVec<UfId, UfNode>,
}

impl UnionFind {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: IndexVec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Exhaustion is what triggers a generation rebuild.
    pub fn is_full(&self) -> bool {
        self.nodes.is_full()
    }

    pub fn nodes(&self) -> &IndexVec<UfId, UfNode> {
        &self.nodes
    }

    /// New singleton class whose minimum lives at `slot`.
    pub fn make_set(&mut self, slot: SlotId) -> UfId {
        self.nodes.push(UfNode {
            link: Link::Root { rank: 0 },
            slot,
        })
    }

    pub fn find(&mut self, id: UfId) -> UfId {
        let mut path: SmallVec<[UfId; MAX_FIND_DEPTH]> = SmallVec::new();
        let mut root = id;
        while let Link::Parent(parent) = self.nodes[root].link {
            path.push(root);
            root = parent;
        }
        debug_assert!(
            path.len() <= MAX_FIND_DEPTH,
            "find path of {} links exceeds the rank bound",
            path.len()
        );
        for node in path {
            self.nodes[node].link = Link::Parent(root);
        }
        root
    }

    /// Stack slot holding the minimum of `id`'s class.
    pub fn slot_of(&mut self, id: UfId) -> SlotId {
        let root = self.find(id);
        self.nodes[root].slot
    }

    /// Joins the classes of `p` and `q`, returning the surviving root.
    pub fn union(&mut self, p: UfId, q: UfId) -> UfId {
        let rp = self.find(p);
        let rq = self.find(q);
        if rp == rq {
            return rp;
        }

        let rank_p = self.rank(rp);
        let rank_q = self.rank(rq);
        let (root, child) = if rank_p > rank_q { (rp, rq) } else { (rq, rp) };
        if rank_p == rank_q {
            self.nodes[root].link = Link::Root { rank: rank_q + 1 };
        }
        self.nodes[child].link = Link::Parent(root);

        let slot = self.nodes[rp].slot.min(self.nodes[rq].slot);
        self.nodes[root].slot = slot;
        root
    }

    fn rank(&self, root: UfId) -> u8 {
        match self.nodes[root].link {
            Link::Root { rank } => rank,
            Link::Parent(_) => unreachable!("rank of non-root {root:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singletons_resolve_to_their_slot() {
        let mut uf = UnionFind::with_capacity(3);
        let a = uf.make_set(SlotId::new(4));
        let b = uf.make_set(SlotId::new(2));
        assert_ne!(uf.find(a), uf.find(b));
        assert_eq!(uf.slot_of(a), SlotId::new(4));
        assert_eq!(uf.slot_of(b), SlotId::new(2));
    }

    #[test]
    fn union_keeps_the_lower_slot() {
        let mut uf = UnionFind::with_capacity(3);
        let a = uf.make_set(SlotId::new(4));
        let b = uf.make_set(SlotId::new(2));
        let c = uf.make_set(SlotId::new(7));
        uf.union(a, b);
        uf.union(c, a);
        assert_eq!(uf.find(a), uf.find(c));
        assert_eq!(uf.slot_of(c), SlotId::new(2));
    }

    #[test]
    fn equal_ranks_grow_the_survivor() {
        let mut uf = UnionFind::with_capacity(2);
        let a = uf.make_set(SlotId::new(1));
        let b = uf.make_set(SlotId::new(1));
        let root = uf.union(a, b);
        assert_eq!(uf.nodes()[root].link, Link::Root { rank: 1 });
        assert_eq!(uf.union(a, b), root);
    }

    #[test]
    fn find_compresses_paths() {
        let mut uf = UnionFind::with_capacity(8);
        let ids: Vec<UfId> = (0..8).map(|i| uf.make_set(SlotId::new(i + 1))).collect();
        for pair in ids.chunks(2) {
            uf.union(pair[0], pair[1]);
        }
        uf.union(ids[0], ids[2]);
        uf.union(ids[4], ids[6]);
        uf.union(ids[0], ids[4]);

        let root = uf.find(ids[1]);
        assert_eq!(uf.nodes()[ids[1]].link, Link::Parent(root));
        assert_eq!(uf.slot_of(ids[7]), SlotId::new(1));
    }

    #[test]
    fn full_when_capacity_reached() {
        let mut uf = UnionFind::with_capacity(1);
        assert!(!uf.is_full());
        uf.make_set(SlotId::new(1));
        assert!(uf.is_full());
    }
}
