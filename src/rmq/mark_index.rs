//! Open-addressing index from mark keys to union-find nodes.
//!
//! Linear probing over a prime-sized table kept at most half full. Closing a
//! mark turns its entry into a tombstone that still remembers the node: the
//! probe chains of other keys stay intact, and the stack slots tagged with a
//! closed key can still be resolved to their class until the next rebuild
//! drops the tombstone.

use serde::Serialize;

use crate::rmq::ids::{Position, UfId};

/// Table sizes, each roughly double the previous one.
pub const PRIMES: [usize; 32] = [
    3, 5, 7, 11, 17, 29, 53, 97, 193, 389, 769, 1543, 3079, 6151, 12289, 24593, 49157, 98317,
    196613, 393241, 786433, 1572869, 3145739, 6291469, 12582917, 25165843, 50331653, 100663319,
    201326611, 402653189, 805306457, 1610612741,
];

/// Smallest table prime that is at least `n`.
pub fn prime_at_least(n: usize) -> usize {
    match PRIMES.iter().copied().find(|&p| p >= n) {
        Some(p) => p,
        None => panic!("no table size for {n} entries"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Entry {
    Empty,
    Open { key: Position, uf: UfId },
    Closed { key: Position, uf: UfId },
}

impl Entry {
    fn key(self) -> Option<Position> {
        match self {
            Entry::Empty => None,
            Entry::Open { key, .. } | Entry::Closed { key, .. } => Some(key),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MarkIndex {
    table: Vec<Entry>,
    occupied: usize,
    open: usize,
}

impl MarkIndex {
    /// Index able to hold `capacity` keys with a load factor of at most 1/2.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: vec![Entry::Empty; prime_at_least(2 * capacity)],
            occupied: 0,
            open: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.table.len()
    }

    /// Number of open marks.
    pub fn len(&self) -> usize {
        self.open
    }

    pub fn is_empty(&self) -> bool {
        self.open == 0
    }

    /// Entries in use, tombstones included.
    pub fn occupied(&self) -> usize {
        self.occupied
    }

    pub fn entries(&self) -> &[Entry] {
        &self.table
    }

    /// Open `(key, node)` pairs in table order.
    pub fn open_entries(&self) -> impl Iterator<Item = (Position, UfId)> + '_ {
        self.table.iter().filter_map(|entry| match *entry {
            Entry::Open { key, uf } => Some((key, uf)),
            _ => None,
        })
    }

    fn hash(&self, key: Position) -> usize {
        let m = self.table.len() as u64;
        let mut r: u64 = 0;
        let mut a: u64 = 31415;
        const B: u64 = 27183;
        for byte in key.to_le_bytes() {
            r = (a * r + u64::from(byte)) % m;
            a = (a * B) % m;
        }
        r as usize
    }

    fn probe(&self, key: Position) -> usize {
        let mut i = self.hash(key);
        loop {
            match self.table[i].key() {
                None => return i,
                Some(k) if k == key => return i,
                Some(_) => i = (i + 1) % self.table.len(),
            }
        }
    }

    pub fn get(&self, key: Position) -> Entry {
        self.table[self.probe(key)]
    }

    /// Binds `key` to `uf`. The key must not be open already.
    pub fn insert(&mut self, key: Position, uf: UfId) {
        let i = self.probe(key);
        match self.table[i] {
            Entry::Empty => self.occupied += 1,
            Entry::Closed { .. } => {}
            Entry::Open { .. } => panic!("mark {key} inserted twice"),
        }
        self.table[i] = Entry::Open { key, uf };
        self.open += 1;
        assert!(
            2 * self.occupied <= self.table.len(),
            "mark index overflow: {} entries in {} buckets",
            self.occupied,
            self.table.len()
        );
    }

    /// Node bound to `key`, whether the mark is open or closed.
    pub fn lookup(&self, key: Position) -> Option<UfId> {
        match self.get(key) {
            Entry::Empty => None,
            Entry::Open { uf, .. } | Entry::Closed { uf, .. } => Some(uf),
        }
    }

    /// Whether `key` is an open mark.
    pub fn contains(&self, key: Position) -> bool {
        matches!(self.get(key), Entry::Open { .. })
    }

    /// Turns an open entry into a tombstone. Returns its node, or `None` when
    /// `key` was not open.
    pub fn close(&mut self, key: Position) -> Option<UfId> {
        let i = self.probe(key);
        match self.table[i] {
            Entry::Open { key, uf } => {
                self.table[i] = Entry::Closed { key, uf };
                self.open -= 1;
                Some(uf)
            }
            _ => None,
        }
    }

    /// Revives a tombstone. Returns its node, or `None` when `key` was not
    /// closed.
    pub fn reopen(&mut self, key: Position) -> Option<UfId> {
        let i = self.probe(key);
        match self.table[i] {
            Entry::Closed { key, uf } => {
                self.table[i] = Entry::Open { key, uf };
                self.open += 1;
                Some(uf)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_size_is_prime_at_least_twice_capacity() {
        assert_eq!(prime_at_least(0), 3);
        assert_eq!(prime_at_least(8), 11);
        assert_eq!(prime_at_least(11), 11);
        assert_eq!(MarkIndex::with_capacity(4).size(), 11);
        assert_eq!(MarkIndex::with_capacity(100).size(), 389);
    }

    #[test]
    #[should_panic(expected = "no table size")]
    fn oversized_request_is_fatal() {
        prime_at_least(usize::MAX);
    }

    #[test]
    fn insert_lookup_contains() {
        let mut index = MarkIndex::with_capacity(4);
        index.insert(2, UfId::new(0));
        index.insert(9, UfId::new(1));
        assert_eq!(index.lookup(2), Some(UfId::new(0)));
        assert_eq!(index.lookup(9), Some(UfId::new(1)));
        assert_eq!(index.lookup(3), None);
        assert!(index.contains(9));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn close_keeps_the_node_reachable() {
        let mut index = MarkIndex::with_capacity(4);
        index.insert(5, UfId::new(3));
        assert_eq!(index.close(5), Some(UfId::new(3)));
        assert!(!index.contains(5));
        assert_eq!(index.lookup(5), Some(UfId::new(3)));
        assert_eq!(index.close(5), None);
        assert_eq!(index.len(), 0);
        assert_eq!(index.occupied(), 1);

        assert_eq!(index.reopen(5), Some(UfId::new(3)));
        assert!(index.contains(5));
    }

    #[test]
    fn tombstones_do_not_break_probe_chains() {
        // A second key sharing the home bucket of key 1.
        let mut index = MarkIndex::with_capacity(2);
        assert_eq!(index.size(), 5);
        index.insert(1, UfId::new(0));
        let chained = (2..100)
            .find(|&k| index.hash(k) == index.hash(1))
            .expect("a colliding key");
        index.insert(chained, UfId::new(1));
        index.close(1);
        assert_eq!(index.lookup(chained), Some(UfId::new(1)));
        assert!(index.contains(chained));
    }

    #[test]
    #[should_panic(expected = "inserted twice")]
    fn duplicate_open_key_is_fatal() {
        let mut index = MarkIndex::with_capacity(4);
        index.insert(1, UfId::new(0));
        index.insert(1, UfId::new(1));
    }

    #[test]
    fn open_entries_skip_tombstones() {
        let mut index = MarkIndex::with_capacity(8);
        for key in 1..=4 {
            index.insert(key, UfId::new(key));
        }
        index.close(2);
        let mut open: Vec<Position> = index.open_entries().map(|(key, _)| key).collect();
        open.sort_unstable();
        assert_eq!(open, vec![1, 3, 4]);
    }
}
