//! 定长竞技场：以强类型句柄寻址、容量在创建时固定的顺序容器。
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use serde::{Serialize, Serializer};

/// Trait implemented by handle types that can address an [`IndexVec`].
pub trait Idx: Copy + Eq + PartialEq + Ord + fmt::Debug {
    fn index(self) -> usize;
    fn from_usize(idx: usize) -> Self;
}

/// A vector addressed by strongly typed handles whose capacity never grows.
///
/// Running out of room is a logic fault of the owner: every structure of a
/// generation is sized up front, and exhaustion is detected by the owner
/// through [`IndexVec::is_full`] before it pushes.
#[derive(Clone, PartialEq, Eq)]
pub struct IndexVec<I, T> {
    data: Vec<T>,
    capacity: usize,
    _marker: PhantomData<I>,
}

impl<I, T> IndexVec<I, T>
where
    I: Idx,
{
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
            _marker: PhantomData,
        }
    }

    /// Arena of `len` copies of `elem`, already full.
    pub fn from_elem(elem: T, len: usize) -> Self
    where
        T: Clone,
    {
        Self {
            data: vec![elem; len],
            capacity: len,
            _marker: PhantomData,
        }
    }

    pub fn push(&mut self, value: T) -> I {
        assert!(
            self.data.len() < self.capacity,
            "arena overflow: capacity {} exhausted",
            self.capacity
        );
        let idx = self.data.len();
        self.data.push(value);
        I::from_usize(idx)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.data.len() >= self.capacity
    }

    pub fn contains_idx(&self, index: I) -> bool {
        index.index() < self.data.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    pub fn iter_enumerated(&self) -> impl Iterator<Item = (I, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(idx, value)| (I::from_usize(idx), value))
    }

    pub fn indices(&self) -> impl Iterator<Item = I> + use<I, T> {
        (0..self.data.len()).map(I::from_usize)
    }

    pub fn get(&self, index: I) -> Option<&T> {
        self.data.get(index.index())
    }
}

impl<I, T> fmt::Debug for IndexVec<I, T>
where
    I: Idx,
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.data.iter()).finish()
    }
}

impl<I, T> Index<I> for IndexVec<I, T>
where
    I: Idx,
{
    type Output = T;

    fn index(&self, index: I) -> &Self::Output {
        debug_assert!(
            self.contains_idx(index),
            "stale handle {index:?} (len {})",
            self.data.len()
        );
        &self.data[index.index()]
    }
}

impl<I, T> IndexMut<I> for IndexVec<I, T>
where
    I: Idx,
{
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        debug_assert!(
            self.contains_idx(index),
            "stale handle {index:?} (len {})",
            self.data.len()
        );
        &mut self.data[index.index()]
    }
}

impl<I, T> Serialize for IndexVec<I, T>
where
    I: Idx,
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.data.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rmq::ids::UfId;

    #[test]
    fn push_hands_out_sequential_handles() {
        let mut arena: IndexVec<UfId, &str> = IndexVec::with_capacity(2);
        assert!(arena.is_empty());
        let a = arena.push("a");
        let b = arena.push("b");
        assert_eq!(a, UfId::new(0));
        assert_eq!(b, UfId::new(1));
        assert!(arena.is_full());
        assert_eq!(arena[b], "b");
        assert_eq!(arena.indices().collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    #[should_panic(expected = "arena overflow")]
    fn push_past_capacity_is_fatal() {
        let mut arena: IndexVec<UfId, u8> = IndexVec::with_capacity(1);
        arena.push(1);
        arena.push(2);
    }

    #[test]
    fn from_elem_is_full() {
        let arena: IndexVec<UfId, i32> = IndexVec::from_elem(-1, 3);
        assert_eq!(arena.len(), 3);
        assert!(arena.is_full());
        assert_eq!(arena.get(UfId::new(3)), None);
    }
}
