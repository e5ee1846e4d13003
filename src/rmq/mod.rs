//! # 半动态区间最小值（Semi-dynamic range minimum）
//!
//! 设序列 `A[1..=n]` 只在尾部追加。标记 `mark()` 在当前位置 `k = n` 打下检查点，
//! 之后任意时刻的查询 `query(k)` 返回 `min(A[k..=n])`；`close(k)` 返回最后一次答案后
//! 回收该标记。四个操作均摊 `O(1)`。
//!
//! 结构由三部分组成，合称一个 *generation*：
//! * 单调栈 [`MonotonicStack`]：严格递增的后缀最小值候选，外加一个未提交的 stub；
//! * 并查集 [`UnionFind`]：同一最小值的标记归为一类，根节点记录该最小值所在栈槽；
//! * 开放寻址索引 [`MarkIndex`]：标记键到并查集节点，关闭只留墓碑，不破坏探测链。
//!
//! 并查集耗尽时 [`GrowthManager`] 只用仍开放的标记重建下一代，容量与当前负载成正比。
//!
//! ## 示例
//!
//! ```rust
//! use fast_rmq::rmq::*;
//!
//! let mut rmq: FastRmq = FastRmq::new();
//! rmq.append(5);
//! rmq.append(3);
//! let key = rmq.mark();
//! rmq.append(4);
//! rmq.append(1);
//!
//! assert_eq!(key, 2);
//! assert_eq!(rmq.query(key), Ok(1));
//! assert_eq!(rmq.close(key), Ok(1));
//! assert_eq!(rmq.query(key), Err(RmqError::NotOpen(2)));
//! ```

pub mod controller;
pub mod error;
pub mod generation;
pub mod growth;
pub mod ids;
pub mod index_vec;
pub mod mark_index;
pub mod stack;
pub mod union_find;
pub mod value;

pub use controller::{DEFAULT_CAPACITY, FastRmq};
pub use error::{InvariantViolation, RmqError};
pub use generation::{Generation, GenerationSnapshot};
pub use growth::{GrowthManager, GrowthStats};
pub use ids::{Position, SlotId, UfId};
pub use index_vec::{Idx, IndexVec};
pub use mark_index::{Entry, MarkIndex};
pub use stack::{MonotonicStack, StackSlot};
pub use union_find::{UfNode, UnionFind};
pub use value::RmqValue;
