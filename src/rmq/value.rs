use std::fmt;

use serde::Serialize;

/// Values that can be stored in the monotonic stack.
///
/// `MIN` fills the sentinel at the bottom of every stack and `MAX` fills the
/// reservation of a fresh generation, so a mark placed before the first
/// append resolves to whatever is appended next.
pub trait RmqValue: Copy + Ord + fmt::Debug + fmt::Display + Serialize {
    const MIN: Self;
    const MAX: Self;
}

macro_rules! impl_rmq_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl RmqValue for $ty {
                const MIN: Self = <$ty>::MIN;
                const MAX: Self = <$ty>::MAX;
            }
        )*
    };
}

impl_rmq_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
