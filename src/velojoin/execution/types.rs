//! Core record types for the join engine.
//!
//! - [`StreamRecord`] - a keyed, timestamped input delivered to one side
//! - [`SideRecord`] - an input tagged with the side it arrived on
//! - [`JoinedRecord`] - an output row, with either slot possibly absent
//! - [`ValueJoiner`] - combines the two slots of a joined row into one value

use crate::velojoin::execution::join::JoinSide;

/// A keyed record with a caller-supplied event timestamp.
///
/// Values are always present on input. Callers that model deletes use an
/// `Option<T>` value type; the join treats `None` like any other value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRecord<K, V> {
    /// Join key
    pub key: K,
    /// Record payload
    pub value: V,
    /// Event time in milliseconds
    pub timestamp_ms: i64,
}

impl<K, V> StreamRecord<K, V> {
    pub fn new(key: K, value: V, timestamp_ms: i64) -> Self {
        Self {
            key,
            value,
            timestamp_ms,
        }
    }
}

/// An input record tagged with the join side it was delivered to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideRecord<K, L, R> {
    Left(StreamRecord<K, L>),
    Right(StreamRecord<K, R>),
}

impl<K, L, R> SideRecord<K, L, R> {
    pub fn left(key: K, value: L, timestamp_ms: i64) -> Self {
        SideRecord::Left(StreamRecord::new(key, value, timestamp_ms))
    }

    pub fn right(key: K, value: R, timestamp_ms: i64) -> Self {
        SideRecord::Right(StreamRecord::new(key, value, timestamp_ms))
    }

    pub fn side(&self) -> JoinSide {
        match self {
            SideRecord::Left(_) => JoinSide::Left,
            SideRecord::Right(_) => JoinSide::Right,
        }
    }

    pub fn key(&self) -> &K {
        match self {
            SideRecord::Left(r) => &r.key,
            SideRecord::Right(r) => &r.key,
        }
    }

    pub fn timestamp_ms(&self) -> i64 {
        match self {
            SideRecord::Left(r) => r.timestamp_ms,
            SideRecord::Right(r) => r.timestamp_ms,
        }
    }
}

/// One row of join output.
///
/// The left-stream value always occupies `left`, whichever side triggered the
/// emission. An absent slot only occurs for outer-join speculative rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRecord<K, L, R> {
    pub key: K,
    pub left: Option<L>,
    pub right: Option<R>,
    /// Later of the two input timestamps (the arrival timestamp when one slot is absent)
    pub timestamp_ms: i64,
}

impl<K, L, R> JoinedRecord<K, L, R> {
    /// True when both slots are populated
    pub fn is_matched(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }

    /// Apply a joiner to the two slots
    pub fn join_with<J>(&self, joiner: &J) -> J::Output
    where
        J: ValueJoiner<L, R>,
    {
        joiner.apply(self.left.as_ref(), self.right.as_ref())
    }
}

/// Combines a left and a right value into the joined output value.
///
/// Inner joins only ever call it with both arguments present. Outer joins pass
/// `None` for the side that had no match at arrival time.
pub trait ValueJoiner<L, R> {
    type Output;

    fn apply(&self, left: Option<&L>, right: Option<&R>) -> Self::Output;
}

impl<L, R, O, F> ValueJoiner<L, R> for F
where
    F: Fn(Option<&L>, Option<&R>) -> O,
{
    type Output = O;

    fn apply(&self, left: Option<&L>, right: Option<&R>) -> O {
        self(left, right)
    }
}
