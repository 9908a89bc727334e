//! Join Matcher
//!
//! Pure range-query logic: given an arriving record's key and timestamp, find
//! the opposite buffer's entries that fall inside the join window.
//!
//! For a window `[before, after]` a pair matches iff
//! `right.time - left.time ∈ [-before, +after]`. Rearranged per arriving side:
//!
//! ```text
//! left arrives at T  -> right.time ∈ [T - before, T + after]
//! right arrives at T -> left.time  ∈ [T - after,  T + before]
//! ```

use std::hash::Hash;

use crate::velojoin::execution::join::side::JoinSide;
use crate::velojoin::execution::join::state_store::{BufferRange, TimestampedBuffer};
use crate::velojoin::execution::join::window::JoinWindowSpec;

/// Probe bounds for one arriving side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinMatcher {
    /// Subtracted from the arrival timestamp for the lower bound
    lower_offset_ms: i64,
    /// Added to the arrival timestamp for the upper bound
    upper_offset_ms: i64,
}

impl JoinMatcher {
    /// Matcher for records arriving on `side`
    pub fn for_side(side: JoinSide, window: &JoinWindowSpec) -> Self {
        match side {
            JoinSide::Left => Self {
                lower_offset_ms: window.before_ms,
                upper_offset_ms: window.after_ms,
            },
            JoinSide::Right => Self {
                lower_offset_ms: window.after_ms,
                upper_offset_ms: window.before_ms,
            },
        }
    }

    /// Inclusive `(from, to)` range to probe for an arrival at `timestamp_ms`
    pub fn probe_bounds(&self, timestamp_ms: i64) -> (i64, i64) {
        (
            timestamp_ms.saturating_sub(self.lower_offset_ms),
            timestamp_ms.saturating_add(self.upper_offset_ms),
        )
    }

    /// Entries of `other` joinable with an arrival `(key, timestamp_ms)`
    pub fn matches<'a, K, V>(
        &self,
        other: &'a TimestampedBuffer<K, V>,
        key: &K,
        timestamp_ms: i64,
    ) -> BufferRange<'a, V>
    where
        K: Hash + Eq,
    {
        let (from, to) = self.probe_bounds(timestamp_ms);
        other.range_query(key, from, to)
    }
}
