//! Side Processor
//!
//! One processor per join side, mirror images of each other. For each record
//! arriving on its side the processor:
//! 1. Probes the opposite buffer for the same key within the window
//! 2. Emits one output per hit, in the buffer's ascending-time order
//! 3. Emits a speculative unmatched output when there were no hits and the
//!    join type is outer on this side
//! 4. Inserts the record into its own buffer, which only the other side reads
//!
//! The processor holds no state of its own; both buffers are passed in by the
//! owning [`JoinCoordinator`](super::JoinCoordinator).

use std::hash::Hash;

use crate::velojoin::config::JoinType;
use crate::velojoin::execution::join::matcher::JoinMatcher;
use crate::velojoin::execution::join::state_store::TimestampedBuffer;
use crate::velojoin::execution::join::window::JoinWindowSpec;
use crate::velojoin::execution::types::StreamRecord;

/// Which side of the join a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinSide {
    /// Left side; its value is always passed first to the joiner
    Left,
    /// Right side
    Right,
}

impl JoinSide {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            JoinSide::Left => JoinSide::Right,
            JoinSide::Right => JoinSide::Left,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JoinSide::Left => "left",
            JoinSide::Right => "right",
        }
    }
}

/// What processing one record produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SideOutcome {
    /// Matched rows emitted
    pub matches: usize,
    /// Whether a speculative unmatched row was emitted
    pub speculative: bool,
    /// Whether the record was kept in its own buffer
    pub retained: bool,
}

/// Lookup / emit / insert orchestration for one side
#[derive(Debug, Clone, Copy)]
pub struct SideProcessor {
    side: JoinSide,
    matcher: JoinMatcher,
    emit_unmatched: bool,
}

impl SideProcessor {
    pub fn new(side: JoinSide, window: &JoinWindowSpec, join_type: JoinType) -> Self {
        Self {
            side,
            matcher: JoinMatcher::for_side(side, window),
            emit_unmatched: join_type.emits_unmatched(side),
        }
    }

    pub fn side(&self) -> JoinSide {
        self.side
    }

    pub fn matcher(&self) -> &JoinMatcher {
        &self.matcher
    }

    /// Process one arriving record.
    ///
    /// `emit` receives the key, the arriving value and timestamp, and the
    /// matching `(other_value, other_timestamp)` or `None` for a speculative
    /// row. Orientation into left/right slots is up to the caller.
    pub fn process<K, V, O, F>(
        &self,
        record: StreamRecord<K, V>,
        own: &mut TimestampedBuffer<K, V>,
        other: &TimestampedBuffer<K, O>,
        mut emit: F,
    ) -> SideOutcome
    where
        K: Hash + Eq,
        F: FnMut(&K, &V, i64, Option<(&O, i64)>),
    {
        let StreamRecord {
            key,
            value,
            timestamp_ms,
        } = record;

        let mut matches = 0;
        for hit in self.matcher.matches(other, &key, timestamp_ms) {
            emit(&key, &value, timestamp_ms, Some(hit));
            matches += 1;
        }

        let speculative = matches == 0 && self.emit_unmatched;
        if speculative {
            emit(&key, &value, timestamp_ms, None);
        }

        let retained = own.put(key, value, timestamp_ms);

        SideOutcome {
            matches,
            speculative,
            retained,
        }
    }
}
