//! Join Coordinator
//!
//! Coordinates stream-stream join processing for one partition instance by
//! owning the two per-side buffers and the two mirror-image side processors,
//! routing each record to its side and pushing joined rows into a sink.
//!
//! Each call runs lookup, emit and insert to completion before returning, so
//! output order is exactly delivery order. The coordinator is not shared
//! between threads; one instance serves one key partition.

use std::hash::Hash;

use log::debug;

use crate::velojoin::config::JoinConfig;
use crate::velojoin::error::JoinResult;
use crate::velojoin::execution::join::side::{JoinSide, SideOutcome, SideProcessor};
use crate::velojoin::execution::join::state_store::TimestampedBuffer;
use crate::velojoin::execution::types::{JoinedRecord, SideRecord, StreamRecord};

/// Downstream receiver of joined rows, called inline with each input
pub trait JoinSink<K, L, R> {
    fn emit(&mut self, record: JoinedRecord<K, L, R>);
}

impl<K, L, R> JoinSink<K, L, R> for Vec<JoinedRecord<K, L, R>> {
    fn emit(&mut self, record: JoinedRecord<K, L, R>) {
        self.push(record);
    }
}

impl<K, L, R, F> JoinSink<K, L, R> for F
where
    F: FnMut(JoinedRecord<K, L, R>),
{
    fn emit(&mut self, record: JoinedRecord<K, L, R>) {
        self(record)
    }
}

/// Statistics for monitoring join coordinator activity
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JoinCoordinatorStats {
    /// Records processed from left side
    pub left_records_processed: u64,
    /// Records processed from right side
    pub right_records_processed: u64,
    /// Matched rows emitted
    pub matches_emitted: u64,
    /// Speculative rows emitted with one slot absent
    pub unmatched_emitted: u64,
    /// Arrivals too old to be kept in their own buffer
    pub left_late_drops: u64,
    pub right_late_drops: u64,
    /// Current left buffer size
    pub left_store_size: usize,
    /// Current right buffer size
    pub right_store_size: usize,
}

impl JoinCoordinatorStats {
    fn record(&mut self, side: JoinSide, outcome: SideOutcome) {
        match side {
            JoinSide::Left => {
                self.left_records_processed += 1;
                if !outcome.retained {
                    self.left_late_drops += 1;
                }
            }
            JoinSide::Right => {
                self.right_records_processed += 1;
                if !outcome.retained {
                    self.right_late_drops += 1;
                }
            }
        }
        self.matches_emitted += outcome.matches as u64;
        if outcome.speculative {
            self.unmatched_emitted += 1;
        }
    }

    /// Total rows emitted, matched and speculative
    pub fn total_emitted(&self) -> u64 {
        self.matches_emitted + self.unmatched_emitted
    }
}

/// Coordinates stream-stream join processing for one partition
///
/// The coordinator manages two windowed buffers (one per side) and processes
/// each record by:
/// 1. Looking up matches in the opposite side's buffer
/// 2. Emitting joined records for all matches within the window
/// 3. Emitting a speculative row for unmatched outer-join arrivals
/// 4. Storing the record in its own side's buffer
#[derive(Debug)]
pub struct JoinCoordinator<K, L, R> {
    /// Join configuration
    config: JoinConfig,

    /// Buffer for left side records
    left_store: TimestampedBuffer<K, L>,

    /// Buffer for right side records
    right_store: TimestampedBuffer<K, R>,

    left_processor: SideProcessor,
    right_processor: SideProcessor,

    /// Statistics
    stats: JoinCoordinatorStats,
}

impl<K, L, R> JoinCoordinator<K, L, R>
where
    K: Hash + Eq + Clone,
    L: Clone,
    R: Clone,
{
    /// Create a new join coordinator, validating the configuration
    pub fn new(config: JoinConfig) -> JoinResult<Self> {
        config.validate()?;

        let window = &config.window;
        let left_store =
            TimestampedBuffer::new(format!("{}-left", window.name), window.left_retention_ms());
        let right_store = TimestampedBuffer::new(
            format!("{}-right", window.name),
            window.right_retention_ms(),
        );
        let left_processor = SideProcessor::new(JoinSide::Left, window, config.join_type);
        let right_processor = SideProcessor::new(JoinSide::Right, window, config.join_type);

        debug!(
            "JoinCoordinator[{}]: {} join, before={}ms after={}ms, retention left={}ms right={}ms",
            window.name,
            config.join_type,
            window.before_ms,
            window.after_ms,
            left_store.retention_ms(),
            right_store.retention_ms()
        );

        Ok(Self {
            config,
            left_store,
            right_store,
            left_processor,
            right_processor,
            stats: JoinCoordinatorStats::default(),
        })
    }

    /// Process a record from the left side, pushing output into `sink`
    pub fn process_left_into<S>(&mut self, record: StreamRecord<K, L>, sink: &mut S)
    where
        S: JoinSink<K, L, R>,
    {
        let timestamp_ms = record.timestamp_ms;
        let outcome = self.left_processor.process(
            record,
            &mut self.left_store,
            &self.right_store,
            |key, value, arrival_ms, hit| {
                let joined = match hit {
                    Some((right, right_ms)) => JoinedRecord {
                        key: key.clone(),
                        left: Some(value.clone()),
                        right: Some(right.clone()),
                        timestamp_ms: arrival_ms.max(right_ms),
                    },
                    None => JoinedRecord {
                        key: key.clone(),
                        left: Some(value.clone()),
                        right: None,
                        timestamp_ms: arrival_ms,
                    },
                };
                sink.emit(joined);
            },
        );
        self.after_process(JoinSide::Left, timestamp_ms, outcome);
    }

    /// Process a record from the right side, pushing output into `sink`
    pub fn process_right_into<S>(&mut self, record: StreamRecord<K, R>, sink: &mut S)
    where
        S: JoinSink<K, L, R>,
    {
        let timestamp_ms = record.timestamp_ms;
        let outcome = self.right_processor.process(
            record,
            &mut self.right_store,
            &self.left_store,
            |key, value, arrival_ms, hit| {
                let joined = match hit {
                    Some((left, left_ms)) => JoinedRecord {
                        key: key.clone(),
                        left: Some(left.clone()),
                        right: Some(value.clone()),
                        timestamp_ms: arrival_ms.max(left_ms),
                    },
                    None => JoinedRecord {
                        key: key.clone(),
                        left: None,
                        right: Some(value.clone()),
                        timestamp_ms: arrival_ms,
                    },
                };
                sink.emit(joined);
            },
        );
        self.after_process(JoinSide::Right, timestamp_ms, outcome);
    }

    /// Process a side-tagged record, pushing output into `sink`
    pub fn process_into<S>(&mut self, input: SideRecord<K, L, R>, sink: &mut S)
    where
        S: JoinSink<K, L, R>,
    {
        match input {
            SideRecord::Left(record) => self.process_left_into(record, sink),
            SideRecord::Right(record) => self.process_right_into(record, sink),
        }
    }

    /// Process a record from the left side
    ///
    /// Returns joined records if matches are found, or a speculative row for
    /// unmatched outer-join arrivals.
    pub fn process_left(&mut self, record: StreamRecord<K, L>) -> Vec<JoinedRecord<K, L, R>> {
        let mut out = Vec::new();
        self.process_left_into(record, &mut out);
        out
    }

    /// Process a record from the right side
    pub fn process_right(&mut self, record: StreamRecord<K, R>) -> Vec<JoinedRecord<K, L, R>> {
        let mut out = Vec::new();
        self.process_right_into(record, &mut out);
        out
    }

    /// Process a record from either side
    pub fn process(&mut self, input: SideRecord<K, L, R>) -> Vec<JoinedRecord<K, L, R>> {
        let mut out = Vec::new();
        self.process_into(input, &mut out);
        out
    }

    /// Process records in delivery order
    pub fn process_batch<I>(&mut self, inputs: I) -> Vec<JoinedRecord<K, L, R>>
    where
        I: IntoIterator<Item = SideRecord<K, L, R>>,
    {
        let mut out = Vec::new();
        for input in inputs {
            self.process_into(input, &mut out);
        }
        out
    }

    fn after_process(&mut self, side: JoinSide, timestamp_ms: i64, outcome: SideOutcome) {
        if outcome.speculative {
            debug!(
                "JoinCoordinator[{}]: no {} match for {} record at {}, emitted unmatched row",
                self.config.name(),
                side.opposite().as_str(),
                side.as_str(),
                timestamp_ms
            );
        }
        self.stats.record(side, outcome);
        self.stats.left_store_size = self.left_store.len();
        self.stats.right_store_size = self.right_store.len();
    }
}

impl<K, L, R> JoinCoordinator<K, L, R> {
    /// Get the configuration
    pub fn config(&self) -> &JoinConfig {
        &self.config
    }

    /// Get statistics
    pub fn stats(&self) -> &JoinCoordinatorStats {
        &self.stats
    }

    /// Get left store reference (for testing/monitoring)
    pub fn left_store(&self) -> &TimestampedBuffer<K, L> {
        &self.left_store
    }

    /// Get right store reference (for testing/monitoring)
    pub fn right_store(&self) -> &TimestampedBuffer<K, R> {
        &self.right_store
    }

    /// Check if both stores are empty
    pub fn is_empty(&self) -> bool {
        self.left_store.is_empty() && self.right_store.is_empty()
    }

    /// Get total record count across both stores
    pub fn total_records(&self) -> usize {
        self.left_store.len() + self.right_store.len()
    }
}
