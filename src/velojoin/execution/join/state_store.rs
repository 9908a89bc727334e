//! Timestamped Join Buffer
//!
//! Per-side state store for a stream-stream join. Records are stored by join
//! key and pruned against a watermark that only this buffer's own inserts
//! advance; the opposite side's clock never expires anything here.
//!
//! ## Time-Indexed Lookups
//!
//! Records are stored in a two-level structure:
//! - Outer: `HashMap<JoinKey, TimeIndex>` for O(1) key lookup
//! - Inner: `BTreeMap<EventTime, VecDeque<Entries>>` for O(log n) time range queries
//!
//! Timestamps may arrive out of order, so an entry is placed by its event time
//! rather than appended. Entries sharing a timestamp keep insertion order in
//! their `VecDeque`, which makes range queries ascending by timestamp with ties
//! broken by arrival.

use std::collections::{BTreeMap, HashMap, VecDeque, btree_map, vec_deque};
use std::hash::Hash;

use log::{debug, trace};

/// Entry in the join buffer
#[derive(Debug, Clone)]
pub struct BufferEntry<V> {
    /// The buffered value
    pub value: V,
    /// Event time of the record (milliseconds)
    pub event_time: i64,
}

/// Statistics for monitoring a join buffer
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferStats {
    /// Total records retained on insert (lifetime)
    pub records_stored: u64,
    /// Total records removed by pruning (lifetime)
    pub records_expired: u64,
    /// Inserts already below the retention cutoff, never retained
    pub late_drops: u64,
    /// Current number of records in the buffer
    pub current_size: usize,
    /// Peak number of records observed
    pub peak_size: usize,
    /// Current number of unique keys
    pub current_keys: usize,
}

impl BufferStats {
    fn record_store(&mut self, new_size: usize, new_keys: usize) {
        self.records_stored += 1;
        self.current_size = new_size;
        self.current_keys = new_keys;
        if new_size > self.peak_size {
            self.peak_size = new_size;
        }
    }

    fn record_expiration(&mut self, count: usize, new_size: usize, new_keys: usize) {
        self.records_expired += count as u64;
        self.current_size = new_size;
        self.current_keys = new_keys;
    }
}

/// Time-indexed store for records at a single join key
type TimeIndex<V> = BTreeMap<i64, VecDeque<BufferEntry<V>>>;

/// Windowed state buffer for one side of a stream-stream join
///
/// Invariant: after every [`put`](Self::put) or [`prune`](Self::prune) no
/// entry with `event_time < watermark - retention_ms` remains, where the
/// watermark is the largest timestamp this buffer has ever observed.
#[derive(Debug)]
pub struct TimestampedBuffer<K, V> {
    /// Buffer name, used in log output
    name: String,

    /// Records indexed by join key, then by event time
    records: HashMap<K, TimeIndex<V>>,

    /// Max timestamp observed so far (None until the first observation)
    watermark: Option<i64>,

    /// How far behind the watermark records are kept
    retention_ms: i64,

    /// Lower bound on the event times currently retained
    earliest: Option<i64>,

    /// Running count of total records
    record_count: usize,

    stats: BufferStats,
}

impl<K, V> TimestampedBuffer<K, V>
where
    K: Hash + Eq,
{
    /// Create an empty buffer keeping records `retention_ms` behind its watermark
    pub fn new(name: impl Into<String>, retention_ms: i64) -> Self {
        Self {
            name: name.into(),
            records: HashMap::new(),
            watermark: None,
            retention_ms: retention_ms.max(0),
            earliest: None,
            record_count: 0,
            stats: BufferStats::default(),
        }
    }

    /// Insert a record, then prune against the advanced watermark.
    ///
    /// Returns `false` when the record's own timestamp is already older than
    /// the retention cutoff. Such a record would be removed by the prune that
    /// follows its insert, so it is never stored.
    pub fn put(&mut self, key: K, value: V, timestamp_ms: i64) -> bool {
        let advanced = self.observe(timestamp_ms);
        let cutoff = self.cutoff();

        if timestamp_ms < cutoff {
            self.stats.late_drops += 1;
            debug!(
                "TimestampedBuffer[{}]: dropping late record at {} (cutoff {})",
                self.name, timestamp_ms, cutoff
            );
            return false;
        }

        self.records
            .entry(key)
            .or_default()
            .entry(timestamp_ms)
            .or_default()
            .push_back(BufferEntry {
                value,
                event_time: timestamp_ms,
            });
        self.record_count += 1;
        self.earliest = Some(self.earliest.map_or(timestamp_ms, |e| e.min(timestamp_ms)));
        self.stats.record_store(self.record_count, self.records.len());

        if advanced {
            self.expire_before(cutoff);
        }
        true
    }

    /// Records for `key` with `from_ms <= event_time <= to_ms`.
    ///
    /// Ascending by event time, ties in insertion order. The returned iterator
    /// can be cloned to restart it. An inverted range yields nothing.
    pub fn range_query(&self, key: &K, from_ms: i64, to_ms: i64) -> BufferRange<'_, V> {
        let slots = if from_ms <= to_ms {
            self.records
                .get(key)
                .map(|time_index| time_index.range(from_ms..=to_ms))
        } else {
            None
        };
        BufferRange {
            slots,
            current: None,
        }
    }

    /// Observe a timestamp and remove everything older than the new cutoff.
    ///
    /// Returns the number of records removed.
    pub fn prune(&mut self, observed_timestamp_ms: i64) -> usize {
        self.observe(observed_timestamp_ms);
        let cutoff = self.cutoff();
        self.expire_before(cutoff)
    }

    /// Advance the watermark; returns true if it moved
    fn observe(&mut self, timestamp_ms: i64) -> bool {
        match self.watermark {
            Some(current) if current >= timestamp_ms => false,
            _ => {
                self.watermark = Some(timestamp_ms);
                true
            }
        }
    }

    /// Oldest event time still retained under the current watermark
    fn cutoff(&self) -> i64 {
        match self.watermark {
            Some(watermark) => watermark.saturating_sub(self.retention_ms),
            None => i64::MIN,
        }
    }

    /// Remove every entry with `event_time < cutoff`, across all keys
    fn expire_before(&mut self, cutoff: i64) -> usize {
        match self.earliest {
            Some(earliest) if earliest < cutoff => {}
            _ => return 0,
        }

        let mut expired_count = 0;
        let mut earliest: Option<i64> = None;

        self.records.retain(|_key, time_index| {
            let kept = time_index.split_off(&cutoff);
            expired_count += time_index.values().map(VecDeque::len).sum::<usize>();
            *time_index = kept;
            if let Some((&first, _)) = time_index.first_key_value() {
                earliest = Some(earliest.map_or(first, |e| e.min(first)));
            }
            !time_index.is_empty()
        });

        self.earliest = earliest;
        self.record_count = self.record_count.saturating_sub(expired_count);
        self.stats
            .record_expiration(expired_count, self.record_count, self.records.len());

        if expired_count > 0 {
            trace!(
                "TimestampedBuffer[{}]: expired {} records below {}",
                self.name, expired_count, cutoff
            );
        }
        expired_count
    }

    /// Number of records stored for one key
    pub fn len_for_key(&self, key: &K) -> usize {
        self.records
            .get(key)
            .map(|time_index| time_index.values().map(VecDeque::len).sum())
            .unwrap_or(0)
    }
}

impl<K, V> TimestampedBuffer<K, V> {
    /// Largest timestamp observed so far
    pub fn watermark(&self) -> Option<i64> {
        self.watermark
    }

    pub fn retention_ms(&self) -> i64 {
        self.retention_ms
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stats(&self) -> &BufferStats {
        &self.stats
    }

    /// Number of unique keys currently stored
    pub fn key_count(&self) -> usize {
        self.records.len()
    }

    /// Total number of records currently stored (O(1))
    pub fn len(&self) -> usize {
        self.record_count
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }

    /// Discard every record. The watermark is kept.
    pub fn clear(&mut self) {
        let dropped = self.record_count;
        self.records.clear();
        self.record_count = 0;
        self.earliest = None;
        self.stats.record_expiration(dropped, 0, 0);
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.records.keys()
    }
}

/// Iterator over `(value, event_time)` pairs returned by
/// [`TimestampedBuffer::range_query`]
pub struct BufferRange<'a, V> {
    slots: Option<btree_map::Range<'a, i64, VecDeque<BufferEntry<V>>>>,
    current: Option<(i64, vec_deque::Iter<'a, BufferEntry<V>>)>,
}

impl<V> Clone for BufferRange<'_, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            current: self.current.clone(),
        }
    }
}

impl<'a, V> Iterator for BufferRange<'a, V> {
    type Item = (&'a V, i64);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((event_time, entries)) = &mut self.current {
                if let Some(entry) = entries.next() {
                    return Some((&entry.value, *event_time));
                }
            }
            let (&event_time, entries) = self.slots.as_mut()?.next()?;
            self.current = Some((event_time, entries.iter()));
        }
    }
}
