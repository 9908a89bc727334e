//! Per-partition metrics for join workers
//!
//! Counters are atomics so the driver can read them while the worker task
//! is running.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Per-partition join worker metrics (thread-safe)
#[derive(Debug)]
pub struct PartitionMetrics {
    partition_id: usize,

    records_processed: AtomicU64,
    batches_processed: AtomicU64,
    rows_emitted: AtomicU64,

    // Batches waiting in the input channel, sampled after each batch
    queue_depth: AtomicUsize,

    // Batch latency (microseconds)
    total_latency_micros: AtomicU64,
}

impl PartitionMetrics {
    pub fn new(partition_id: usize) -> Self {
        Self {
            partition_id,
            records_processed: AtomicU64::new(0),
            batches_processed: AtomicU64::new(0),
            rows_emitted: AtomicU64::new(0),
            queue_depth: AtomicUsize::new(0),
            total_latency_micros: AtomicU64::new(0),
        }
    }

    pub fn partition_id(&self) -> usize {
        self.partition_id
    }

    /// Record one processed batch
    pub fn record_batch(&self, records: u64, emitted: u64, latency: Duration) {
        self.records_processed.fetch_add(records, Ordering::Relaxed);
        self.rows_emitted.fetch_add(emitted, Ordering::Relaxed);
        self.batches_processed.fetch_add(1, Ordering::Relaxed);
        self.total_latency_micros
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn update_queue_depth(&self, depth: usize) {
        self.queue_depth.store(depth, Ordering::Relaxed);
    }

    pub fn queue_depth(&self) -> usize {
        self.queue_depth.load(Ordering::Relaxed)
    }

    pub fn records_processed(&self) -> u64 {
        self.records_processed.load(Ordering::Relaxed)
    }

    pub fn batches_processed(&self) -> u64 {
        self.batches_processed.load(Ordering::Relaxed)
    }

    /// Joined rows pushed downstream, matched and speculative
    pub fn rows_emitted(&self) -> u64 {
        self.rows_emitted.load(Ordering::Relaxed)
    }

    /// Average batch latency (microseconds)
    pub fn avg_batch_latency_micros(&self) -> u64 {
        let batches = self.batches_processed();
        if batches == 0 {
            return 0;
        }
        self.total_latency_micros.load(Ordering::Relaxed) / batches
    }

    pub fn snapshot(&self) -> PartitionMetricsSnapshot {
        PartitionMetricsSnapshot {
            partition_id: self.partition_id,
            records_processed: self.records_processed(),
            batches_processed: self.batches_processed(),
            rows_emitted: self.rows_emitted(),
            queue_depth: self.queue_depth(),
            avg_batch_latency_micros: self.avg_batch_latency_micros(),
        }
    }
}

/// Immutable snapshot of partition metrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionMetricsSnapshot {
    pub partition_id: usize,
    pub records_processed: u64,
    pub batches_processed: u64,
    pub rows_emitted: u64,
    pub queue_depth: usize,
    pub avg_batch_latency_micros: u64,
}

impl PartitionMetricsSnapshot {
    /// Format metrics for human-readable logging
    pub fn format_summary(&self) -> String {
        format!(
            "Partition {}: {} records in {} batches, {} rows emitted, queue depth: {}, avg batch latency: {}μs",
            self.partition_id,
            self.records_processed,
            self.batches_processed,
            self.rows_emitted,
            self.queue_depth,
            self.avg_batch_latency_micros
        )
    }
}
