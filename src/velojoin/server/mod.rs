//! Partitioned join execution
//!
//! - [`router`] - key partitioning and the in-process `PartitionedJoin`
//! - [`partition_receiver`] - one tokio task per partition, fed by mpsc batches
//! - [`metrics`] - atomic per-partition counters

pub mod metrics;
pub mod partition_receiver;
pub mod router;

pub use metrics::{PartitionMetrics, PartitionMetricsSnapshot};
pub use partition_receiver::{
    JoinPartitionReceiver, PartitionedJoinHandle, RecordBatch, spawn_partitioned_join,
};
pub use router::{HashPartitioner, KeyPartitioner, PartitionedJoin};
