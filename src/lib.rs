//! # velojoin
//!
//! Symmetric, time-windowed stream-stream joins.
//!
//! Two keyed, timestamped streams are joined on key equality whenever their
//! event times fall within a configurable `[before, after]` window. Each join
//! instance keeps one time-bounded buffer per side; every arrival probes the
//! opposite buffer, emits its matches immediately and is then buffered for
//! later arrivals on the other side. Inner, left-outer, right-outer and
//! full-outer joins share one algorithm.
//!
//! ## Features
//!
//! - **Windowed buffers**: per-side, per-key event-time index pruned against a
//!   local watermark
//! - **Outer joins**: speculative rows emitted immediately for unmatched arrivals
//! - **Co-partitioning checks**: topologies whose joined sources disagree on
//!   partition counts are rejected before any record is processed
//! - **Partitioned execution**: key-hash routing, in-process or one tokio task
//!   per partition
//! - **YAML topologies**: declare sources, joins and partition counts in a file
//!
//! ## Quick Start
//!
//! ```rust
//! use velojoin::{JoinConfig, JoinCoordinator, JoinWindowSpec, StreamRecord};
//!
//! let config = JoinConfig::inner(JoinWindowSpec::of("orders-payments").within(100));
//! let mut join: JoinCoordinator<u32, String, String> = JoinCoordinator::new(config)?;
//!
//! join.process_left(StreamRecord::new(1, "order".to_string(), 1_000));
//! let rows = join.process_right(StreamRecord::new(1, "payment".to_string(), 1_050));
//!
//! assert_eq!(rows.len(), 1);
//! assert_eq!(rows[0].timestamp_ms, 1_050);
//! # Ok::<(), velojoin::JoinError>(())
//! ```

pub mod velojoin;

pub use velojoin::config::{
    FormatPair, JoinConfig, JoinType, SerdeConfig, SerializationFormat, TopologyFile,
    load_topology_file,
};
pub use velojoin::error::{JoinError, JoinResult};
pub use velojoin::execution::join::{
    JoinCoordinator, JoinCoordinatorStats, JoinSide, JoinSink, JoinWindowSpec, TimestampedBuffer,
};
pub use velojoin::execution::{JoinedRecord, SideRecord, StreamRecord, ValueJoiner};
pub use velojoin::server::{
    HashPartitioner, KeyPartitioner, PartitionedJoin, spawn_partitioned_join,
};
pub use velojoin::topology::{JoinTopology, TopologyBuilder, compute_copartition_groups};
