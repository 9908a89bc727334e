//! Topology declaration and co-partitioning checks

pub mod builder;
pub mod copartition;

pub use builder::{
    CopartitionGroup, JoinNode, JoinTopology, PartitionerKind, SourceSpec, TopologyBuilder,
};
pub use copartition::{DisjointSet, compute_copartition_groups};
