//! Join and topology configuration

pub mod join_config;
pub mod topology_file;

pub use join_config::{FormatPair, JoinConfig, JoinType, SerdeConfig, SerializationFormat};
pub use topology_file::{JoinDecl, MergeDecl, SourceDecl, TopologyFile, load_topology_file};
