//! YAML topology files
//!
//! A topology file declares sources, joins and merges together with the
//! partition count of every topic they read:
//!
//! ```yaml
//! sources:
//!   - name: orders
//!     topics: [orders]
//!   - name: payments
//!     topics: [payments]
//! joins:
//!   - name: orders_payments
//!     left: orders
//!     right: payments
//!     config:
//!       window: { name: orders_payments, before_ms: 60000, after_ms: 60000 }
//!       join_type: left_outer
//! partitions:
//!   orders: 12
//!   payments: 12
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::velojoin::config::JoinConfig;
use crate::velojoin::error::{JoinError, JoinResult};
use crate::velojoin::topology::{JoinTopology, PartitionerKind, TopologyBuilder};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDecl {
    pub name: String,
    pub topics: Vec<String>,
    #[serde(default)]
    pub partitioner: PartitionerKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinDecl {
    pub name: String,
    pub left: String,
    pub right: String,
    pub config: JoinConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeDecl {
    pub name: String,
    pub inputs: Vec<String>,
}

/// Parsed topology file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyFile {
    #[serde(default)]
    pub sources: Vec<SourceDecl>,
    #[serde(default)]
    pub joins: Vec<JoinDecl>,
    #[serde(default)]
    pub merges: Vec<MergeDecl>,
    /// Topic name -> partition count
    #[serde(default)]
    pub partitions: HashMap<String, u32>,
}

impl TopologyFile {
    /// Parse from a YAML string; `origin` names the source in errors
    pub fn from_yaml_str(yaml: &str, origin: &Path) -> JoinResult<Self> {
        serde_yaml::from_str(yaml).map_err(|source| JoinError::ConfigParse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Declare sources, then merges, then joins, so a join may read a
    /// merged stream.
    pub fn into_builder(self) -> TopologyBuilder {
        let mut builder = TopologyBuilder::new();
        for source in self.sources {
            builder.add_source_with_partitioner(&source.name, source.topics, source.partitioner);
        }
        for merge in self.merges {
            builder.add_merge(&merge.name, merge.inputs);
        }
        for join in self.joins {
            builder.add_join(&join.name, &join.left, &join.right, join.config);
        }
        builder
    }

    /// Validate against the file's own partition counts
    pub fn build(self) -> JoinResult<JoinTopology> {
        let partitions = self.partitions.clone();
        self.into_builder().build(&partitions)
    }
}

/// Read and parse a topology file
pub fn load_topology_file(path: impl AsRef<Path>) -> JoinResult<TopologyFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| JoinError::ConfigLoad {
        path: path.to_path_buf(),
        source,
    })?;
    let file = TopologyFile::from_yaml_str(&contents, path)?;
    debug!(
        "Loaded topology file {}: {} sources, {} joins, {} merges",
        path.display(),
        file.sources.len(),
        file.joins.len(),
        file.merges.len()
    );
    Ok(file)
}
