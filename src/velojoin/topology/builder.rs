//! Topology declaration and build-time validation
//!
//! A topology names its sources, the joins between them and any merges. All
//! structural checks run in [`TopologyBuilder::build`]:
//!
//! 1. Node names are unique and every join/merge input was declared first
//! 2. Every join's `JoinConfig` validates
//! 3. Every co-partition group maps to topics with one shared partition count
//!    and one key partitioner
//!
//! A topology that fails any check never yields a `JoinTopology`, so no
//! coordinator is ever created for it.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::velojoin::config::JoinConfig;
use crate::velojoin::error::{JoinError, JoinResult};
use crate::velojoin::server::router::{KeyPartitioner, PartitionedJoin};
use crate::velojoin::topology::copartition::compute_copartition_groups;

/// Key-to-partition function declared for a source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionerKind {
    /// Hash of the serialized key modulo the partition count
    #[default]
    Default,
    /// Application-supplied partitioner, identified by name
    Custom(String),
}

/// A declared input stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub name: String,
    pub topics: Vec<String>,
    pub partitioner: PartitionerKind,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Source(SourceSpec),
    Join {
        left: String,
        right: String,
        config: Box<JoinConfig>,
    },
    Merge {
        inputs: Vec<String>,
    },
}

/// A validated join node
#[derive(Debug, Clone)]
pub struct JoinNode {
    pub name: String,
    /// Sources feeding the left input
    pub left_sources: BTreeSet<String>,
    /// Sources feeding the right input
    pub right_sources: BTreeSet<String>,
    pub config: JoinConfig,
    /// Shared partition count of the join's co-partition group
    pub partitions: u32,
    /// Partitioner shared by every source of the group
    pub partitioner: PartitionerKind,
}

/// A validated co-partition group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopartitionGroup {
    pub sources: BTreeSet<String>,
    pub topics: BTreeSet<String>,
    pub partitions: u32,
    pub partitioner: PartitionerKind,
}

/// Collects sources, joins and merges; validated by [`build`](Self::build)
#[derive(Debug, Default, Clone)]
pub struct TopologyBuilder {
    nodes: Vec<(String, NodeKind)>,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a source reading `topics` with the default partitioner
    pub fn add_source<I, T>(&mut self, name: &str, topics: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.add_source_with_partitioner(name, topics, PartitionerKind::Default)
    }

    pub fn add_source_with_partitioner<I, T>(
        &mut self,
        name: &str,
        topics: I,
        partitioner: PartitionerKind,
    ) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let spec = SourceSpec {
            name: name.to_string(),
            topics: topics.into_iter().map(Into::into).collect(),
            partitioner,
        };
        self.nodes.push((name.to_string(), NodeKind::Source(spec)));
        self
    }

    /// Declare a windowed join of two previously declared nodes
    pub fn add_join(
        &mut self,
        name: &str,
        left: &str,
        right: &str,
        config: JoinConfig,
    ) -> &mut Self {
        self.nodes.push((
            name.to_string(),
            NodeKind::Join {
                left: left.to_string(),
                right: right.to_string(),
                config: Box::new(config),
            },
        ));
        self
    }

    /// Declare a merge of previously declared nodes
    pub fn add_merge<I, T>(&mut self, name: &str, inputs: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.nodes.push((
            name.to_string(),
            NodeKind::Merge {
                inputs: inputs.into_iter().map(Into::into).collect(),
            },
        ));
        self
    }

    /// Co-partition groups as sets of topic names.
    ///
    /// Only sources that feed at least one join or merge are included.
    pub fn copartition_groups(&self) -> JoinResult<Vec<BTreeSet<String>>> {
        let resolved = self.resolve()?;
        Ok(resolved
            .source_groups()
            .into_iter()
            .map(|group| {
                group
                    .iter()
                    .flat_map(|source| resolved.sources[source].topics.iter().cloned())
                    .collect()
            })
            .collect())
    }

    /// Validate the whole topology against the externally supplied
    /// partition counts (topic name -> partition count).
    pub fn build(&self, partition_counts: &HashMap<String, u32>) -> JoinResult<JoinTopology> {
        let resolved = self
            .resolve()
            .inspect_err(|e| warn!("Topology: rejected: {}", e))?;

        for (name, _, _, config) in &resolved.joins {
            if let Err(e) = config.validate() {
                warn!("Topology: join '{}' rejected: {}", name, e);
                return Err(e);
            }
        }

        let mut groups = Vec::new();
        for members in resolved.source_groups() {
            let group = resolved.validate_group(&members, partition_counts)?;
            groups.push(group);
        }

        let mut joins = Vec::new();
        for (name, left_sources, right_sources, config) in resolved.joins {
            let group = left_sources
                .iter()
                .next()
                .and_then(|source| groups.iter().find(|g| g.sources.contains(source)))
                .ok_or_else(|| JoinError::topology(format!("join '{}' has no sources", name)))?;
            let (partitions, partitioner) = (group.partitions, group.partitioner.clone());
            joins.push(JoinNode {
                name,
                left_sources,
                right_sources,
                config,
                partitions,
                partitioner,
            });
        }

        info!(
            "Topology: built {} joins over {} co-partition groups",
            joins.len(),
            groups.len()
        );

        Ok(JoinTopology { joins, groups })
    }

    fn resolve(&self) -> JoinResult<Resolved> {
        let mut declared: HashSet<&str> = HashSet::new();
        let mut upstream: HashMap<&str, BTreeSet<String>> = HashMap::new();
        let mut resolved = Resolved::default();

        for (name, kind) in &self.nodes {
            if !declared.insert(name.as_str()) {
                return Err(JoinError::topology(format!("duplicate node name '{}'", name)));
            }
            let lookup = |input: &str| -> JoinResult<BTreeSet<String>> {
                upstream.get(input).cloned().ok_or_else(|| {
                    JoinError::topology(format!(
                        "node '{}' reads from undeclared node '{}'",
                        name, input
                    ))
                })
            };

            let sources = match kind {
                NodeKind::Source(spec) => {
                    if spec.topics.is_empty() {
                        return Err(JoinError::topology(format!(
                            "source '{}' declares no topics",
                            name
                        )));
                    }
                    resolved.sources.insert(name.clone(), spec.clone());
                    BTreeSet::from([name.clone()])
                }
                NodeKind::Join {
                    left,
                    right,
                    config,
                } => {
                    let left_sources = lookup(left)?;
                    let right_sources = lookup(right)?;
                    resolved.link(left_sources.iter().chain(right_sources.iter()));
                    let all: BTreeSet<String> =
                        left_sources.union(&right_sources).cloned().collect();
                    resolved.joins.push((
                        name.clone(),
                        left_sources,
                        right_sources,
                        (**config).clone(),
                    ));
                    all
                }
                NodeKind::Merge { inputs } => {
                    if inputs.is_empty() {
                        return Err(JoinError::topology(format!(
                            "merge '{}' has no inputs",
                            name
                        )));
                    }
                    let mut all = BTreeSet::new();
                    for input in inputs {
                        all.extend(lookup(input)?);
                    }
                    resolved.link(all.iter());
                    all
                }
            };
            upstream.insert(name.as_str(), sources);
        }

        Ok(resolved)
    }
}

#[derive(Debug, Default)]
struct Resolved {
    sources: HashMap<String, SourceSpec>,
    joins: Vec<(String, BTreeSet<String>, BTreeSet<String>, JoinConfig)>,
    /// Sources that feed a join or merge
    participating: BTreeSet<String>,
    edges: Vec<(String, String)>,
}

impl Resolved {
    /// Record that all `sources` feed the same node
    fn link<'a>(&mut self, sources: impl Iterator<Item = &'a String>) {
        let mut first: Option<&String> = None;
        for source in sources {
            self.participating.insert(source.clone());
            match first {
                None => first = Some(source),
                Some(anchor) => self.edges.push((anchor.clone(), source.clone())),
            }
        }
    }

    fn source_groups(&self) -> Vec<BTreeSet<String>> {
        compute_copartition_groups(self.participating.iter().cloned(), self.edges.iter().cloned())
    }

    fn validate_group(
        &self,
        members: &BTreeSet<String>,
        partition_counts: &HashMap<String, u32>,
    ) -> JoinResult<CopartitionGroup> {
        let violation = |details: String| {
            warn!("Topology: co-partitioning violation for {:?}: {}", members, details);
            JoinError::CopartitioningViolation {
                sources: members.iter().cloned().collect(),
                details,
            }
        };

        let mut topics = BTreeSet::new();
        let mut partitions: Option<(u32, &str)> = None;
        let mut partitioner: Option<(&PartitionerKind, &str)> = None;

        for source in members {
            let spec = &self.sources[source];
            match partitioner {
                None => partitioner = Some((&spec.partitioner, &spec.name)),
                Some((expected, first)) if *expected != spec.partitioner => {
                    return Err(violation(format!(
                        "source '{}' uses partitioner {:?} but '{}' uses {:?}",
                        spec.name, spec.partitioner, first, expected
                    )));
                }
                Some(_) => {}
            }

            for topic in &spec.topics {
                let count = *partition_counts.get(topic).ok_or_else(|| {
                    violation(format!("no partition count supplied for topic '{}'", topic))
                })?;
                if count == 0 {
                    return Err(violation(format!("topic '{}' has zero partitions", topic)));
                }
                match partitions {
                    None => partitions = Some((count, topic.as_str())),
                    Some((expected, first)) if expected != count => {
                        return Err(violation(format!(
                            "topic '{}' has {} partitions but '{}' has {}",
                            topic, count, first, expected
                        )));
                    }
                    Some(_) => {}
                }
                topics.insert(topic.clone());
            }
        }

        Ok(CopartitionGroup {
            sources: members.clone(),
            topics,
            partitions: partitions.map(|(count, _)| count).unwrap_or(1),
            partitioner: partitioner
                .map(|(kind, _)| kind.clone())
                .unwrap_or_default(),
        })
    }
}

/// A topology that passed every build-time check
#[derive(Debug, Clone)]
pub struct JoinTopology {
    joins: Vec<JoinNode>,
    groups: Vec<CopartitionGroup>,
}

impl JoinTopology {
    pub fn joins(&self) -> &[JoinNode] {
        &self.joins
    }

    pub fn join(&self, name: &str) -> Option<&JoinNode> {
        self.joins.iter().find(|join| join.name == name)
    }

    pub fn groups(&self) -> &[CopartitionGroup] {
        &self.groups
    }

    fn require_join(&self, name: &str) -> JoinResult<&JoinNode> {
        self.join(name)
            .ok_or_else(|| JoinError::topology(format!("unknown join '{}'", name)))
    }

    /// Instantiate one coordinator per partition for a declared join,
    /// routing keys with [`HashPartitioner`](crate::velojoin::server::HashPartitioner).
    ///
    /// Fails for a join whose sources declare a custom partitioner: hash
    /// routing would not place keys where that partitioner does. Use
    /// [`partitioned_join_with`](Self::partitioned_join_with) instead.
    pub fn partitioned_join<K, L, R>(&self, name: &str) -> JoinResult<PartitionedJoin<K, L, R>>
    where
        K: Hash + Eq + Clone,
        L: Clone,
        R: Clone,
    {
        let node = self.require_join(name)?;
        if let PartitionerKind::Custom(partitioner) = &node.partitioner {
            return Err(JoinError::topology(format!(
                "join '{}' reads sources partitioned by custom partitioner '{}'; \
                 supply it with partitioned_join_with",
                name, partitioner
            )));
        }
        PartitionedJoin::new(node.config.clone(), node.partitions as usize)
    }

    /// Instantiate a declared join routed by the caller's partitioner.
    ///
    /// `partitioner` must place keys the way the sources' declared
    /// partitioner does.
    pub fn partitioned_join_with<K, L, R, P>(
        &self,
        name: &str,
        partitioner: P,
    ) -> JoinResult<PartitionedJoin<K, L, R, P>>
    where
        K: Hash + Eq + Clone,
        L: Clone,
        R: Clone,
        P: KeyPartitioner<K>,
    {
        let node = self.require_join(name)?;
        PartitionedJoin::with_partitioner(
            node.config.clone(),
            node.partitions as usize,
            partitioner,
        )
    }
}
