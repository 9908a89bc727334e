//! Key routing for partitioned join execution
//!
//! Routes records to partitions by key hash so that both sides of a join see
//! every record for a key on the same coordinator instance.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::velojoin::config::JoinConfig;
use crate::velojoin::error::{JoinError, JoinResult};
use crate::velojoin::execution::join::{JoinCoordinator, JoinCoordinatorStats, JoinSink};
use crate::velojoin::execution::types::{JoinedRecord, SideRecord};

/// Maps a key to a partition in `[0, partitions)`
pub trait KeyPartitioner<K: ?Sized> {
    fn partition(&self, key: &K, partitions: usize) -> usize;
}

/// Default partitioner: SipHash with fixed keys, modulo the partition count.
///
/// Deterministic across instances built with the same toolchain, which is
/// what both sides of a join need.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashPartitioner;

impl<K: Hash + ?Sized> KeyPartitioner<K> for HashPartitioner {
    fn partition(&self, key: &K, partitions: usize) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % partitions as u64) as usize
    }
}

impl<K: ?Sized, F> KeyPartitioner<K> for F
where
    F: Fn(&K, usize) -> usize,
{
    fn partition(&self, key: &K, partitions: usize) -> usize {
        self(key, partitions) % partitions
    }
}

/// N independent coordinators with key-hash routing
///
/// Partitions share nothing; each owns its own pair of buffers.
#[derive(Debug)]
pub struct PartitionedJoin<K, L, R, P = HashPartitioner> {
    partitions: Vec<JoinCoordinator<K, L, R>>,
    partitioner: P,
}

impl<K, L, R> PartitionedJoin<K, L, R, HashPartitioner>
where
    K: Hash + Eq + Clone,
    L: Clone,
    R: Clone,
{
    /// Create `num_partitions` coordinators using the default partitioner
    pub fn new(config: JoinConfig, num_partitions: usize) -> JoinResult<Self> {
        Self::with_partitioner(config, num_partitions, HashPartitioner)
    }
}

impl<K, L, R, P> PartitionedJoin<K, L, R, P>
where
    K: Hash + Eq + Clone,
    L: Clone,
    R: Clone,
    P: KeyPartitioner<K>,
{
    pub fn with_partitioner(
        config: JoinConfig,
        num_partitions: usize,
        partitioner: P,
    ) -> JoinResult<Self> {
        if num_partitions == 0 {
            return Err(JoinError::configuration(
                config.name(),
                "partition count must be at least 1",
            ));
        }
        let partitions = (0..num_partitions)
            .map(|_| JoinCoordinator::new(config.clone()))
            .collect::<JoinResult<Vec<_>>>()?;
        Ok(Self {
            partitions,
            partitioner,
        })
    }

    /// Partition that owns `key`
    pub fn partition_for(&self, key: &K) -> usize {
        self.partitioner.partition(key, self.partitions.len())
    }

    /// Route one record to its partition, pushing output into `sink`
    pub fn process_into<S>(&mut self, input: SideRecord<K, L, R>, sink: &mut S) -> usize
    where
        S: JoinSink<K, L, R>,
    {
        let partition = self.partition_for(input.key());
        self.partitions[partition].process_into(input, sink);
        partition
    }

    /// Route one record and collect its output
    pub fn process(&mut self, input: SideRecord<K, L, R>) -> Vec<JoinedRecord<K, L, R>> {
        let mut out = Vec::new();
        self.process_into(input, &mut out);
        out
    }

    /// Route records in delivery order
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
}

impl<K, L, R, P> PartitionedJoin<K, L, R, P> {
    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn partition(&self, index: usize) -> Option<&JoinCoordinator<K, L, R>> {
        self.partitions.get(index)
    }

    /// Records buffered across all partitions
    pub fn total_records(&self) -> usize {
        self.partitions.iter().map(|p| p.total_records()).sum()
    }

    /// Per-partition statistics, indexed by partition
    pub fn stats(&self) -> Vec<JoinCoordinatorStats> {
        self.partitions.iter().map(|p| p.stats().clone()).collect()
    }
}
