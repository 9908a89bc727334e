//! Partition workers for running a join on tokio
//!
//! Each partition receiver owns one `JoinCoordinator` directly (no Arc/Mutex)
//! and runs as its own tokio task:
//! - Receives batches of side-tagged records via an mpsc channel
//! - Processes each record synchronously, in delivery order
//! - Forwards joined rows to a shared unbounded output channel
//! - Exits when its input channel closes
//!
//! Nothing is shared between partitions except the output channel and the
//! atomic metrics. Shutdown discards the buffers; there is no drain step.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::velojoin::config::JoinConfig;
use crate::velojoin::error::{JoinError, JoinResult};
use crate::velojoin::execution::join::{JoinCoordinator, JoinCoordinatorStats};
use crate::velojoin::execution::types::{JoinedRecord, SideRecord};
use crate::velojoin::server::metrics::PartitionMetrics;
use crate::velojoin::server::router::{HashPartitioner, KeyPartitioner};

/// Batch of records delivered to one partition
pub type RecordBatch<K, L, R> = Vec<SideRecord<K, L, R>>;

/// Owns one partition's coordinator and drives it from a channel
pub struct JoinPartitionReceiver<K, L, R> {
    partition_id: usize,
    coordinator: JoinCoordinator<K, L, R>,
    receiver: mpsc::Receiver<RecordBatch<K, L, R>>,
    output: mpsc::UnboundedSender<JoinedRecord<K, L, R>>,
    metrics: Arc<PartitionMetrics>,
}

impl<K, L, R> JoinPartitionReceiver<K, L, R>
where
    K: Hash + Eq + Clone,
    L: Clone,
    R: Clone,
{
    pub fn new(
        partition_id: usize,
        coordinator: JoinCoordinator<K, L, R>,
        receiver: mpsc::Receiver<RecordBatch<K, L, R>>,
        output: mpsc::UnboundedSender<JoinedRecord<K, L, R>>,
        metrics: Arc<PartitionMetrics>,
    ) -> Self {
        Self {
            partition_id,
            coordinator,
            receiver,
            output,
            metrics,
        }
    }

    pub fn partition_id(&self) -> usize {
        self.partition_id
    }

    pub fn metrics(&self) -> Arc<PartitionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Process batches until the input channel closes.
    ///
    /// Returns the coordinator's final statistics; the buffers are dropped.
    pub async fn run(mut self) -> JoinCoordinatorStats {
        info!(
            "JoinPartitionReceiver {}: starting join '{}'",
            self.partition_id,
            self.coordinator.config().name()
        );

        let mut output_closed = false;
        while let Some(batch) = self.receiver.recv().await {
            let start = Instant::now();
            let records = batch.len() as u64;
            let mut emitted = 0u64;

            let output = &self.output;
            let mut sink = |row: JoinedRecord<K, L, R>| {
                emitted += 1;
                if output.send(row).is_err() && !output_closed {
                    output_closed = true;
                    warn!(
                        "JoinPartitionReceiver {}: output channel closed, dropping joined rows",
                        self.partition_id
                    );
                }
            };
            for record in batch {
                self.coordinator.process_into(record, &mut sink);
            }

            self.metrics.record_batch(records, emitted, start.elapsed());
            self.metrics.update_queue_depth(self.receiver.len());
            debug!(
                "JoinPartitionReceiver {}: processed batch of {} records ({} emitted)",
                self.partition_id, records, emitted
            );
        }

        let stats = self.coordinator.stats().clone();
        info!(
            "JoinPartitionReceiver {}: input closed, {}",
            self.partition_id,
            self.metrics.snapshot().format_summary()
        );
        stats
    }
}

/// Sending side of a running partitioned join
pub struct PartitionedJoinHandle<K, L, R, P = HashPartitioner> {
    senders: Vec<mpsc::Sender<RecordBatch<K, L, R>>>,
    workers: Vec<JoinHandle<JoinCoordinatorStats>>,
    metrics: Vec<Arc<PartitionMetrics>>,
    partitioner: P,
}

impl<K, L, R, P> PartitionedJoinHandle<K, L, R, P>
where
    P: KeyPartitioner<K>,
{
    pub fn num_partitions(&self) -> usize {
        self.senders.len()
    }

    pub fn metrics(&self) -> &[Arc<PartitionMetrics>] {
        &self.metrics
    }

    pub fn partition_for(&self, key: &K) -> usize {
        self.partitioner.partition(key, self.senders.len())
    }

    /// Route one record to its partition
    pub async fn send(&self, record: SideRecord<K, L, R>) -> JoinResult<()> {
        let partition = self.partition_for(record.key());
        self.send_to(partition, vec![record]).await
    }

    /// Route records to their partitions, keeping per-key delivery order
    pub async fn send_batch<I>(&self, records: I) -> JoinResult<()>
    where
        I: IntoIterator<Item = SideRecord<K, L, R>>,
    {
        let mut batches: Vec<RecordBatch<K, L, R>> =
            (0..self.senders.len()).map(|_| Vec::new()).collect();
        for record in records {
            let partition = self.partition_for(record.key());
            batches[partition].push(record);
        }
        for (partition, batch) in batches.into_iter().enumerate() {
            if !batch.is_empty() {
                self.send_to(partition, batch).await?;
            }
        }
        Ok(())
    }

    async fn send_to(&self, partition: usize, batch: RecordBatch<K, L, R>) -> JoinResult<()> {
        self.senders[partition]
            .send(batch)
            .await
            .map_err(|_| JoinError::ChannelClosed { partition })
    }

    /// Close every input and wait for the workers.
    ///
    /// Returns the final statistics indexed by partition.
    pub async fn shutdown(self) -> JoinResult<Vec<JoinCoordinatorStats>> {
        drop(self.senders);
        let mut stats = Vec::with_capacity(self.workers.len());
        for (partition, worker) in self.workers.into_iter().enumerate() {
            let partition_stats = worker.await.map_err(|e| JoinError::WorkerFailed {
                partition,
                reason: e.to_string(),
            })?;
            stats.push(partition_stats);
        }
        info!("Partitioned join shut down ({} partitions)", stats.len());
        Ok(stats)
    }
}

/// Spawn one worker task per partition for `config`.
///
/// Must be called inside a tokio runtime. Returns the input handle and the
/// shared output channel.
#[allow(clippy::type_complexity)]
pub fn spawn_partitioned_join<K, L, R>(
    config: JoinConfig,
    num_partitions: usize,
    channel_capacity: usize,
) -> JoinResult<(
    PartitionedJoinHandle<K, L, R>,
    mpsc::UnboundedReceiver<JoinedRecord<K, L, R>>,
)>
where
    K: Hash + Eq + Clone + Send + 'static,
    L: Clone + Send + 'static,
    R: Clone + Send + 'static,
{
    if num_partitions == 0 {
        return Err(JoinError::configuration(
            config.name(),
            "partition count must be at least 1",
        ));
    }
    if channel_capacity == 0 {
        return Err(JoinError::configuration(
            config.name(),
            "channel capacity must be at least 1",
        ));
    }

    // Build every coordinator before spawning so a bad config spawns nothing
    let coordinators = (0..num_partitions)
        .map(|_| JoinCoordinator::new(config.clone()))
        .collect::<JoinResult<Vec<_>>>()?;

    let (output_tx, output_rx) = mpsc::unbounded_channel();
    let mut senders = Vec::with_capacity(num_partitions);
    let mut workers = Vec::with_capacity(num_partitions);
    let mut metrics = Vec::with_capacity(num_partitions);

    for (partition_id, coordinator) in coordinators.into_iter().enumerate() {
        let (tx, rx) = mpsc::channel(channel_capacity);
        let partition_metrics = Arc::new(PartitionMetrics::new(partition_id));
        let receiver = JoinPartitionReceiver::new(
            partition_id,
            coordinator,
            rx,
            output_tx.clone(),
            Arc::clone(&partition_metrics),
        );
        workers.push(tokio::spawn(receiver.run()));
        senders.push(tx);
        metrics.push(partition_metrics);
    }

    info!(
        "Spawned join '{}' on {} partitions",
        config.name(),
        num_partitions
    );

    Ok((
        PartitionedJoinHandle {
            senders,
            workers,
            metrics,
            partitioner: HashPartitioner,
        },
        output_rx,
    ))
}
