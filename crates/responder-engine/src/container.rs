//! Partition-ordered listener container
//!
//! Each worker is a named thread fed by its own bounded queue. A record is
//! routed to worker `partition % concurrency`, so records of one partition
//! are handled in order while different partitions proceed in parallel.
//! A record the handler leaves unacknowledged is redelivered up to
//! `max_redeliveries` times and then skipped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use responder_core::errors::{CoreError, CoreErrorKind};

use crate::bus::{Acknowledgment, ConsumerRecord, RecordHandler};
use crate::config::ConsumerConfig;

/// Delivery counters, a snapshot of the container's progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerStats {
    /// Records acknowledged by the handler
    pub committed: u64,
    /// Extra deliveries of unacknowledged records
    pub redelivered: u64,
    /// Records given up on after the last redelivery
    pub skipped: u64,
}

#[derive(Default)]
struct Counters {
    committed: AtomicU64,
    redelivered: AtomicU64,
    skipped: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> ContainerStats {
        ContainerStats {
            committed: self.committed.load(Ordering::SeqCst),
            redelivered: self.redelivered.load(Ordering::SeqCst),
            skipped: self.skipped.load(Ordering::SeqCst),
        }
    }
}

/// Acknowledgment handle for a single delivery attempt
#[derive(Default)]
struct DeliveryAck(AtomicBool);

impl DeliveryAck {
    fn is_acknowledged(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Acknowledgment for DeliveryAck {
    fn acknowledge(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

struct Worker {
    sender: SyncSender<ConsumerRecord>,
    handle: JoinHandle<()>,
}

/// Worker pool driving a `RecordHandler`
pub struct ListenerContainer {
    workers: Vec<Worker>,
    counters: Arc<Counters>,
}

impl ListenerContainer {
    /// Spawn `config.concurrency` workers around `handler`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a zero concurrency or queue depth and
    /// `Io` when a worker thread cannot be spawned.
    pub fn start(
        config: &ConsumerConfig,
        handler: Arc<dyn RecordHandler>,
    ) -> Result<Self, CoreError> {
        if config.concurrency == 0 || config.queue_depth == 0 {
            return Err(CoreError::new(CoreErrorKind::InvalidInput)
                .with_op("start_container")
                .with_message("concurrency and queue depth must be greater than 0"));
        }

        let counters = Arc::new(Counters::default());
        let mut workers = Vec::with_capacity(config.concurrency);
        for index in 0..config.concurrency {
            let (sender, receiver) = mpsc::sync_channel(config.queue_depth);
            let handler = Arc::clone(&handler);
            let counters = Arc::clone(&counters);
            let max_redeliveries = config.max_redeliveries;
            let handle = thread::Builder::new()
                .name(format!("responder-listener-{}", index))
                .spawn(move || run_worker(receiver, handler.as_ref(), &counters, max_redeliveries))
                .map_err(|err| {
                    CoreError::new(CoreErrorKind::Io)
                        .with_op("start_container")
                        .with_message(format!("failed to spawn listener thread: {}", err))
                })?;
            workers.push(Worker { sender, handle });
        }

        tracing::info!(concurrency = config.concurrency, "listener container started");
        Ok(Self { workers, counters })
    }

    /// Number of workers
    pub fn concurrency(&self) -> usize {
        self.workers.len()
    }

    /// Queue a record on the worker owning its partition
    ///
    /// Blocks while that worker's queue is full.
    ///
    /// # Errors
    ///
    /// Returns `Internal` when the worker has stopped.
    pub fn submit(&self, record: ConsumerRecord) -> Result<(), CoreError> {
        let index = worker_index(record.partition, self.workers.len());
        self.workers[index].sender.send(record).map_err(|_| {
            CoreError::new(CoreErrorKind::Internal)
                .with_op("submit_record")
                .with_message(format!("listener worker {} has stopped", index))
        })
    }

    pub fn stats(&self) -> ContainerStats {
        self.counters.snapshot()
    }

    /// Stop accepting records, drain every queue and wait for the workers
    pub fn shutdown(self) -> ContainerStats {
        let Self { workers, counters } = self;
        let handles: Vec<_> = workers
            .into_iter()
            .map(|Worker { sender, handle }| {
                drop(sender);
                handle
            })
            .collect();
        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("listener worker panicked");
            }
        }

        let stats = counters.snapshot();
        tracing::info!(
            committed = stats.committed,
            redelivered = stats.redelivered,
            skipped = stats.skipped,
            "listener container stopped"
        );
        stats
    }
}

impl std::fmt::Debug for ListenerContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerContainer")
            .field("concurrency", &self.workers.len())
            .field("stats", &self.counters.snapshot())
            .finish()
    }
}

fn worker_index(partition: i32, workers: usize) -> usize {
    (i64::from(partition).rem_euclid(workers as i64)) as usize
}

fn run_worker(
    receiver: Receiver<ConsumerRecord>,
    handler: &dyn RecordHandler,
    counters: &Counters,
    max_redeliveries: u32,
) {
    while let Ok(record) = receiver.recv() {
        deliver(&record, handler, counters, max_redeliveries);
    }
}

fn deliver(
    record: &ConsumerRecord,
    handler: &dyn RecordHandler,
    counters: &Counters,
    max_redeliveries: u32,
) {
    for attempt in 0..=max_redeliveries {
        let ack = DeliveryAck::default();
        let result = handler.on_record(record, &ack);
        if ack.is_acknowledged() {
            counters.committed.fetch_add(1, Ordering::SeqCst);
            return;
        }

        match result {
            Err(err) => tracing::warn!(
                topic = %record.topic,
                partition = record.partition,
                offset = record.offset,
                attempt,
                error = %err,
                "record not acknowledged"
            ),
            Ok(()) => tracing::warn!(
                topic = %record.topic,
                partition = record.partition,
                offset = record.offset,
                attempt,
                "record not acknowledged"
            ),
        }
        if attempt < max_redeliveries {
            counters.redelivered.fetch_add(1, Ordering::SeqCst);
        }
    }

    counters.skipped.fetch_add(1, Ordering::SeqCst);
    tracing::error!(
        topic = %record.topic,
        partition = record.partition,
        offset = record.offset,
        max_redeliveries,
        "record skipped after redeliveries"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_index_spreads_partitions() {
        assert_eq!(worker_index(0, 3), 0);
        assert_eq!(worker_index(4, 3), 1);
        assert_eq!(worker_index(-1, 3), 2);
        assert_eq!(worker_index(7, 1), 0);
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        struct Noop;
        impl RecordHandler for Noop {
            fn on_record(
                &self,
                _record: &ConsumerRecord,
                ack: &dyn Acknowledgment,
            ) -> Result<(), responder_core::ResponderError> {
                ack.acknowledge();
                Ok(())
            }
        }

        let config = ConsumerConfig {
            concurrency: 0,
            ..ConsumerConfig::default()
        };
        let err = ListenerContainer::start(&config, Arc::new(Noop)).unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::InvalidInput);
    }
}
