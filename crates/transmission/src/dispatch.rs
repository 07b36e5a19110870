//! Batch dispatcher
//!
//! Single owner of the mutable transmission state: the bounded event
//! queue, the deferred send timer, the in-flight batch count, and any
//! pending flush waiters, all behind one mutex. Intake never blocks and
//! never fails visibly; events that cannot be queued are reported through
//! the response callback.
//!
//! A *cut* removes up to `batch_size_trigger` events from the queue front
//! and hands them to one send worker. The worker partitions them by
//! destination and POSTs the partitions sequentially, so one cut occupies
//! exactly one of the `max_concurrent_batches` slots however many
//! destinations it fans out to.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{trace, warn};

use nectar_config::Options;

use crate::batch::{self, EventSlot, Partition};
use crate::event::ValidatedEvent;
use crate::metrics::TransmissionMetrics;
use crate::response::{Response, ResponseCallback, ResponseError};
use crate::sender::{BatchResult, BatchSender};

/// Mutable dispatcher state, owned by one mutex
struct DispatchState {
    /// Queued events, oldest first
    queue: VecDeque<ValidatedEvent>,

    /// Cuts currently being sent; never exceeds `max_concurrent_batches`
    in_flight: usize,

    /// Whether a deferred timer task is pending
    timer_armed: bool,

    /// Invalidates stale timer tasks after cancel or re-arm
    timer_generation: u64,

    /// Flush completions pending the next transition to idle
    flush_waiters: Vec<oneshot::Sender<()>>,
}

/// The batch dispatcher.
pub struct Dispatcher {
    batch_size_trigger: usize,
    batch_time_trigger: Duration,
    max_concurrent_batches: usize,
    pending_work_capacity: usize,
    sender: Arc<dyn BatchSender>,
    callback: ResponseCallback,
    metrics: Arc<TransmissionMetrics>,
    runtime: Handle,
    state: Mutex<DispatchState>,
}

/// Decrements `in_flight` when a send worker finishes, on every exit path
/// including an unwinding response callback.
struct CompletionGuard(Arc<Dispatcher>);

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.0.on_batch_done();
    }
}

impl Dispatcher {
    /// Build a dispatcher from validated options
    pub fn new(
        options: &Options,
        sender: Arc<dyn BatchSender>,
        callback: ResponseCallback,
        metrics: Arc<TransmissionMetrics>,
        runtime: Handle,
    ) -> Self {
        Self {
            // A zero trigger would never cut; validation coerces it, this
            // keeps the invariant local
            batch_size_trigger: options.batch_size_trigger.max(1),
            batch_time_trigger: options.batch_time_trigger,
            max_concurrent_batches: options.max_concurrent_batches.max(1),
            pending_work_capacity: options.pending_work_capacity,
            sender,
            callback,
            metrics,
            runtime,
            state: Mutex::new(DispatchState {
                queue: VecDeque::new(),
                in_flight: 0,
                timer_armed: false,
                timer_generation: 0,
                flush_waiters: Vec::new(),
            }),
        }
    }

    /// Queue an event, or drop it with an overflow outcome when the queue
    /// is at capacity. Never blocks the caller.
    pub fn enqueue(self: &Arc<Self>, event: ValidatedEvent) {
        let mut state = self.state.lock();

        if state.queue.len() >= self.pending_work_capacity {
            drop(state);
            self.metrics.record_overflow();
            trace!("queue at capacity, dropping event");
            (self.callback)(vec![Response::overflow(event.metadata)]);
            return;
        }

        state.queue.push_back(event);
        if state.queue.len() >= self.batch_size_trigger {
            self.pump_locked(&mut state, false);
        } else {
            self.arm_timer_locked(&mut state);
        }
    }

    /// Wait until the queue is empty and nothing is in flight.
    ///
    /// Resolves immediately when already idle. Events queued while the
    /// drain is underway are included in it.
    pub async fn flush(self: &Arc<Self>) {
        let waiter = {
            let mut state = self.state.lock();
            if state.queue.is_empty() && state.in_flight == 0 {
                None
            } else {
                let (tx, rx) = oneshot::channel();
                state.flush_waiters.push(tx);
                self.pump_locked(&mut state, true);
                Some(rx)
            }
        };

        if let Some(rx) = waiter {
            // The sender is only dropped after resolving, so an error here
            // still means the drain finished
            let _ = rx.await;
        }
    }

    /// Number of queued events, for tests and introspection
    pub fn queued(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Whether the queue is empty and nothing is in flight
    pub fn is_idle(&self) -> bool {
        let state = self.state.lock();
        state.queue.is_empty() && state.in_flight == 0
    }

    /// Cut batches while a slot is free and the queue justifies it.
    ///
    /// A full batch always justifies a cut; a trailing partial batch only
    /// for timer- and flush-driven pumps (`drain_partial`). At capacity
    /// this is a no-op; the next completion re-attempts.
    fn pump_locked(self: &Arc<Self>, state: &mut DispatchState, drain_partial: bool) {
        loop {
            if state.in_flight >= self.max_concurrent_batches || state.queue.is_empty() {
                return;
            }
            if state.queue.len() < self.batch_size_trigger && !drain_partial {
                return;
            }

            self.cancel_timer_locked(state);
            let take = self.batch_size_trigger.min(state.queue.len());
            let events: Vec<ValidatedEvent> = state.queue.drain(..take).collect();
            state.in_flight += 1;
            trace!(
                events = events.len(),
                in_flight = state.in_flight,
                queued = state.queue.len(),
                "cut batch"
            );

            let this = Arc::clone(self);
            self.runtime.spawn(async move {
                let guard = CompletionGuard(Arc::clone(&this));
                this.run_batch(events).await;
                drop(guard);
            });
        }
    }

    /// Arm the single deferred timer; arming is idempotent
    fn arm_timer_locked(self: &Arc<Self>, state: &mut DispatchState) {
        if state.timer_armed {
            return;
        }
        state.timer_armed = true;
        state.timer_generation = state.timer_generation.wrapping_add(1);

        let generation = state.timer_generation;
        let delay = self.batch_time_trigger;
        let this = Arc::clone(self);
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            this.timer_fired(generation);
        });
    }

    /// Invalidate any pending timer task
    fn cancel_timer_locked(&self, state: &mut DispatchState) {
        if state.timer_armed {
            state.timer_armed = false;
            state.timer_generation = state.timer_generation.wrapping_add(1);
        }
    }

    fn timer_fired(self: &Arc<Self>, generation: u64) {
        let mut state = self.state.lock();
        if !state.timer_armed || state.timer_generation != generation {
            return;
        }
        state.timer_armed = false;
        self.pump_locked(&mut state, true);
    }

    /// Account a finished cut and keep draining or resolve flush waiters
    fn on_batch_done(self: &Arc<Self>) {
        let mut state = self.state.lock();
        state.in_flight -= 1;

        if !state.queue.is_empty() {
            if state.queue.len() >= self.batch_size_trigger {
                self.pump_locked(&mut state, false);
            } else {
                self.arm_timer_locked(&mut state);
            }
        } else if state.in_flight == 0 {
            for waiter in state.flush_waiters.drain(..) {
                let _ = waiter.send(());
            }
        }
    }

    /// Send every partition of one cut, sequentially, then emit outcomes
    async fn run_batch(&self, events: Vec<ValidatedEvent>) {
        for partition in batch::partition_events(events) {
            self.send_partition(partition).await;
        }
    }

    async fn send_partition(&self, partition: Partition) {
        let encoded = batch::encode_partition(&partition.events);

        let failures = partition.events.len() - encoded.encoded_count;
        if failures > 0 {
            self.metrics.record_encode_failures(failures as u64);
        }

        // Nothing survived encoding: report the failures, skip the wire
        if encoded.encoded_count == 0 {
            let responses = partition
                .events
                .into_iter()
                .zip(encoded.slots)
                .map(|(event, slot)| {
                    let EventSlot::Failed(message) = slot else {
                        unreachable!("partition with zero encoded events has only failed slots");
                    };
                    Response::encode_failure(event.metadata, message, Duration::ZERO)
                })
                .collect();
            (self.callback)(responses);
            return;
        }

        let started = Instant::now();
        let result = self
            .sender
            .send_batch(&partition.destination, encoded.body, encoded.encoded_count)
            .await;
        let duration = started.elapsed();

        match &result {
            BatchResult::Accepted(_) => {
                self.metrics.record_batch_sent(encoded.encoded_count as u64);
            }
            BatchResult::Rejected { status } => {
                self.metrics.record_send_error();
                warn!(
                    dataset = %partition.destination.dataset,
                    status, "batch rejected"
                );
            }
            BatchResult::Failed { message, timeout } => {
                self.metrics.record_send_error();
                warn!(
                    dataset = %partition.destination.dataset,
                    timeout, error = %message, "batch send failed"
                );
            }
        }

        let responses = assemble_responses(partition.events, encoded.slots, result, duration);
        (self.callback)(responses);
    }
}

/// Map one partition's wire result back onto its original event list.
///
/// The response array is parallel to the *encoded* subset, so encoded
/// events index into it through their slot while encode-failed events
/// keep their own outcome without consuming a response entry.
fn assemble_responses(
    events: Vec<ValidatedEvent>,
    slots: Vec<EventSlot>,
    result: BatchResult,
    duration: Duration,
) -> Vec<Response> {
    events
        .into_iter()
        .zip(slots)
        .map(|(event, slot)| {
            let encoded_index = match slot {
                EventSlot::Failed(message) => {
                    return Response::encode_failure(event.metadata, message, duration);
                }
                EventSlot::Encoded(i) => i,
            };

            match &result {
                BatchResult::Accepted(statuses) => {
                    let status = &statuses[encoded_index];
                    Response {
                        metadata: event.metadata,
                        status_code: Some(status.status),
                        duration,
                        error: status.err.clone().map(ResponseError::Server),
                    }
                }
                BatchResult::Rejected { status } => Response {
                    metadata: event.metadata,
                    status_code: Some(*status),
                    duration,
                    error: Some(ResponseError::Http(*status)),
                },
                BatchResult::Failed { message, timeout } => Response {
                    metadata: event.metadata,
                    status_code: None,
                    duration,
                    error: Some(ResponseError::Transport {
                        message: message.clone(),
                        timeout: *timeout,
                    }),
                },
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod dispatch_test;
