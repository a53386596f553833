//! The event queue with deterministic ordering.
//!
//! Events are passive data dispatched by a central match in the
//! [`Simulator`](crate::Simulator). Keeping the payloads as tagged variants
//! rather than boxed closures makes determinism audits straightforward: the
//! full pending schedule can be inspected and logged at any point.

use crate::SimulationError;
use std::collections::BTreeMap;
use std::time::Duration;
use swarmsim_types::NodeId;

/// Key for ordering events in the queue.
///
/// Events are ordered by:
/// 1. Time (earlier first)
/// 2. Sequence number (FIFO for equal times)
///
/// The sequence is a global insertion counter, so two events scheduled for
/// the same timestamp always fire in the order they were scheduled. This is
/// what makes traces reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventKey {
    /// When this event fires.
    pub time: Duration,
    /// Insertion-order tie-break.
    pub sequence: u64,
}

/// All events the engine can process.
#[derive(Debug, Clone)]
pub enum Event {
    /// A named timer scheduled by `node` has fired.
    TimerFired { node: NodeId, name: String },

    /// A message sent by `from` arrives at `to`.
    PacketArrived {
        to: NodeId,
        from: NodeId,
        message: String,
    },

    /// Periodic mobility update: interpolate positions and deliver
    /// telemetry to every node.
    TelemetryTick,

    /// Periodic visualization snapshot collection.
    VisualizationTick,
}

impl Event {
    /// Get a human-readable name for this event type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::TimerFired { .. } => "TimerFired",
            Event::PacketArrived { .. } => "PacketArrived",
            Event::TelemetryTick => "TelemetryTick",
            Event::VisualizationTick => "VisualizationTick",
        }
    }
}

/// Time-ordered event queue driving the simulation.
///
/// `current_time` is monotonically non-decreasing: popping an event
/// advances it to the event's timestamp, and scheduling in the past is an
/// invariant violation.
#[derive(Debug, Default)]
pub struct EventLoop {
    queue: BTreeMap<EventKey, Event>,
    now: Duration,
    sequence: u64,
}

impl EventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulation time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Timestamp of the next pending event, if any.
    pub fn peek_time(&self) -> Option<Duration> {
        self.queue.first_key_value().map(|(key, _)| key.time)
    }

    /// Schedule an event at an absolute timestamp.
    ///
    /// Fails if `at` is earlier than the current time.
    pub fn schedule(&mut self, at: Duration, event: Event) -> Result<EventKey, SimulationError> {
        if at < self.now {
            return Err(SimulationError::SchedulingInPast {
                requested: at,
                now: self.now,
            });
        }
        Ok(self.insert(at, event))
    }

    /// Schedule an event `delay` after the current time.
    ///
    /// Never fails: `now + delay` cannot precede `now`.
    pub fn schedule_in(&mut self, delay: Duration, event: Event) -> EventKey {
        self.insert(self.now + delay, event)
    }

    fn insert(&mut self, at: Duration, event: Event) -> EventKey {
        self.sequence += 1;
        let key = EventKey {
            time: at,
            sequence: self.sequence,
        };
        self.queue.insert(key, event);
        key
    }

    /// Remove a pending event. Returns whether it was still pending.
    pub fn cancel(&mut self, key: &EventKey) -> bool {
        self.queue.remove(key).is_some()
    }

    /// Pop the earliest event, advancing the current time to its
    /// timestamp. The callback dispatched for the popped event therefore
    /// observes its own firing time as "now".
    pub fn pop(&mut self) -> Option<(EventKey, Event)> {
        let (key, event) = self.queue.pop_first()?;
        self.now = key.time;
        Some((key, event))
    }
}
