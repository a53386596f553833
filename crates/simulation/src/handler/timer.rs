//! Named per-node timers with cancel and replace semantics.

use crate::event::{Event, EventKey, EventLoop};
use crate::runner::SimulationStats;
use std::collections::HashMap;
use std::time::Duration;
use swarmsim_types::NodeId;
use tracing::trace;

/// Schedules timer events and supports cancellation by name.
///
/// Each `(node, name)` pair has at most one pending timer. Scheduling an
/// already-pending name removes the old event from the queue first
/// (cancel-then-schedule), so exactly one firing results, at the newest
/// delay.
#[derive(Debug, Default)]
pub struct TimerHandler {
    pending: HashMap<(NodeId, String), EventKey>,
}

impl TimerHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_timer(
        &mut self,
        node: NodeId,
        name: String,
        delay: Duration,
        events: &mut EventLoop,
        stats: &mut SimulationStats,
    ) {
        let key = events.schedule_in(
            delay,
            Event::TimerFired {
                node,
                name: name.clone(),
            },
        );
        if let Some(superseded) = self.pending.insert((node, name), key) {
            events.cancel(&superseded);
        }
        stats.timers_set += 1;
    }

    /// Cancel a pending timer. Canceling a name with nothing pending is a
    /// silent no-op, counted only in the diagnostic
    /// `timer_cancel_noops` statistic.
    pub fn cancel_timer(
        &mut self,
        node: NodeId,
        name: &str,
        events: &mut EventLoop,
        stats: &mut SimulationStats,
    ) {
        match self.pending.remove(&(node, name.to_owned())) {
            Some(key) => {
                events.cancel(&key);
                stats.timers_cancelled += 1;
            }
            None => {
                stats.timer_cancel_noops += 1;
                trace!(%node, name, "cancel of unknown timer ignored");
            }
        }
    }

    /// Forget a timer that just fired, so a later cancel of the same name
    /// is a no-op rather than a stale queue removal.
    pub fn on_fired(&mut self, node: NodeId, name: &str) {
        self.pending.remove(&(node, name.to_owned()));
    }
}
