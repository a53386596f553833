//! Message delivery subject to range, delay, and probabilistic loss.

use crate::event::{Event, EventLoop};
use crate::node::Node;
use crate::runner::SimulationStats;
use crate::SimulationError;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;
use swarmsim_protocol::CommunicationCommand;
use swarmsim_types::NodeId;
use tracing::trace;

/// Message latency model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delay {
    /// Every message takes exactly this long.
    Fixed(Duration),
    /// Latency sampled uniformly per message from `[min, max]`.
    Uniform { min: Duration, max: Duration },
}

impl Delay {
    fn sample(&self, rng: &mut ChaCha8Rng) -> Duration {
        match self {
            Delay::Fixed(delay) => *delay,
            Delay::Uniform { min, max } => {
                if min == max {
                    return *min;
                }
                let secs = rng.gen_range(min.as_secs_f64()..=max.as_secs_f64());
                Duration::from_secs_f64(secs)
            }
        }
    }
}

/// Conditions through which messages travel.
///
/// Determines whether and when a message issued by one node reaches
/// another. Loss and out-of-range drops are silent: real networks do not
/// notify senders of silent loss, so protocols observe nothing and only
/// [`SimulationStats`] counts the drops.
#[derive(Debug, Clone, PartialEq)]
pub struct CommunicationMedium {
    /// Maximum delivery distance in meters. `None` means unlimited.
    pub range: Option<f64>,
    /// Delivery latency.
    pub delay: Delay,
    /// Independent per-message failure probability in `[0, 1]`.
    pub failure_probability: f64,
}

impl Default for CommunicationMedium {
    fn default() -> Self {
        Self {
            range: None,
            delay: Delay::Fixed(Duration::ZERO),
            failure_probability: 0.0,
        }
    }
}

impl CommunicationMedium {
    /// Validate the medium at assembly time, before any event is scheduled.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if let Some(range) = self.range {
            if !range.is_finite() || range < 0.0 {
                return Err(SimulationError::Config(format!(
                    "communication range must be a non-negative finite number, got {range}"
                )));
            }
        }
        if let Delay::Uniform { min, max } = self.delay {
            if min > max {
                return Err(SimulationError::Config(format!(
                    "communication delay distribution is inverted: min {min:?} > max {max:?}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.failure_probability) {
            return Err(SimulationError::Config(format!(
                "failure probability must be within [0, 1], got {}",
                self.failure_probability
            )));
        }
        Ok(())
    }

    /// Whether a message between these positions is within reach.
    ///
    /// Inclusive at the boundary: `distance == range` still delivers.
    fn in_range(&self, sender: &swarmsim_types::Position, recipient: &swarmsim_types::Position) -> bool {
        match self.range {
            None => true,
            Some(range) => sender.squared_distance(recipient) <= range * range,
        }
    }
}

/// Routes communication commands into scheduled packet deliveries.
#[derive(Debug)]
pub struct CommunicationHandler {
    medium: CommunicationMedium,
}

impl CommunicationHandler {
    pub fn new(medium: CommunicationMedium) -> Self {
        Self { medium }
    }

    /// Perform a communication command issued by `sender`.
    ///
    /// Enumerates candidate recipients, applies the range check with
    /// positions captured at send time, draws an independent loss trial
    /// per surviving candidate, and schedules a `PacketArrived` event at
    /// `now + delay` for each delivery.
    pub fn handle_command(
        &self,
        command: CommunicationCommand,
        sender: NodeId,
        nodes: &[Node],
        events: &mut EventLoop,
        rng: &mut ChaCha8Rng,
        stats: &mut SimulationStats,
    ) -> Result<(), SimulationError> {
        match command {
            CommunicationCommand::Broadcast { message } => {
                for recipient in nodes.iter().map(Node::id) {
                    if recipient != sender {
                        self.transmit(&message, sender, recipient, nodes, events, rng, stats);
                    }
                }
                Ok(())
            }
            CommunicationCommand::Send { message, to } => {
                if to == sender {
                    return Err(SimulationError::SelfDestination(sender));
                }
                if to.0 as usize >= nodes.len() {
                    return Err(SimulationError::UnknownDestination(to));
                }
                self.transmit(&message, sender, to, nodes, events, rng, stats);
                Ok(())
            }
        }
    }

    fn transmit(
        &self,
        message: &str,
        from: NodeId,
        to: NodeId,
        nodes: &[Node],
        events: &mut EventLoop,
        rng: &mut ChaCha8Rng,
        stats: &mut SimulationStats,
    ) {
        let sender_position = nodes[from.0 as usize].position();
        let recipient_position = nodes[to.0 as usize].position();

        if !self.medium.in_range(&sender_position, &recipient_position) {
            stats.messages_dropped_range += 1;
            trace!(%from, %to, "message dropped: recipient out of range");
            return;
        }

        if self.medium.failure_probability > 0.0
            && rng.gen::<f64>() < self.medium.failure_probability
        {
            stats.messages_dropped_loss += 1;
            trace!(%from, %to, "message dropped: loss trial failed");
            return;
        }

        let delay = self.medium.delay.sample(rng);
        events.schedule_in(
            delay,
            Event::PacketArrived {
                to,
                from,
                message: message.to_owned(),
            },
        );
        stats.messages_sent += 1;
        trace!(%from, %to, ?delay, "message scheduled for delivery");
    }
}
