//! Prototype-mode binding of a protocol to the simulation engine.
//!
//! The provider here does not act on the world directly. Every command is
//! recorded into an outbox which the simulator drains after the protocol
//! callback returns, routing each entry to the owning handler. This keeps
//! protocol callbacks free of engine borrows and makes the command stream
//! inspectable.

use std::time::Duration;
use swarmsim_protocol::{
    CommunicationCommand, Encapsulator, MobilityCommand, Protocol, Provider, Telemetry,
    VisualizationCommand,
};
use swarmsim_types::NodeId;
use tracing::warn;

/// A provider command buffered for routing by the simulator.
#[derive(Debug, Clone)]
pub enum ProviderCommand {
    Communication(CommunicationCommand),
    Mobility(MobilityCommand),
    SetTimer { name: String, delay: Duration },
    CancelTimer { name: String },
    Visualization(VisualizationCommand),
}

/// Prototype-mode [`Provider`]: records commands into an outbox.
///
/// Stateless apart from the outbox and the identity/time snapshot the
/// engine refreshes before each callback.
#[derive(Debug)]
pub struct PrototypeProvider {
    node_id: NodeId,
    now: Duration,
    outbox: Vec<ProviderCommand>,
}

impl PrototypeProvider {
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            now: Duration::ZERO,
            outbox: Vec::new(),
        }
    }

    /// Refresh the provider's view of simulation time. Called by the
    /// engine before each protocol callback.
    pub fn set_time(&mut self, now: Duration) {
        self.now = now;
    }

    /// Drain all commands buffered since the last drain.
    pub fn drain_commands(&mut self) -> Vec<ProviderCommand> {
        std::mem::take(&mut self.outbox)
    }
}

impl Provider for PrototypeProvider {
    fn send(&mut self, message: String, to: NodeId) {
        self.outbox
            .push(ProviderCommand::Communication(CommunicationCommand::Send {
                message,
                to,
            }));
    }

    fn broadcast(&mut self, message: String) {
        self.outbox.push(ProviderCommand::Communication(
            CommunicationCommand::Broadcast { message },
        ));
    }

    fn schedule_timer(&mut self, name: &str, delay: Duration) {
        self.outbox.push(ProviderCommand::SetTimer {
            name: name.to_owned(),
            delay,
        });
    }

    fn cancel_timer(&mut self, name: &str) {
        self.outbox.push(ProviderCommand::CancelTimer {
            name: name.to_owned(),
        });
    }

    fn set_mobility(&mut self, command: MobilityCommand) {
        self.outbox.push(ProviderCommand::Mobility(command));
    }

    fn send_visualization(&mut self, command: VisualizationCommand) {
        self.outbox.push(ProviderCommand::Visualization(command));
    }

    fn current_time(&self) -> Duration {
        self.now
    }

    fn self_id(&self) -> NodeId {
        self.node_id
    }
}

/// Protocol lifecycle phase.
///
/// Created → Reacting (after `initialize`) → Finalized (after `finish`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    Reacting,
    Finalized,
}

/// Binds a protocol instance to a [`PrototypeProvider`].
///
/// Enforces the lifecycle contract: `initialize` and `finish` are
/// delivered at most once, and no reaction callback reaches the protocol
/// outside the Reacting phase.
pub struct PrototypeEncapsulator {
    protocol: Box<dyn Protocol>,
    provider: PrototypeProvider,
    phase: Phase,
}

impl PrototypeEncapsulator {
    pub fn new(protocol: Box<dyn Protocol>, node_id: NodeId) -> Self {
        Self {
            protocol,
            provider: PrototypeProvider::new(node_id),
            phase: Phase::Created,
        }
    }

    pub fn set_time(&mut self, now: Duration) {
        self.provider.set_time(now);
    }

    pub fn drain_commands(&mut self) -> Vec<ProviderCommand> {
        self.provider.drain_commands()
    }

    /// Read-only access to the protocol, for assertions and tests.
    pub fn protocol(&self) -> &dyn Protocol {
        self.protocol.as_ref()
    }

    fn reacting(&self, callback: &str) -> bool {
        if self.phase != Phase::Reacting {
            warn!(
                node = %self.provider.self_id(),
                callback,
                phase = ?self.phase,
                "dropping callback outside reacting phase"
            );
            return false;
        }
        true
    }
}

impl Encapsulator for PrototypeEncapsulator {
    fn initialize(&mut self) {
        if self.phase != Phase::Created {
            warn!(node = %self.provider.self_id(), "duplicate initialize ignored");
            return;
        }
        self.phase = Phase::Reacting;
        self.protocol.initialize(&mut self.provider);
    }

    fn handle_timer(&mut self, timer: &str) {
        if self.reacting("handle_timer") {
            self.protocol.handle_timer(&mut self.provider, timer);
        }
    }

    fn handle_packet(&mut self, sender: NodeId, message: &str) {
        if self.reacting("handle_packet") {
            self.protocol.handle_packet(&mut self.provider, sender, message);
        }
    }

    fn handle_telemetry(&mut self, telemetry: &Telemetry) {
        if self.reacting("handle_telemetry") {
            self.protocol.handle_telemetry(&mut self.provider, telemetry);
        }
    }

    fn finish(&mut self) {
        if self.phase != Phase::Reacting {
            warn!(node = %self.provider.self_id(), "finish outside reacting phase ignored");
            return;
        }
        self.phase = Phase::Finalized;
        self.protocol.finish(&mut self.provider);
    }
}

impl std::fmt::Debug for PrototypeEncapsulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrototypeEncapsulator")
            .field("provider", &self.provider)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}
