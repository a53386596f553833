//! Best-effort streaming of node state to external viewers.
//!
//! This handler is the one deliberate escape from the deterministic event
//! timeline. Snapshot collection happens on a scheduled tick, but delivery
//! runs on a separate transport thread serving connected viewers over TCP
//! as newline-delimited JSON. The channel between the two is bounded and
//! drop-oldest-on-full: a slow or absent viewer can never stall simulation
//! time, and a dropped update never affects simulation correctness.

use crate::node::Node;
use crate::runner::SimulationStats;
use crate::SimulationError;
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::JoinHandle;
use std::time::Duration;
use swarmsim_protocol::VisualizationCommand;
use swarmsim_types::{NodeId, Position};
use tracing::{debug, info};

/// Depth of the update channel between the simulation thread and the
/// transport thread.
const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// Configuration for the visualization handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualizationConfig {
    /// Interval in simulation time between snapshot collections.
    pub collection_interval: Duration,
    /// Address the stream server binds to.
    pub host: String,
    /// Port the stream server binds to.
    pub port: u16,
    /// Log the viewer URL at startup so it can be opened manually.
    pub open_viewer: bool,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            collection_interval: Duration::from_millis(100),
            host: "127.0.0.1".into(),
            port: 5678,
            open_viewer: false,
        }
    }
}

impl VisualizationConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.collection_interval.is_zero() {
            return Err(SimulationError::Config(
                "visualization collection interval must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// One node's entry in a streamed update.
#[derive(Debug, Clone, Serialize)]
pub struct NodeRecord {
    pub id: u32,
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A snapshot of all node state at one collection tick.
///
/// The stream is an append-only sequence of these records; viewers joining
/// late simply start from the next update.
#[derive(Debug, Clone, Serialize)]
pub struct VisualizationUpdate {
    /// Simulation time of the snapshot, in seconds.
    pub timestamp: f64,
    pub nodes: Vec<NodeRecord>,
}

#[derive(Debug, Default, Clone)]
struct Annotation {
    color: Option<String>,
    label: Option<String>,
}

/// Collects node snapshots and hands them to the transport thread.
pub struct VisualizationHandler {
    config: VisualizationConfig,
    annotations: HashMap<NodeId, Annotation>,
    sender: Option<Sender<VisualizationUpdate>>,
    /// Same channel as the transport's receiver; used to evict the oldest
    /// pending update when the channel is full.
    evictor: Receiver<VisualizationUpdate>,
    transport: Option<JoinHandle<()>>,
    addr: SocketAddr,
}

impl VisualizationHandler {
    /// Bind the stream server and start the transport thread.
    ///
    /// Fails fast at assembly time if the address cannot be bound.
    pub fn start(config: VisualizationConfig) -> Result<Self, SimulationError> {
        config.validate()?;

        let listener = TcpListener::bind((config.host.as_str(), config.port))?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;
        info!(%addr, "visualization stream listening");
        if config.open_viewer {
            info!("connect a viewer to tcp://{addr} to watch this run");
        }

        let (sender, receiver) = bounded(UPDATE_CHANNEL_CAPACITY);
        let evictor = receiver.clone();
        let transport = std::thread::Builder::new()
            .name("swarmsim-viz".into())
            .spawn(move || transport_loop(listener, receiver))?;

        Ok(Self {
            config,
            annotations: HashMap::new(),
            sender: Some(sender),
            evictor,
            transport: Some(transport),
            addr,
        })
    }

    pub fn collection_interval(&self) -> Duration {
        self.config.collection_interval
    }

    /// Address the stream server actually bound, useful with port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// A handler whose channel nothing consumes, for overflow tests.
    #[cfg(test)]
    fn without_transport(config: VisualizationConfig) -> Self {
        let (sender, receiver) = bounded(UPDATE_CHANNEL_CAPACITY);
        Self {
            config,
            annotations: HashMap::new(),
            sender: Some(sender),
            evictor: receiver,
            transport: None,
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        }
    }

    /// Apply a visualization command issued by `node` through its provider.
    pub fn handle_command(&mut self, node: NodeId, command: VisualizationCommand) {
        let annotation = self.annotations.entry(node).or_default();
        match command {
            VisualizationCommand::SetColor(color) => annotation.color = Some(color),
            VisualizationCommand::SetLabel(label) => annotation.label = Some(label),
        }
    }

    /// Snapshot all nodes and push the update to the transport.
    ///
    /// Never blocks: when the channel is full the oldest pending update is
    /// evicted to make room (viewers prefer fresh state over complete
    /// history).
    pub fn collect(&mut self, nodes: &[Node], now: Duration, stats: &mut SimulationStats) {
        let Some(sender) = self.sender.as_ref() else {
            return;
        };

        let update = VisualizationUpdate {
            timestamp: now.as_secs_f64(),
            nodes: nodes
                .iter()
                .map(|node| {
                    let annotation = self.annotations.get(&node.id());
                    NodeRecord {
                        id: node.id().as_u32(),
                        position: node.position(),
                        color: annotation.and_then(|a| a.color.clone()),
                        label: annotation.and_then(|a| a.label.clone()),
                    }
                })
                .collect(),
        };

        let update = match sender.try_send(update) {
            Ok(()) => {
                stats.visualization_updates += 1;
                return;
            }
            Err(TrySendError::Full(update)) => update,
            Err(TrySendError::Disconnected(_)) => return,
        };

        // Full channel: evict the oldest update and retry once.
        let _ = self.evictor.try_recv();
        stats.visualization_drops += 1;
        if sender.try_send(update).is_ok() {
            stats.visualization_updates += 1;
        }
    }

    /// Stop the transport thread. Idempotent.
    pub fn shutdown(&mut self) {
        // Dropping the sender disconnects the channel and ends the loop.
        self.sender = None;
        if let Some(transport) = self.transport.take() {
            let _ = transport.join();
            debug!("visualization transport stopped");
        }
    }
}

impl Drop for VisualizationHandler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for VisualizationHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisualizationHandler")
            .field("config", &self.config)
            .field("annotations", &self.annotations.len())
            .finish_non_exhaustive()
    }
}

/// Transport loop: accept viewers, forward updates, drop broken pipes.
///
/// Runs until the simulation side drops its sender.
fn transport_loop(listener: TcpListener, receiver: Receiver<VisualizationUpdate>) {
    let mut viewers: Vec<TcpStream> = Vec::new();

    loop {
        // Accept any pending viewers without blocking.
        loop {
            match listener.accept() {
                Ok((stream, peer)) => {
                    debug!(%peer, "viewer connected");
                    viewers.push(stream);
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    debug!(error = %e, "viewer accept failed");
                    break;
                }
            }
        }

        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(update) => {
                if viewers.is_empty() {
                    continue;
                }
                let Ok(line) = serde_json::to_string(&update) else {
                    continue;
                };
                viewers.retain_mut(|viewer| writeln!(viewer, "{line}").is_ok());
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
