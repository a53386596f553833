//! Simulation assembly and the central dispatch loop.
//!
//! [`SimulationBuilder`] collects nodes, handler configurations, and
//! assertions, validates everything up front, and produces a [`Simulator`].
//! The simulator pops one event at a time from the queue, dispatches it to
//! the owning node or handler, then drains and routes the provider commands
//! the callback produced. Between `build` and `run` nothing external is
//! consulted, so a given seed always replays the same trace.

use crate::encapsulator::ProviderCommand;
use crate::event::{Event, EventLoop};
use crate::handler::{
    Assertion, AssertionHandler, CommunicationHandler, CommunicationMedium, MobilityConfig,
    MobilityHandler, TimerHandler, VisualizationConfig, VisualizationHandler,
};
use crate::node::Node;
use crate::SimulationError;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::time::Duration;
use swarmsim_protocol::{Encapsulator, Protocol, Telemetry};
use swarmsim_types::{NodeId, Position};
use tracing::{debug, info, trace, warn};

/// Counters accumulated over a run.
///
/// Purely diagnostic: nothing in the engine branches on these values, so
/// they are safe to read mid-run and compare across seeds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SimulationStats {
    /// Events popped and dispatched.
    pub events_processed: u64,
    /// Messages scheduled for delivery.
    pub messages_sent: u64,
    /// Messages dropped because the recipient was out of range.
    pub messages_dropped_range: u64,
    /// Messages dropped by the loss trial.
    pub messages_dropped_loss: u64,
    /// Timers scheduled (including reschedules of a pending name).
    pub timers_set: u64,
    /// Pending timers cancelled.
    pub timers_cancelled: u64,
    /// Cancels of names with nothing pending.
    pub timer_cancel_noops: u64,
    /// Telemetry callbacks delivered.
    pub telemetry_updates: u64,
    /// Visualization snapshots handed to the transport.
    pub visualization_updates: u64,
    /// Visualization snapshots evicted by newer ones.
    pub visualization_drops: u64,
}

impl SimulationStats {
    /// Fraction of transmission attempts that were scheduled for delivery.
    ///
    /// Returns 1.0 when nothing was attempted.
    pub fn delivery_rate(&self) -> f64 {
        let attempted = self.messages_sent + self.messages_dropped_range + self.messages_dropped_loss;
        if attempted == 0 {
            return 1.0;
        }
        self.messages_sent as f64 / attempted as f64
    }
}

/// Run-level limits and the determinism seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Simulation-time horizon. Events past it never fire.
    pub duration: Option<Duration>,
    /// Hard cap on processed events.
    pub max_iterations: Option<u64>,
    /// Seed for all randomness in the run (loss trials, delay jitter).
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration: None,
            max_iterations: None,
            seed: 12345,
        }
    }
}

type TerminationPredicate = Box<dyn FnMut(&[Node], Duration, u64) -> bool>;

/// Assembles a [`Simulator`] from nodes, handler configurations, and
/// assertions.
///
/// Configuration errors surface from [`build`](Self::build), before any
/// event is processed.
#[derive(Default)]
pub struct SimulationBuilder {
    config: SimulationConfig,
    nodes: Vec<(Position, Box<dyn Protocol>)>,
    medium: Option<CommunicationMedium>,
    mobility: Option<MobilityConfig>,
    visualization: Option<VisualizationConfig>,
    assertions: Vec<Assertion>,
    termination: Option<TerminationPredicate>,
}

impl SimulationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node at `position` running `protocol`.
    ///
    /// Node identifiers are assigned densely in insertion order, starting
    /// at zero.
    pub fn add_node(mut self, position: impl Into<Position>, protocol: impl Protocol + 'static) -> Self {
        self.nodes.push((position.into(), Box::new(protocol)));
        self
    }

    /// Enable message exchange through the given medium.
    pub fn with_communication(mut self, medium: CommunicationMedium) -> Self {
        self.medium = Some(medium);
        self
    }

    /// Enable mobility and the periodic telemetry tick.
    pub fn with_mobility(mut self, config: MobilityConfig) -> Self {
        self.mobility = Some(config);
        self
    }

    /// Enable streaming of node state to external viewers.
    pub fn with_visualization(mut self, config: VisualizationConfig) -> Self {
        self.visualization = Some(config);
        self
    }

    /// Register an assertion checked after every processed event.
    pub fn with_assertion(mut self, assertion: Assertion) -> Self {
        self.assertions.push(assertion);
        self
    }

    /// Stop once the next event would fire past this simulation time.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.config.duration = Some(duration);
        self
    }

    /// Stop after this many processed events.
    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.config.max_iterations = Some(max_iterations);
        self
    }

    /// Stop as soon as the predicate returns true. Checked after every
    /// processed event with the node snapshot, current time, and iteration
    /// count.
    pub fn with_termination<F>(mut self, predicate: F) -> Self
    where
        F: FnMut(&[Node], Duration, u64) -> bool + 'static,
    {
        self.termination = Some(Box::new(predicate));
        self
    }

    /// Seed for the run's random number generator. Runs with the same
    /// scenario and seed produce identical traces.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Validate the configuration and assemble the simulator.
    pub fn build(self) -> Result<Simulator, SimulationError> {
        if self.nodes.is_empty() {
            warn!("building a simulation with no nodes");
        }
        if let Some(medium) = &self.medium {
            medium.validate()?;
        }
        if let Some(mobility) = &self.mobility {
            mobility.validate()?;
        }

        let nodes = self
            .nodes
            .into_iter()
            .enumerate()
            .map(|(index, (position, protocol))| {
                Node::new(NodeId(index as u32), position, protocol)
            })
            .collect::<Vec<_>>();

        let mut events = EventLoop::new();
        let mobility = self.mobility.map(|config| {
            events.schedule_in(config.update_rate, Event::TelemetryTick);
            MobilityHandler::new(config)
        });
        let visualization = match self.visualization {
            Some(config) => {
                events.schedule_in(config.collection_interval, Event::VisualizationTick);
                Some(VisualizationHandler::start(config)?)
            }
            None => None,
        };

        info!(
            nodes = nodes.len(),
            seed = self.config.seed,
            communication = self.medium.is_some(),
            mobility = mobility.is_some(),
            visualization = visualization.is_some(),
            "simulation assembled"
        );

        Ok(Simulator {
            rng: ChaCha8Rng::seed_from_u64(self.config.seed),
            nodes,
            events,
            communication: self.medium.map(CommunicationHandler::new),
            mobility,
            timers: TimerHandler::new(),
            assertions: AssertionHandler::new(self.assertions),
            visualization,
            termination: self.termination,
            config: self.config,
            stats: SimulationStats::default(),
            iteration: 0,
            initialized: false,
            finished: false,
        })
    }
}

/// The running simulation.
pub struct Simulator {
    nodes: Vec<Node>,
    events: EventLoop,
    communication: Option<CommunicationHandler>,
    mobility: Option<MobilityHandler>,
    timers: TimerHandler,
    assertions: AssertionHandler,
    visualization: Option<VisualizationHandler>,
    termination: Option<TerminationPredicate>,
    config: SimulationConfig,
    rng: ChaCha8Rng,
    stats: SimulationStats,
    iteration: u64,
    initialized: bool,
    finished: bool,
}

impl Simulator {
    /// Run to completion: process events until a stop condition holds, then
    /// finalize.
    pub fn run(&mut self) -> Result<(), SimulationError> {
        while self.step()? {}
        self.finish()
    }

    /// Process a single event.
    ///
    /// The first call delivers `initialize` to every node before touching
    /// the queue. Returns `Ok(false)` once a stop condition holds: queue
    /// exhausted, duration horizon reached, iteration cap hit, or the
    /// termination predicate fired.
    pub fn step(&mut self) -> Result<bool, SimulationError> {
        if !self.initialized {
            self.initialized = true;
            self.initialize()?;
        }
        if self.finished || self.limit_reached() {
            return Ok(false);
        }

        let Some((key, event)) = self.events.pop() else {
            return Ok(false);
        };
        trace!(time = ?key.time, event = event.type_name(), "dispatching");
        self.dispatch(event)?;
        self.stats.events_processed += 1;
        self.iteration += 1;

        self.assertions
            .after_step(&self.nodes, self.events.now(), self.iteration)?;

        if let Some(predicate) = &mut self.termination {
            if predicate(&self.nodes, self.events.now(), self.iteration) {
                debug!(
                    time = ?self.events.now(),
                    iteration = self.iteration,
                    "termination predicate fired"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Finalize the run: deliver `finish` to every node, verify
    /// "eventually" assertions, and stop the visualization transport.
    /// Idempotent.
    pub fn finish(&mut self) -> Result<(), SimulationError> {
        if self.finished {
            return Ok(());
        }
        if !self.initialized {
            self.initialized = true;
            self.initialize()?;
        }
        self.finished = true;

        let now = self.events.now();
        for index in 0..self.nodes.len() {
            let encapsulator = self.nodes[index].encapsulator_mut();
            encapsulator.set_time(now);
            encapsulator.finish();
            self.route_commands(index)?;
        }

        self.assertions.finalize(now, self.iteration)?;

        if let Some(visualization) = &mut self.visualization {
            visualization.shutdown();
        }

        info!(
            time = ?now,
            events = self.stats.events_processed,
            messages_sent = self.stats.messages_sent,
            delivery_rate = self.stats.delivery_rate(),
            "simulation finished"
        );
        Ok(())
    }

    /// Current simulation time.
    pub fn now(&self) -> Duration {
        self.events.now()
    }

    /// Number of events processed so far.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    /// Downcast one node's protocol to its concrete type.
    pub fn protocol<P: Protocol + 'static>(&self, id: NodeId) -> Option<&P> {
        self.node(id)?.protocol::<P>()
    }

    fn initialize(&mut self) -> Result<(), SimulationError> {
        debug!(nodes = self.nodes.len(), "initializing protocols");
        let now = self.events.now();
        for index in 0..self.nodes.len() {
            let encapsulator = self.nodes[index].encapsulator_mut();
            encapsulator.set_time(now);
            encapsulator.initialize();
            self.route_commands(index)?;
        }
        Ok(())
    }

    fn limit_reached(&self) -> bool {
        if let Some(max) = self.config.max_iterations {
            if self.iteration >= max {
                return true;
            }
        }
        if let Some(duration) = self.config.duration {
            match self.events.peek_time() {
                Some(next) if next > duration => return true,
                None | Some(_) => {}
            }
        }
        false
    }

    fn dispatch(&mut self, event: Event) -> Result<(), SimulationError> {
        let now = self.events.now();
        match event {
            Event::TimerFired { node, name } => {
                self.timers.on_fired(node, &name);
                let index = node.0 as usize;
                let encapsulator = self.nodes[index].encapsulator_mut();
                encapsulator.set_time(now);
                encapsulator.handle_timer(&name);
                self.route_commands(index)?;
            }
            Event::PacketArrived { to, from, message } => {
                let index = to.0 as usize;
                let encapsulator = self.nodes[index].encapsulator_mut();
                encapsulator.set_time(now);
                encapsulator.handle_packet(from, &message);
                self.route_commands(index)?;
            }
            Event::TelemetryTick => {
                // Move every node one interpolation step, then deliver
                // telemetry from the updated positions.
                if let Some(mobility) = &mut self.mobility {
                    for node in &mut self.nodes {
                        let id = node.id();
                        let current = node.position();
                        if let Some(next) = mobility.advance(id, current) {
                            node.set_position(next);
                        }
                    }
                }
                for index in 0..self.nodes.len() {
                    let telemetry = Telemetry {
                        current_position: self.nodes[index].position(),
                    };
                    let encapsulator = self.nodes[index].encapsulator_mut();
                    encapsulator.set_time(now);
                    encapsulator.handle_telemetry(&telemetry);
                    self.stats.telemetry_updates += 1;
                    self.route_commands(index)?;
                }
                if let Some(mobility) = &self.mobility {
                    self.events
                        .schedule_in(mobility.config().update_rate, Event::TelemetryTick);
                }
            }
            Event::VisualizationTick => {
                if let Some(visualization) = &mut self.visualization {
                    visualization.collect(&self.nodes, now, &mut self.stats);
                    self.events
                        .schedule_in(visualization.collection_interval(), Event::VisualizationTick);
                }
            }
        }
        Ok(())
    }

    /// Route the commands a protocol callback buffered in its provider.
    ///
    /// Commands addressed to an unconfigured handler are logged and
    /// dropped; the run continues.
    fn route_commands(&mut self, index: usize) -> Result<(), SimulationError> {
        let node_id = self.nodes[index].id();
        let commands = self.nodes[index].encapsulator_mut().drain_commands();
        for command in commands {
            match command {
                ProviderCommand::Communication(command) => match &self.communication {
                    Some(handler) => handler.handle_command(
                        command,
                        node_id,
                        &self.nodes,
                        &mut self.events,
                        &mut self.rng,
                        &mut self.stats,
                    )?,
                    None => warn!(
                        node = %node_id,
                        command = command.type_name(),
                        "communication command dropped: no medium configured"
                    ),
                },
                ProviderCommand::Mobility(command) => match &mut self.mobility {
                    Some(handler) => handler.handle_command(command, &mut self.nodes[index]),
                    None => warn!(
                        node = %node_id,
                        "mobility command dropped: mobility not configured"
                    ),
                },
                ProviderCommand::SetTimer { name, delay } => {
                    self.timers
                        .set_timer(node_id, name, delay, &mut self.events, &mut self.stats);
                }
                ProviderCommand::CancelTimer { name } => {
                    self.timers
                        .cancel_timer(node_id, &name, &mut self.events, &mut self.stats);
                }
                ProviderCommand::Visualization(command) => match &mut self.visualization {
                    Some(handler) => handler.handle_command(node_id, command),
                    None => debug!(
                        node = %node_id,
                        "visualization command dropped: visualization not configured"
                    ),
                },
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("nodes", &self.nodes.len())
            .field("pending_events", &self.events.len())
            .field("now", &self.events.now())
            .field("iteration", &self.iteration)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Delay;
    use swarmsim_protocol::Provider;

    #[derive(Default)]
    struct Beacon {
        received: u32,
    }

    impl Protocol for Beacon {
        fn initialize(&mut self, provider: &mut dyn Provider) {
            provider.broadcast("hello".into());
        }

        fn handle_packet(&mut self, _provider: &mut dyn Provider, _sender: NodeId, _message: &str) {
            self.received += 1;
        }
    }

    #[test]
    fn test_build_rejects_invalid_medium() {
        let result = SimulationBuilder::new()
            .with_communication(CommunicationMedium {
                failure_probability: 2.0,
                ..Default::default()
            })
            .build();
        assert!(matches!(result, Err(SimulationError::Config(_))));
    }

    #[test]
    fn test_initial_broadcast_reaches_other_node() {
        let mut simulator = SimulationBuilder::new()
            .add_node((0.0, 0.0, 0.0), Beacon::default())
            .add_node((1.0, 0.0, 0.0), Beacon::default())
            .with_communication(CommunicationMedium::default())
            .build()
            .unwrap();
        simulator.run().unwrap();

        assert_eq!(simulator.stats().messages_sent, 2);
        for id in [NodeId(0), NodeId(1)] {
            assert_eq!(simulator.protocol::<Beacon>(id).unwrap().received, 1);
        }
    }

    #[tracing_test::traced_test]
    #[test]
    fn test_run_without_handlers_terminates() {
        let mut simulator = SimulationBuilder::new()
            .add_node((0.0, 0.0, 0.0), Beacon::default())
            .build()
            .unwrap();
        // The broadcast is dropped (no medium), leaving an empty queue.
        simulator.run().unwrap();
        assert_eq!(simulator.stats().events_processed, 0);
        assert!(logs_contain("communication command dropped"));
    }

    #[test]
    fn test_max_iterations_caps_run() {
        let mut simulator = SimulationBuilder::new()
            .add_node((0.0, 0.0, 0.0), Beacon::default())
            .add_node((1.0, 0.0, 0.0), Beacon::default())
            .with_communication(CommunicationMedium {
                delay: Delay::Fixed(Duration::from_millis(10)),
                ..Default::default()
            })
            .with_max_iterations(1)
            .build()
            .unwrap();
        simulator.run().unwrap();
        assert_eq!(simulator.stats().events_processed, 1);
    }
}
