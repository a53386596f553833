//! Prototype-mode discrete-event simulation of decentralized node
//! protocols.
//!
//! A scenario is assembled from a [`SimulationBuilder`]: nodes running
//! [`Protocol`](swarmsim_protocol::Protocol) implementations, plus the
//! handlers that give their commands meaning (communication, mobility,
//! timers, assertions, visualization). The resulting [`Simulator`] pops
//! events off a time-ordered queue one at a time and dispatches each to
//! the owning node; commands the protocol issues through its provider are
//! buffered and routed to handlers after the callback returns.
//!
//! Everything except visualization delivery is deterministic: the event
//! queue breaks timestamp ties by insertion order, and all randomness
//! (message loss, delay jitter) flows from a single seeded generator, so
//! a scenario replayed with the same seed produces the same trace.
//!
//! ```no_run
//! use swarmsim_simulation::{CommunicationMedium, SimulationBuilder};
//! use swarmsim_protocol::{Protocol, Provider};
//!
//! struct Ping;
//!
//! impl Protocol for Ping {
//!     fn initialize(&mut self, provider: &mut dyn Provider) {
//!         provider.broadcast("ping".into());
//!     }
//! }
//!
//! # fn main() -> Result<(), swarmsim_simulation::SimulationError> {
//! let mut simulator = SimulationBuilder::new()
//!     .add_node((0.0, 0.0, 0.0), Ping)
//!     .add_node((10.0, 0.0, 0.0), Ping)
//!     .with_communication(CommunicationMedium::default())
//!     .build()?;
//! simulator.run()?;
//! # Ok(())
//! # }
//! ```

mod encapsulator;
mod error;
mod event;
mod handler;
mod node;
mod runner;

pub use encapsulator::{PrototypeEncapsulator, PrototypeProvider, ProviderCommand};
pub use error::SimulationError;
pub use event::{Event, EventKey, EventLoop};
pub use handler::{
    Assertion, AssertionKind, CommunicationMedium, Delay, MobilityConfig, NodeRecord,
    VisualizationConfig, VisualizationUpdate,
};
pub use node::Node;
pub use runner::{SimulationBuilder, SimulationConfig, SimulationStats, Simulator};
