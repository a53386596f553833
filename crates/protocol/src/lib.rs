//! Environment-agnostic protocol contracts.
//!
//! A protocol is a reactive state machine bound to a single node. It is
//! driven entirely by engine callbacks and acts on the world exclusively
//! through its [`Provider`]. Because the protocol depends only on the traits
//! in this crate, the same protocol code runs unmodified in prototype mode,
//! in an integrated network simulator, or on real hardware; only the
//! provider implementation changes.

mod encapsulator;
mod interface;
mod messages;
mod provider;

pub use encapsulator::Encapsulator;
pub use interface::{AsAny, Protocol};
pub use messages::{
    CommunicationCommand, MobilityCommand, Telemetry, VisualizationCommand,
};
pub use provider::Provider;
