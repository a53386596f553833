//! End-to-end scenarios exercising communication, timers, and mobility.

mod common;

use common::{init_tracing, CounterProtocol, FloodProtocol};
use std::time::Duration;
use swarmsim_protocol::{MobilityCommand, Protocol, Provider};
use swarmsim_simulation::{
    CommunicationMedium, Delay, MobilityConfig, SimulationBuilder,
};
use swarmsim_types::{NodeId, Position};

#[test]
fn test_periodic_broadcast_between_two_nodes() {
    init_tracing();
    let mut simulator = SimulationBuilder::new()
        .add_node((0.0, 0.0, 0.0), CounterProtocol::default())
        .add_node((5.0, 0.0, 0.0), CounterProtocol::default())
        .with_communication(CommunicationMedium::default())
        .build()
        .unwrap();
    simulator.run().unwrap();

    // Ten broadcasts per node, each reaching the one other node.
    assert_eq!(simulator.stats().messages_sent, 20);
    for id in [NodeId(0), NodeId(1)] {
        let protocol = simulator.protocol::<CounterProtocol>(id).unwrap();
        assert_eq!(protocol.sent, 10);
        assert_eq!(protocol.received, 10);
    }
}

#[test]
fn test_out_of_range_messages_never_arrive() {
    init_tracing();
    let mut simulator = SimulationBuilder::new()
        .add_node((0.0, 0.0, 0.0), CounterProtocol::default())
        .add_node((50.0, 0.0, 0.0), CounterProtocol::default())
        .with_communication(CommunicationMedium {
            range: Some(30.0),
            ..Default::default()
        })
        .build()
        .unwrap();
    simulator.run().unwrap();

    assert_eq!(simulator.stats().messages_sent, 0);
    assert_eq!(simulator.stats().messages_dropped_range, 20);
    for id in [NodeId(0), NodeId(1)] {
        let protocol = simulator.protocol::<CounterProtocol>(id).unwrap();
        assert_eq!(protocol.received, 0);
    }
}

#[test]
fn test_loss_rate_converges_to_failure_probability() {
    init_tracing();
    let trials = 10_000u32;
    let failure_probability = 0.3;
    let mut simulator = SimulationBuilder::new()
        .add_node((0.0, 0.0, 0.0), FloodProtocol { count: trials })
        .add_node((1.0, 0.0, 0.0), CounterProtocol::default())
        .with_communication(CommunicationMedium {
            failure_probability,
            ..Default::default()
        })
        .with_seed(99)
        .build()
        .unwrap();
    simulator.run().unwrap();

    let stats = simulator.stats();
    assert_eq!(stats.messages_sent + stats.messages_dropped_loss, trials as u64 + 10);
    let expected = 1.0 - failure_probability;
    assert!(
        (stats.delivery_rate() - expected).abs() < 0.02,
        "delivery rate {} too far from {expected}",
        stats.delivery_rate()
    );
}

struct OverrideTimer {
    firings: Vec<Duration>,
}

impl Protocol for OverrideTimer {
    fn initialize(&mut self, provider: &mut dyn Provider) {
        provider.schedule_timer("tick", Duration::from_secs(5));
        provider.schedule_timer("tick", Duration::from_secs(2));
    }

    fn handle_timer(&mut self, provider: &mut dyn Provider, _timer: &str) {
        self.firings.push(provider.current_time());
    }
}

#[test]
fn test_rescheduling_timer_supersedes_pending_one() {
    init_tracing();
    let mut simulator = SimulationBuilder::new()
        .add_node((0.0, 0.0, 0.0), OverrideTimer { firings: Vec::new() })
        .build()
        .unwrap();
    simulator.run().unwrap();

    let protocol = simulator.protocol::<OverrideTimer>(NodeId(0)).unwrap();
    assert_eq!(protocol.firings, vec![Duration::from_secs(2)]);
}

struct CancellingProtocol {
    long_fired: bool,
}

impl Protocol for CancellingProtocol {
    fn initialize(&mut self, provider: &mut dyn Provider) {
        provider.schedule_timer("long", Duration::from_secs(5));
        provider.schedule_timer("abort", Duration::from_secs(3));
    }

    fn handle_timer(&mut self, provider: &mut dyn Provider, timer: &str) {
        match timer {
            "abort" => provider.cancel_timer("long"),
            "long" => self.long_fired = true,
            _ => {}
        }
    }
}

#[test]
fn test_cancelled_timer_never_fires() {
    init_tracing();
    let mut simulator = SimulationBuilder::new()
        .add_node((0.0, 0.0, 0.0), CancellingProtocol { long_fired: false })
        .build()
        .unwrap();
    simulator.run().unwrap();

    let protocol = simulator.protocol::<CancellingProtocol>(NodeId(0)).unwrap();
    assert!(!protocol.long_fired);
    assert_eq!(simulator.stats().timers_cancelled, 1);
    assert_eq!(simulator.now(), Duration::from_secs(3));
}

struct TurnAround;

impl Protocol for TurnAround {
    fn initialize(&mut self, provider: &mut dyn Provider) {
        provider.set_mobility(MobilityCommand::GoTo {
            target: Position::new(10.0, 0.0, 0.0),
            speed: 1.0,
        });
        provider.schedule_timer("turn", Duration::from_secs(3));
    }

    fn handle_timer(&mut self, provider: &mut dyn Provider, _timer: &str) {
        provider.set_mobility(MobilityCommand::GoTo {
            target: Position::ORIGIN,
            speed: 1.0,
        });
    }
}

#[test]
fn test_new_trajectory_replaces_outstanding_one() {
    init_tracing();
    let mut simulator = SimulationBuilder::new()
        .add_node((0.0, 0.0, 0.0), TurnAround)
        .with_mobility(MobilityConfig {
            update_rate: Duration::from_millis(100),
            ..Default::default()
        })
        .with_duration(Duration::from_secs(10))
        .build()
        .unwrap();
    simulator.run().unwrap();

    // Out for three seconds at 1 m/s, then back; arrival clamps exactly.
    let position = simulator.node(NodeId(0)).unwrap().position();
    assert!(
        position.distance(&Position::ORIGIN) < 1e-9,
        "expected return to origin, got {position}"
    );
}

#[test]
fn test_telemetry_reaches_every_node() {
    init_tracing();
    let mut simulator = SimulationBuilder::new()
        .add_node((0.0, 0.0, 0.0), common::Recorder::default())
        .add_node((5.0, 0.0, 0.0), common::Recorder::default())
        .with_mobility(MobilityConfig {
            update_rate: Duration::from_millis(500),
            ..Default::default()
        })
        .with_duration(Duration::from_secs(2))
        .build()
        .unwrap();
    simulator.run().unwrap();

    // Four ticks within the horizon, delivered to both nodes.
    assert_eq!(simulator.stats().telemetry_updates, 8);
}

#[test]
fn test_fixed_delay_shifts_arrival_time() {
    init_tracing();
    let mut simulator = SimulationBuilder::new()
        .add_node((0.0, 0.0, 0.0), FloodProtocol { count: 1 })
        .add_node((1.0, 0.0, 0.0), common::Recorder::default())
        .with_communication(CommunicationMedium {
            delay: Delay::Fixed(Duration::from_millis(250)),
            ..Default::default()
        })
        .build()
        .unwrap();
    simulator.run().unwrap();

    let recorder = simulator.protocol::<common::Recorder>(NodeId(1)).unwrap();
    assert_eq!(recorder.arrivals, vec![Duration::from_millis(250)]);
}
