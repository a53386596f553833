//! Assertion semantics: immediate abort for "always", latched checks for
//! "eventually".

mod common;

use common::{init_tracing, CounterProtocol};
use std::time::Duration;
use swarmsim_simulation::{
    Assertion, AssertionKind, CommunicationMedium, SimulationBuilder, SimulationError,
};

fn two_counters() -> SimulationBuilder {
    SimulationBuilder::new()
        .add_node((0.0, 0.0, 0.0), CounterProtocol::default())
        .add_node((5.0, 0.0, 0.0), CounterProtocol::default())
        .with_communication(CommunicationMedium::default())
}

#[test]
fn test_always_violation_aborts_at_first_failure() {
    init_tracing();
    let mut simulator = two_counters()
        .with_assertion(Assertion::always_for_protocol::<CounterProtocol, _>(
            "under three broadcasts",
            |protocol| protocol.sent < 3,
        ))
        .build()
        .unwrap();

    let error = simulator.run().unwrap_err();
    match error {
        SimulationError::AssertionViolation { name, kind, time, .. } => {
            assert_eq!(name, "under three broadcasts");
            assert_eq!(kind, AssertionKind::AlwaysTrueForProtocol);
            // The third broadcast happens on the timer firing at t=2.
            assert_eq!(time, Duration::from_secs(2));
        }
        other => panic!("unexpected error {other:?}"),
    }
    // The run stopped at the violation, well short of the full scenario.
    assert_eq!(simulator.now(), Duration::from_secs(2));
}

#[test]
fn test_eventually_failure_surfaces_only_at_finalization() {
    init_tracing();
    let mut simulator = two_counters()
        .with_assertion(Assertion::eventually_for_simulation(
            "unreachable condition",
            |_nodes| false,
        ))
        .build()
        .unwrap();

    // Every step succeeds; the violation is only known once the run ends.
    while simulator.step().unwrap() {}
    let error = simulator.finish().unwrap_err();
    assert!(matches!(
        error,
        SimulationError::AssertionViolation {
            kind: AssertionKind::EventuallyTrueForSimulation,
            ..
        }
    ));
}

#[test]
fn test_eventually_latches_once_satisfied() {
    init_tracing();
    let mut simulator = two_counters()
        .with_assertion(Assertion::eventually_for_protocol::<CounterProtocol, _>(
            "some node gets five messages",
            |protocol| protocol.received >= 5,
        ))
        .build()
        .unwrap();

    simulator.run().unwrap();
}

#[test]
fn test_always_for_simulation_holds_throughout() {
    init_tracing();
    let mut simulator = two_counters()
        .with_assertion(Assertion::always_for_simulation("two nodes", |nodes| {
            nodes.len() == 2
        }))
        .build()
        .unwrap();

    simulator.run().unwrap();
}
