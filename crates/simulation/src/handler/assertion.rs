//! Continuous correctness checking over the running simulation.
//!
//! Assertions are registered at assembly time and evaluated after every
//! processed event. "Always" assertions abort the run the instant they
//! fail; "eventually" assertions latch once true and are verified at
//! finalization.

use crate::node::Node;
use crate::SimulationError;
use std::time::Duration;
use swarmsim_protocol::Protocol;

/// What an assertion demands of its predicate over the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertionKind {
    /// Must hold for every node of the target protocol type, continuously.
    AlwaysTrueForProtocol,
    /// Must hold for some node of the target protocol type, at least once.
    EventuallyTrueForProtocol,
    /// Must hold over the full node collection, continuously.
    AlwaysTrueForSimulation,
    /// Must hold over the full node collection, at least once.
    EventuallyTrueForSimulation,
}

impl AssertionKind {
    fn is_eventually(&self) -> bool {
        matches!(
            self,
            AssertionKind::EventuallyTrueForProtocol | AssertionKind::EventuallyTrueForSimulation
        )
    }
}

enum Predicate {
    /// Evaluated per node; `None` means the node runs a different protocol
    /// type and is skipped.
    PerNode(Box<dyn Fn(&Node) -> Option<bool>>),
    /// Evaluated once over the whole node collection.
    WholeSimulation(Box<dyn Fn(&[Node]) -> bool>),
}

/// A named correctness condition checked throughout the run.
pub struct Assertion {
    name: String,
    kind: AssertionKind,
    predicate: Predicate,
}

impl Assertion {
    /// The predicate must hold for every node running protocol `P`, after
    /// every event, for the entire run.
    pub fn always_for_protocol<P, F>(name: impl Into<String>, predicate: F) -> Self
    where
        P: Protocol + 'static,
        F: Fn(&P) -> bool + 'static,
    {
        Self {
            name: name.into(),
            kind: AssertionKind::AlwaysTrueForProtocol,
            predicate: Predicate::PerNode(Box::new(move |node| {
                node.protocol::<P>().map(&predicate)
            })),
        }
    }

    /// The predicate must hold for at least one node running protocol `P`
    /// at some point during the run.
    pub fn eventually_for_protocol<P, F>(name: impl Into<String>, predicate: F) -> Self
    where
        P: Protocol + 'static,
        F: Fn(&P) -> bool + 'static,
    {
        Self {
            name: name.into(),
            kind: AssertionKind::EventuallyTrueForProtocol,
            predicate: Predicate::PerNode(Box::new(move |node| {
                node.protocol::<P>().map(&predicate)
            })),
        }
    }

    /// The predicate must hold over the full node collection after every
    /// event, for the entire run.
    pub fn always_for_simulation<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&[Node]) -> bool + 'static,
    {
        Self {
            name: name.into(),
            kind: AssertionKind::AlwaysTrueForSimulation,
            predicate: Predicate::WholeSimulation(Box::new(predicate)),
        }
    }

    /// The predicate must hold over the full node collection at some point
    /// during the run.
    pub fn eventually_for_simulation<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&[Node]) -> bool + 'static,
    {
        Self {
            name: name.into(),
            kind: AssertionKind::EventuallyTrueForSimulation,
            predicate: Predicate::WholeSimulation(Box::new(predicate)),
        }
    }

    /// Evaluate the predicate against the current snapshot.
    ///
    /// For per-node predicates: "always" means all matching nodes hold,
    /// "eventually" means any matching node holds.
    fn holds(&self, nodes: &[Node]) -> bool {
        match &self.predicate {
            Predicate::WholeSimulation(predicate) => predicate(nodes),
            Predicate::PerNode(predicate) => {
                let mut matching = nodes.iter().filter_map(|node| predicate(node));
                if self.kind.is_eventually() {
                    matching.any(|ok| ok)
                } else {
                    matching.all(|ok| ok)
                }
            }
        }
    }
}

impl std::fmt::Debug for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assertion")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

struct RegisteredAssertion {
    assertion: Assertion,
    /// Latch for "eventually" kinds: set the first time the predicate holds.
    satisfied_once: bool,
}

/// Evaluates registered assertions after every simulation step and at
/// finalization.
#[derive(Default)]
pub struct AssertionHandler {
    assertions: Vec<RegisteredAssertion>,
}

impl AssertionHandler {
    pub fn new(assertions: Vec<Assertion>) -> Self {
        Self {
            assertions: assertions
                .into_iter()
                .map(|assertion| RegisteredAssertion {
                    assertion,
                    satisfied_once: false,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.assertions.is_empty()
    }

    /// Check all assertions against the post-event snapshot.
    ///
    /// Returns the terminal violation for the first failing "always"
    /// assertion; "eventually" assertions only record.
    pub fn after_step(
        &mut self,
        nodes: &[Node],
        time: Duration,
        iteration: u64,
    ) -> Result<(), SimulationError> {
        for registered in &mut self.assertions {
            let holds = registered.assertion.holds(nodes);
            if registered.assertion.kind.is_eventually() {
                if holds {
                    registered.satisfied_once = true;
                }
            } else if !holds {
                return Err(SimulationError::AssertionViolation {
                    name: registered.assertion.name.clone(),
                    kind: registered.assertion.kind,
                    time,
                    iteration,
                });
            }
        }
        Ok(())
    }

    /// Verify that every "eventually" assertion held at least once.
    pub fn finalize(&self, time: Duration, iteration: u64) -> Result<(), SimulationError> {
        for registered in &self.assertions {
            if registered.assertion.kind.is_eventually() && !registered.satisfied_once {
                return Err(SimulationError::AssertionViolation {
                    name: registered.assertion.name.clone(),
                    kind: registered.assertion.kind,
                    time,
                    iteration,
                });
            }
        }
        Ok(())
    }
}
