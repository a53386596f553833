#![allow(dead_code)]

use std::time::Duration;
use swarmsim_protocol::{Protocol, Provider};
use swarmsim_types::NodeId;

/// Install a test subscriber honoring `RUST_LOG`. Safe to call from every
/// test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Broadcasts once per second until ten messages are out, counting every
/// packet received along the way.
#[derive(Default)]
pub struct CounterProtocol {
    pub sent: u32,
    pub received: u32,
}

impl CounterProtocol {
    const INTERVAL: Duration = Duration::from_secs(1);
}

impl Protocol for CounterProtocol {
    fn initialize(&mut self, provider: &mut dyn Provider) {
        provider.broadcast(format!("beacon {}", self.sent));
        self.sent = 1;
        provider.schedule_timer("broadcast", Self::INTERVAL);
    }

    fn handle_timer(&mut self, provider: &mut dyn Provider, _timer: &str) {
        if self.sent < 10 {
            provider.broadcast(format!("beacon {}", self.sent));
            self.sent += 1;
            provider.schedule_timer("broadcast", Self::INTERVAL);
        }
    }

    fn handle_packet(&mut self, _provider: &mut dyn Provider, _sender: NodeId, _message: &str) {
        self.received += 1;
    }
}

/// Broadcasts `count` messages in one burst at initialization.
pub struct FloodProtocol {
    pub count: u32,
}

impl Protocol for FloodProtocol {
    fn initialize(&mut self, provider: &mut dyn Provider) {
        for index in 0..self.count {
            provider.broadcast(format!("flood {index}"));
        }
    }
}

/// Does nothing but record arrival times of packets and the order of all
/// callback timestamps it observes.
#[derive(Default)]
pub struct Recorder {
    pub arrivals: Vec<Duration>,
    pub callback_times: Vec<Duration>,
}

impl Protocol for Recorder {
    fn initialize(&mut self, provider: &mut dyn Provider) {
        self.callback_times.push(provider.current_time());
    }

    fn handle_packet(&mut self, provider: &mut dyn Provider, _sender: NodeId, _message: &str) {
        self.arrivals.push(provider.current_time());
        self.callback_times.push(provider.current_time());
    }

    fn handle_timer(&mut self, provider: &mut dyn Provider, _timer: &str) {
        self.callback_times.push(provider.current_time());
    }

    fn handle_telemetry(
        &mut self,
        provider: &mut dyn Provider,
        _telemetry: &swarmsim_protocol::Telemetry,
    ) {
        self.callback_times.push(provider.current_time());
    }
}
