#![allow(dead_code)]

use std::sync::Once;

use behavior_engine::{LeafNode, Status, Task};
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// Logs go through the test writer, so they only show for failing tests
/// unless run with `-- --nocapture`. Enable levels with `RUST_LOG=trace`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Init(usize),
    Update(usize, Status),
    Terminate(usize, Status),
}

/// Blackboard for scripted leaves: leaf `i` returns `results[i]` on every
/// update and every hook call is recorded.
#[derive(Debug, Default)]
pub struct Probe {
    pub results: Vec<Status>,
    pub events: Vec<Event>,
}

impl Probe {
    pub fn new(results: &[Status]) -> Self {
        Self {
            results: results.to_vec(),
            events: Vec::new(),
        }
    }

    pub fn set(&mut self, leaf: usize, status: Status) {
        self.results[leaf] = status;
    }

    /// Leaves updated since the last call, in order.
    pub fn take_updates(&mut self) -> Vec<usize> {
        let updates = self
            .events
            .iter()
            .filter_map(|event| match event {
                Event::Update(leaf, _) => Some(*leaf),
                _ => None,
            })
            .collect();
        self.events.clear();
        updates
    }

    pub fn terminations(&self, leaf: usize) -> Vec<Status> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Terminate(id, status) if *id == leaf => Some(*status),
                _ => None,
            })
            .collect()
    }

    pub fn initializations(&self, leaf: usize) -> usize {
        self.events
            .iter()
            .filter(|event| **event == Event::Init(leaf))
            .count()
    }
}

/// Leaf node whose tasks read their result from the [`Probe`].
pub struct Scripted(pub usize);

struct ScriptedTask(usize);

impl Task<Probe> for ScriptedTask {
    fn on_initialize(&mut self, probe: &mut Probe) {
        probe.events.push(Event::Init(self.0));
    }

    fn update(&mut self, probe: &mut Probe) -> Status {
        let status = probe.results[self.0];
        probe.events.push(Event::Update(self.0, status));
        status
    }

    fn on_terminate(&mut self, probe: &mut Probe, status: Status) {
        probe.events.push(Event::Terminate(self.0, status));
    }
}

impl LeafNode<Probe> for Scripted {
    fn create(&self) -> Box<dyn Task<Probe>> {
        Box::new(ScriptedTask(self.0))
    }
}
