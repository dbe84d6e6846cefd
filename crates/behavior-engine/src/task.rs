//! Per-run execution state.
//!
//! A [`Task`] is the mutable half of a node: it is created when a behavior is
//! bound to a node and carries whatever progress the node needs between
//! ticks. Leaf tasks implement [`Task`] directly; control-flow tasks are
//! provided by the crate and stored in the tagged [`TaskState`] union.

use core::fmt;

use crate::composite::{ActiveSelectorTask, ParallelTask, SerialTask};
use crate::decorator::DecoratorTask;
use crate::{Arena, NodeId, Status};

/// Execution hooks of a leaf task.
///
/// The context `C` is the caller's blackboard: whatever state conditions read
/// and actions act upon.
pub trait Task<C> {
    /// Called once per run, before the first [`update`](Task::update).
    fn on_initialize(&mut self, _ctx: &mut C) {}

    /// Advances the task by one tick.
    ///
    /// # Returns
    ///
    /// - `Status::Running` if more ticks are needed
    /// - `Status::Success` or `Status::Failure` once the run is decided
    fn update(&mut self, ctx: &mut C) -> Status;

    /// Called once when the run ends, with the final status (including
    /// `Status::Aborted` for cancellation).
    fn on_terminate(&mut self, _ctx: &mut C, _status: Status) {}
}

/// Request from a scheduled task to run one of its children as a separate
/// scheduled behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Spawn {
    pub node: NodeId,
    pub index: u16,
}

/// Everything a task can reach during one tick.
pub struct TickContext<'a, C> {
    arena: &'a Arena<C>,
    state: &'a mut C,
    spawns: Option<&'a mut Vec<Spawn>>,
}

impl<'a, C> TickContext<'a, C> {
    /// Context for ticking a behavior directly, without a scheduler.
    pub fn new(arena: &'a Arena<C>, state: &'a mut C) -> Self {
        Self {
            arena,
            state,
            spawns: None,
        }
    }

    /// Context for a scheduler step. Tasks may hand children to the scheduler
    /// instead of ticking them in place.
    pub(crate) fn scheduled(
        arena: &'a Arena<C>,
        state: &'a mut C,
        spawns: &'a mut Vec<Spawn>,
    ) -> Self {
        Self {
            arena,
            state,
            spawns: Some(spawns),
        }
    }

    pub fn arena(&self) -> &'a Arena<C> {
        self.arena
    }

    pub fn state(&mut self) -> &mut C {
        &mut *self.state
    }

    /// Returns `true` when the tick was issued by a scheduler step.
    pub fn is_scheduled(&self) -> bool {
        self.spawns.is_some()
    }

    /// Reborrows this context for ticking children in place.
    pub(crate) fn synchronous(&mut self) -> TickContext<'_, C> {
        TickContext {
            arena: self.arena,
            state: &mut *self.state,
            spawns: None,
        }
    }

    /// Asks the scheduler to start `node` as child `index` of the current
    /// behavior. Returns `false` when ticking synchronously.
    pub(crate) fn spawn(&mut self, node: NodeId, index: u16) -> bool {
        match self.spawns.as_deref_mut() {
            Some(spawns) => {
                spawns.push(Spawn { node, index });
                true
            }
            None => false,
        }
    }
}

/// Tagged union of every task kind a node can create.
///
/// This is the typed view of a behavior's task; see
/// [`Behavior::task`](crate::Behavior::task).
pub enum TaskState<C> {
    Leaf(Box<dyn Task<C>>),
    Decorator(Box<DecoratorTask<C>>),
    Serial(Box<SerialTask<C>>),
    Parallel(Box<ParallelTask<C>>),
    ActiveSelector(Box<ActiveSelectorTask<C>>),
}

impl<C> TaskState<C> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            TaskState::Leaf(_) => "leaf",
            TaskState::Decorator(_) => "decorator",
            TaskState::Serial(task) => task.kind_name(),
            TaskState::Parallel(_) => "parallel",
            TaskState::ActiveSelector(_) => "active_selector",
        }
    }

    pub fn as_decorator(&self) -> Option<&DecoratorTask<C>> {
        match self {
            TaskState::Decorator(task) => Some(task),
            _ => None,
        }
    }

    pub fn as_serial(&self) -> Option<&SerialTask<C>> {
        match self {
            TaskState::Serial(task) => Some(task),
            _ => None,
        }
    }

    pub fn as_parallel(&self) -> Option<&ParallelTask<C>> {
        match self {
            TaskState::Parallel(task) => Some(task),
            _ => None,
        }
    }

    pub fn as_active_selector(&self) -> Option<&ActiveSelectorTask<C>> {
        match self {
            TaskState::ActiveSelector(task) => Some(task),
            _ => None,
        }
    }

    pub(crate) fn on_initialize(&mut self, ctx: &mut TickContext<'_, C>) {
        match self {
            TaskState::Leaf(task) => task.on_initialize(ctx.state()),
            TaskState::Decorator(task) => task.on_initialize(ctx),
            TaskState::Serial(task) => task.on_initialize(ctx),
            TaskState::Parallel(task) => task.on_initialize(ctx),
            TaskState::ActiveSelector(task) => task.on_initialize(ctx),
        }
    }

    pub(crate) fn update(&mut self, ctx: &mut TickContext<'_, C>) -> Status {
        match self {
            TaskState::Leaf(task) => {
                let status = task.update(ctx.state());
                assert!(
                    matches!(
                        status,
                        Status::Success | Status::Failure | Status::Running | Status::Aborted
                    ),
                    "leaf tasks must return success, failure, running or aborted, got {status}"
                );
                status
            }
            TaskState::Decorator(task) => task.update(ctx),
            TaskState::Serial(task) => task.update(ctx),
            TaskState::Parallel(task) => task.update(ctx),
            TaskState::ActiveSelector(task) => task.update(ctx),
        }
    }

    pub(crate) fn on_terminate(&mut self, ctx: &mut TickContext<'_, C>, status: Status) {
        match self {
            TaskState::Leaf(task) => task.on_terminate(ctx.state(), status),
            TaskState::Decorator(task) => task.on_terminate(ctx, status),
            TaskState::Serial(task) => task.on_terminate(ctx, status),
            TaskState::Parallel(task) => task.on_terminate(ctx, status),
            TaskState::ActiveSelector(task) => task.on_terminate(ctx, status),
        }
    }

    /// Delivers the result of a scheduled child started through
    /// [`TickContext::spawn`].
    pub(crate) fn on_child_done(
        &mut self,
        ctx: &mut TickContext<'_, C>,
        index: u16,
        status: Status,
    ) -> Status {
        match self {
            TaskState::Serial(task) => task.on_child_done(ctx, index, status),
            other => panic!(
                "{} tasks never start scheduled children and cannot accept completions",
                other.kind_name()
            ),
        }
    }
}

impl<C> fmt::Debug for TaskState<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskState::{}", self.kind_name())
    }
}
