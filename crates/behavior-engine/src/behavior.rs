//! Runtime handle binding a node to a live task.
//!
//! A [`Behavior`] drives the task lifecycle of one node:
//!
//! - [`setup`](Behavior::setup) creates a task for the node
//! - [`tick`](Behavior::tick) initializes on the first tick of a run, updates,
//!   and terminates once the update result is no longer `Running`
//! - [`abort`](Behavior::abort) cancels a run from outside
//! - [`rest`](Behavior::rest) resets the status so the same task starts a new
//!   run on its next tick
//! - [`teardown`](Behavior::teardown) hands the task back to its node
//!
//! Composites keep one behavior per child position and reuse it across runs.

use core::fmt;

use crate::task::{TaskState, TickContext};
use crate::{Arena, NodeId, Status};

/// One node bound to one live task, plus the last observed status.
pub struct Behavior<C> {
    node: Option<NodeId>,
    task: Option<TaskState<C>>,
    status: Status,
}

impl<C> Behavior<C> {
    /// Creates an unbound behavior.
    pub fn new() -> Self {
        Self {
            node: None,
            task: None,
            status: Status::Invalid,
        }
    }

    /// Creates a behavior bound to `node`.
    pub fn bound(arena: &Arena<C>, node: NodeId) -> Self {
        let mut behavior = Self::new();
        behavior.setup(arena, node);
        behavior
    }

    /// Binds this behavior to `node`, tearing down any previous task.
    ///
    /// # Panics
    ///
    /// Panics if the current run is still active.
    pub fn setup(&mut self, arena: &Arena<C>, node: NodeId) {
        self.teardown(arena);
        self.task = Some(arena.create_task(node));
        self.node = Some(node);
        self.status = Status::Invalid;
    }

    /// Prepares this behavior for a new run of `node`: rests it when already
    /// bound to `node`, otherwise binds it with [`setup`](Behavior::setup).
    pub fn reuse(&mut self, arena: &Arena<C>, node: NodeId) {
        if self.node == Some(node) {
            self.rest();
        } else {
            self.setup(arena, node);
        }
    }

    /// Returns the task to its node.
    ///
    /// # Panics
    ///
    /// Panics if the current run is still active; abort it first.
    pub fn teardown(&mut self, arena: &Arena<C>) {
        if self.task.is_none() {
            return;
        }

        assert!(
            !self.status.is_active(),
            "cannot tear down behavior for node {:?} while it is {}",
            self.node,
            self.status
        );

        if let (Some(node), Some(task)) = (self.node.take(), self.task.take()) {
            arena.destroy_task(node, task);
        }
    }

    /// Runs one tick of the bound task.
    ///
    /// # Panics
    ///
    /// Panics if no task is bound, or if the behavior is suspended waiting
    /// for a scheduled child.
    pub fn tick(&mut self, ctx: &mut TickContext<'_, C>) -> Status {
        assert!(
            self.status != Status::Suspended,
            "suspended behavior for node {:?} resumes through child completions, not ticks",
            self.node
        );
        let Some(task) = self.task.as_mut() else {
            panic!("ticked a behavior with no bound task");
        };

        if self.status != Status::Running {
            task.on_initialize(ctx);
        }

        self.status = task.update(ctx);

        if !self.status.is_active() {
            task.on_terminate(ctx, self.status);
        }

        self.status
    }

    /// Resets the status to `Invalid` so the next tick starts a new run on
    /// the same task. Termination hooks are not invoked.
    ///
    /// # Panics
    ///
    /// Panics if the current run is still active.
    pub fn rest(&mut self) {
        assert!(
            !self.status.is_active(),
            "cannot rest behavior for node {:?} while it is {}",
            self.node,
            self.status
        );
        self.status = Status::Invalid;
    }

    /// Cancels the current run: terminates the task with `Aborted` and
    /// records that status.
    pub fn abort(&mut self, ctx: &mut TickContext<'_, C>) {
        if let Some(task) = self.task.as_mut() {
            task.on_terminate(ctx, Status::Aborted);
        }
        self.status = Status::Aborted;
    }

    /// Forces a terminal status from outside. Active runs are terminated with
    /// `result`.
    pub(crate) fn force(&mut self, ctx: &mut TickContext<'_, C>, result: Status) {
        assert!(
            !result.is_active(),
            "behaviors can only be stopped with a terminal status, got {result}"
        );

        if self.status.is_active() {
            if let Some(task) = self.task.as_mut() {
                task.on_terminate(ctx, result);
            }
        }
        self.status = result;
    }

    /// Resumes a suspended behavior with the result of one of its scheduled
    /// children.
    pub(crate) fn on_child_done(
        &mut self,
        ctx: &mut TickContext<'_, C>,
        index: u16,
        child_status: Status,
    ) -> Status {
        assert_eq!(
            self.status,
            Status::Suspended,
            "child completion delivered to behavior for node {:?} that is not waiting",
            self.node
        );
        let Some(task) = self.task.as_mut() else {
            panic!("child completion delivered to a behavior with no bound task");
        };

        self.status = task.on_child_done(ctx, index, child_status);

        if !self.status.is_active() {
            task.on_terminate(ctx, self.status);
        }

        self.status
    }

    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    #[inline]
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Typed view of the bound task.
    #[inline]
    pub fn task(&self) -> Option<&TaskState<C>> {
        self.task.as_ref()
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.task.is_some()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }

    /// Returns `true` once the run finished with `Success` or `Failure`.
    #[inline]
    pub fn is_terminated(&self) -> bool {
        matches!(self.status, Status::Success | Status::Failure)
    }
}

impl<C> Default for Behavior<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Behavior<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("node", &self.node)
            .field("task", &self.task)
            .field("status", &self.status)
            .finish()
    }
}
