//! Composite tasks.
//!
//! Composite nodes control the execution flow of multiple child behaviors.
//! Every composite keeps one [`Behavior`] per child position it drives and
//! reuses it across runs.
//!
//! - [`SerialTask`]: Sequence (AND logic) and Selector (OR logic)
//! - [`ParallelTask`]: Parallel and Monitor
//! - [`ActiveSelectorTask`]: priority selector that re-evaluates every tick

use arrayvec::ArrayVec;

use crate::node::Policy;
use crate::task::TickContext;
use crate::{Arena, Behavior, NodeId, Status, TreeConfig};

type ChildBehaviors<C> = ArrayVec<Behavior<C>, { TreeConfig::MAX_CHILDREN }>;

/// Binds one behavior per child of `node`, reusing existing bindings.
fn bind_children<C>(children: &mut ChildBehaviors<C>, arena: &Arena<C>, node: NodeId) {
    for index in 0..arena.child_count(node) {
        let child = arena.expect_child(node, index);
        match children.get_mut(index) {
            Some(behavior) => behavior.reuse(arena, child),
            None => children.push(Behavior::bound(arena, child)),
        }
    }
}

fn abort_running<C>(children: &mut ChildBehaviors<C>, ctx: &mut TickContext<'_, C>) {
    let mut ctx = ctx.synchronous();
    for child in children.iter_mut().filter(|child| child.is_running()) {
        child.abort(&mut ctx);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Sequence,
    Selector,
}

impl Flow {
    /// Child result that moves evaluation on to the next child.
    fn advance_on(self) -> Status {
        match self {
            Flow::Sequence => Status::Success,
            Flow::Selector => Status::Failure,
        }
    }
}

/// Executes children one after another.
///
/// # Semantics
///
/// A sequence evaluates its children from left to right:
/// - If a child returns `Success`, the sequence **continues** to the next child
/// - Any other child status is returned immediately
/// - If all children return `Success`, the sequence returns `Success`
///
/// A selector is the mirror image: it continues on `Failure`, returns any
/// other status immediately, and fails only after every child failed.
///
/// Progress is remembered across ticks: a running child is resumed rather
/// than re-evaluating earlier children.
///
/// When ticked by the [`Scheduler`](crate::Scheduler) the current child is
/// handed to the scheduler as a separate behavior and the task stays
/// `Suspended` until the scheduler reports the child's result.
pub struct SerialTask<C> {
    node: NodeId,
    flow: Flow,
    index: u16,
    current: Behavior<C>,
    scheduled: bool,
}

impl<C> SerialTask<C> {
    pub(crate) fn sequence(node: NodeId) -> Self {
        Self::new(node, Flow::Sequence)
    }

    pub(crate) fn selector(node: NodeId) -> Self {
        Self::new(node, Flow::Selector)
    }

    fn new(node: NodeId, flow: Flow) -> Self {
        Self {
            node,
            flow,
            index: 0,
            current: Behavior::new(),
            scheduled: false,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.flow {
            Flow::Sequence => "sequence",
            Flow::Selector => "selector",
        }
    }

    /// Index of the child currently being evaluated.
    pub fn index(&self) -> usize {
        usize::from(self.index)
    }

    /// Behavior of the current child when ticking synchronously.
    pub fn current(&self) -> &Behavior<C> {
        &self.current
    }

    /// Returns `true` when the current run hands its children to a scheduler.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    pub(crate) fn on_initialize(&mut self, ctx: &mut TickContext<'_, C>) {
        self.index = 0;
        self.scheduled = ctx.is_scheduled();

        let child = ctx.arena().expect_child(self.node, 0);
        if self.scheduled {
            ctx.spawn(child, 0);
        } else {
            self.current.reuse(ctx.arena(), child);
        }
    }

    pub(crate) fn update(&mut self, ctx: &mut TickContext<'_, C>) -> Status {
        if self.scheduled {
            return Status::Suspended;
        }

        let arena = ctx.arena();
        let count = arena.child_count(self.node);
        let mut ctx = ctx.synchronous();

        loop {
            let status = self.current.tick(&mut ctx);
            if status != self.flow.advance_on() {
                return status;
            }

            self.index += 1;
            if self.index() == count {
                return status;
            }

            let next = arena.expect_child(self.node, self.index());
            self.current.setup(arena, next);
        }
    }

    pub(crate) fn on_child_done(
        &mut self,
        ctx: &mut TickContext<'_, C>,
        index: u16,
        status: Status,
    ) -> Status {
        assert!(
            self.scheduled && index == self.index,
            "{} {} received a completion for child {index} while waiting on child {}",
            self.kind_name(),
            self.node,
            self.index
        );

        if status != self.flow.advance_on() {
            return status;
        }

        self.index += 1;
        let arena = ctx.arena();
        if self.index() == arena.child_count(self.node) {
            return status;
        }

        let child = arena.expect_child(self.node, self.index());
        ctx.spawn(child, self.index);
        Status::Suspended
    }

    pub(crate) fn on_terminate(&mut self, ctx: &mut TickContext<'_, C>, _status: Status) {
        if self.current.is_running() {
            self.current.abort(&mut ctx.synchronous());
        }
    }
}

/// Ticks every child on each tick and combines their results by policy.
///
/// # Semantics
///
/// Children are visited in table order. A child that already finished with
/// `Success` or `Failure` earlier in the current run is not ticked again but
/// still counts. For each child, failure is checked before success:
/// - `failure == RequireOne`: the first failed child fails the node
/// - `success == RequireOne`: the first succeeded child succeeds the node
/// - `RequireAll`: the node is decided once every child reached the outcome
///
/// Otherwise the node keeps `Running`, unless every child has finished
/// without satisfying either policy, in which case it fails. Whenever the
/// node terminates, children still running are aborted.
///
/// A monitor is a parallel with `RequireOne` for both outcomes; its guard
/// conditions sit at the front of the child table and are checked first.
pub struct ParallelTask<C> {
    node: NodeId,
    success: Policy,
    failure: Policy,
    children: ChildBehaviors<C>,
}

impl<C> ParallelTask<C> {
    pub(crate) fn new(node: NodeId, success: Policy, failure: Policy) -> Self {
        Self {
            node,
            success,
            failure,
            children: ArrayVec::new(),
        }
    }

    /// Success and failure policy, in that order.
    pub fn policies(&self) -> (Policy, Policy) {
        (self.success, self.failure)
    }

    pub fn children(&self) -> &[Behavior<C>] {
        &self.children
    }

    pub(crate) fn on_initialize(&mut self, ctx: &mut TickContext<'_, C>) {
        bind_children(&mut self.children, ctx.arena(), self.node);
    }

    pub(crate) fn update(&mut self, ctx: &mut TickContext<'_, C>) -> Status {
        let total = self.children.len();
        let mut successes = 0;
        let mut failures = 0;
        let mut ctx = ctx.synchronous();

        for child in self.children.iter_mut() {
            if !child.is_terminated() {
                child.tick(&mut ctx);
            }

            match child.status() {
                Status::Failure => {
                    failures += 1;
                    if self.failure == Policy::RequireOne {
                        return Status::Failure;
                    }
                }
                Status::Success => {
                    successes += 1;
                    if self.success == Policy::RequireOne {
                        return Status::Success;
                    }
                }
                _ => {}
            }
        }

        if self.failure == Policy::RequireAll && failures == total {
            return Status::Failure;
        }

        if self.success == Policy::RequireAll && successes == total {
            return Status::Success;
        }

        // Nothing left running that could still satisfy a policy
        if successes + failures == total {
            return Status::Failure;
        }

        Status::Running
    }

    pub(crate) fn on_terminate(&mut self, ctx: &mut TickContext<'_, C>, _status: Status) {
        abort_running(&mut self.children, ctx);
    }
}

/// Selector that restarts evaluation from the first child on every tick.
///
/// # Semantics
///
/// Each tick the children are evaluated from left to right and the first
/// child that does not fail decides the result, as in a selector. Because
/// evaluation always starts over, a higher-priority child can take over from
/// a lower-priority child that is still running; the displaced child is
/// aborted in the same tick, so at most one child is ever running.
pub struct ActiveSelectorTask<C> {
    node: NodeId,
    children: ChildBehaviors<C>,
    active: Option<u16>,
}

impl<C> ActiveSelectorTask<C> {
    pub(crate) fn new(node: NodeId) -> Self {
        Self {
            node,
            children: ArrayVec::new(),
            active: None,
        }
    }

    /// Index of the child selected on the last tick, if any child was.
    pub fn active(&self) -> Option<usize> {
        self.active.map(usize::from)
    }

    pub fn children(&self) -> &[Behavior<C>] {
        &self.children
    }

    pub(crate) fn on_initialize(&mut self, ctx: &mut TickContext<'_, C>) {
        bind_children(&mut self.children, ctx.arena(), self.node);
        self.active = None;
    }

    pub(crate) fn update(&mut self, ctx: &mut TickContext<'_, C>) -> Status {
        let previous = self.active.take();
        let mut result = Status::Failure;
        let mut ctx = ctx.synchronous();

        for (index, child) in self.children.iter_mut().enumerate() {
            let status = child.tick(&mut ctx);
            if status != Status::Failure {
                result = status;
                self.active = Some(index as u16);
                break;
            }
        }

        if let Some(previous) = previous {
            if self.active != Some(previous) {
                let displaced = &mut self.children[usize::from(previous)];
                if displaced.is_running() {
                    displaced.abort(&mut ctx);
                }
            }
        }

        result
    }

    pub(crate) fn on_terminate(&mut self, ctx: &mut TickContext<'_, C>, _status: Status) {
        abort_running(&mut self.children, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::Action;
    use crate::node::CompositeKind;

    /// Scripted blackboard: leaf `i` returns `results[i]` and logs its ticks.
    struct TestContext {
        results: Vec<Status>,
        ticked: Vec<usize>,
    }

    impl TestContext {
        fn new(results: &[Status]) -> Self {
            Self {
                results: results.to_vec(),
                ticked: Vec::new(),
            }
        }
    }

    fn tree(kind: CompositeKind, leaves: usize) -> (Arena<TestContext>, NodeId) {
        let mut arena = Arena::default();
        let root = arena.composite(kind).unwrap();
        for i in 0..leaves {
            let leaf = arena
                .leaf(Action::new(move |ctx: &mut TestContext| {
                    ctx.ticked.push(i);
                    ctx.results[i]
                }))
                .unwrap();
            arena.add_child(root, leaf).unwrap();
        }
        (arena, root)
    }

    fn tick(
        arena: &Arena<TestContext>,
        behavior: &mut Behavior<TestContext>,
        ctx: &mut TestContext,
    ) -> Status {
        behavior.tick(&mut TickContext::new(arena, ctx))
    }

    #[test]
    fn sequence_all_success() {
        let (arena, root) = tree(CompositeKind::Sequence, 2);
        let mut ctx = TestContext::new(&[Status::Success, Status::Success]);
        let mut seq = Behavior::bound(&arena, root);

        assert_eq!(tick(&arena, &mut seq, &mut ctx), Status::Success);
        assert_eq!(ctx.ticked, vec![0, 1]);
    }

    #[test]
    fn sequence_fails_on_first_failure() {
        let (arena, root) = tree(CompositeKind::Sequence, 3);
        let mut ctx = TestContext::new(&[Status::Success, Status::Failure, Status::Success]);
        let mut seq = Behavior::bound(&arena, root);

        assert_eq!(tick(&arena, &mut seq, &mut ctx), Status::Failure);
        assert_eq!(ctx.ticked, vec![0, 1]); // Third child never ticked
    }

    #[test]
    fn sequence_resumes_running_child() {
        let (arena, root) = tree(CompositeKind::Sequence, 2);
        let mut ctx = TestContext::new(&[Status::Success, Status::Running]);
        let mut seq = Behavior::bound(&arena, root);

        assert_eq!(tick(&arena, &mut seq, &mut ctx), Status::Running);
        ctx.results[1] = Status::Success;
        assert_eq!(tick(&arena, &mut seq, &mut ctx), Status::Success);
        assert_eq!(ctx.ticked, vec![0, 1, 1]);
    }

    #[test]
    fn selector_succeeds_on_first_success() {
        let (arena, root) = tree(CompositeKind::Selector, 3);
        let mut ctx = TestContext::new(&[Status::Failure, Status::Success, Status::Success]);
        let mut sel = Behavior::bound(&arena, root);

        assert_eq!(tick(&arena, &mut sel, &mut ctx), Status::Success);
        assert_eq!(ctx.ticked, vec![0, 1]);
    }

    #[test]
    fn selector_fails_when_all_fail() {
        let (arena, root) = tree(CompositeKind::Selector, 2);
        let mut ctx = TestContext::new(&[Status::Failure, Status::Failure]);
        let mut sel = Behavior::bound(&arena, root);

        assert_eq!(tick(&arena, &mut sel, &mut ctx), Status::Failure);
    }

    #[test]
    fn parallel_require_all_success_waits_for_every_child() {
        let kind = CompositeKind::Parallel {
            success: Policy::RequireAll,
            failure: Policy::RequireOne,
        };
        let (arena, root) = tree(kind, 2);
        let mut ctx = TestContext::new(&[Status::Success, Status::Running]);
        let mut par = Behavior::bound(&arena, root);

        assert_eq!(tick(&arena, &mut par, &mut ctx), Status::Running);
        ctx.results[1] = Status::Success;
        assert_eq!(tick(&arena, &mut par, &mut ctx), Status::Success);
        // The finished child is not ticked again within the run
        assert_eq!(ctx.ticked, vec![0, 1, 1]);
    }

    #[test]
    fn parallel_aborts_running_children_on_early_return() {
        let kind = CompositeKind::Parallel {
            success: Policy::RequireOne,
            failure: Policy::RequireOne,
        };
        let (arena, root) = tree(kind, 2);
        let mut ctx = TestContext::new(&[Status::Running, Status::Success]);
        let mut par = Behavior::bound(&arena, root);

        assert_eq!(tick(&arena, &mut par, &mut ctx), Status::Success);
        let statuses: Vec<_> = par
            .task()
            .and_then(|task| task.as_parallel())
            .map(|task| task.children().iter().map(Behavior::status).collect())
            .unwrap_or_default();
        assert_eq!(statuses, vec![Status::Aborted, Status::Success]);
    }

    #[test]
    fn parallel_with_mixed_results_and_require_all_fails() {
        let kind = CompositeKind::Parallel {
            success: Policy::RequireAll,
            failure: Policy::RequireAll,
        };
        let (arena, root) = tree(kind, 2);
        let mut ctx = TestContext::new(&[Status::Success, Status::Failure]);
        let mut par = Behavior::bound(&arena, root);

        assert_eq!(tick(&arena, &mut par, &mut ctx), Status::Failure);
    }

    #[test]
    fn monitor_condition_interrupts_action() {
        let (arena, root) = tree(CompositeKind::Monitor, 2);
        let mut ctx = TestContext::new(&[Status::Running, Status::Running]);
        let mut monitor = Behavior::bound(&arena, root);

        assert_eq!(tick(&arena, &mut monitor, &mut ctx), Status::Running);
        ctx.results[0] = Status::Failure;
        assert_eq!(tick(&arena, &mut monitor, &mut ctx), Status::Failure);

        let action = monitor
            .task()
            .and_then(|task| task.as_parallel())
            .map(|task| task.children()[1].status());
        assert_eq!(action, Some(Status::Aborted));
    }

    #[test]
    fn active_selector_reevaluates_from_first_child() {
        let (arena, root) = tree(CompositeKind::ActiveSelector, 2);
        let mut ctx = TestContext::new(&[Status::Failure, Status::Running]);
        let mut sel = Behavior::bound(&arena, root);

        assert_eq!(tick(&arena, &mut sel, &mut ctx), Status::Running);
        assert_eq!(tick(&arena, &mut sel, &mut ctx), Status::Running);
        assert_eq!(ctx.ticked, vec![0, 1, 0, 1]);
    }
}
