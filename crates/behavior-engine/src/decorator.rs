//! Decorator tasks.
//!
//! Decorators wrap a single child behavior and modify its result or execution.
//! This module provides [`DecoratorKind::Repeat`], [`DecoratorKind::Inverter`]
//! (NOT logic) and [`DecoratorKind::AlwaysSucceed`] (error suppression).

use crate::node::DecoratorKind;
use crate::task::TickContext;
use crate::{Behavior, NodeId, Status};

/// Run state of a decorator node.
pub struct DecoratorTask<C> {
    node: NodeId,
    kind: DecoratorKind,
    child: Behavior<C>,
    counter: u32,
}

impl<C> DecoratorTask<C> {
    pub(crate) fn new(node: NodeId, kind: DecoratorKind) -> Self {
        Self {
            node,
            kind,
            child: Behavior::new(),
            counter: 0,
        }
    }

    pub fn kind(&self) -> DecoratorKind {
        self.kind
    }

    /// Successful child runs completed by a repeat in the current run.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn child(&self) -> &Behavior<C> {
        &self.child
    }

    pub(crate) fn on_initialize(&mut self, ctx: &mut TickContext<'_, C>) {
        self.counter = 0;

        let arena = ctx.arena();
        self.child.reuse(arena, arena.expect_child(self.node, 0));
    }

    pub(crate) fn update(&mut self, ctx: &mut TickContext<'_, C>) -> Status {
        let mut ctx = ctx.synchronous();

        match self.kind {
            // Re-run within the same tick until the child needs more time or
            // the run is decided.
            DecoratorKind::Repeat { limit } => loop {
                match self.child.tick(&mut ctx) {
                    Status::Success => {
                        self.counter += 1;
                        if self.counter >= limit {
                            return Status::Success;
                        }
                        self.child.rest();
                    }
                    other => return other,
                }
            },
            DecoratorKind::Inverter => self.child.tick(&mut ctx).invert(),
            DecoratorKind::AlwaysSucceed => match self.child.tick(&mut ctx) {
                Status::Success | Status::Failure => Status::Success,
                other => other,
            },
        }
    }

    pub(crate) fn on_terminate(&mut self, ctx: &mut TickContext<'_, C>, _status: Status) {
        if self.child.is_running() {
            self.child.abort(&mut ctx.synchronous());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::Action;
    use crate::Arena;

    #[derive(Default)]
    struct Script {
        results: Vec<Status>,
        runs: usize,
    }

    impl Script {
        fn new(results: &[Status]) -> Self {
            Self {
                results: results.to_vec(),
                runs: 0,
            }
        }

        fn next(&mut self) -> Status {
            let status = self.results[self.runs.min(self.results.len() - 1)];
            self.runs += 1;
            status
        }
    }

    fn decorated(kind: DecoratorKind) -> (Arena<Script>, NodeId) {
        let mut arena = Arena::default();
        let root = arena.decorator(kind).unwrap();
        let leaf = arena.leaf(Action::new(|ctx: &mut Script| ctx.next())).unwrap();
        arena.add_child(root, leaf).unwrap();
        (arena, root)
    }

    #[test]
    fn repeat_succeeds_after_limit_within_one_tick() {
        let (arena, root) = decorated(DecoratorKind::Repeat { limit: 3 });
        let mut script = Script::new(&[Status::Success]);
        let mut behavior = Behavior::bound(&arena, root);

        assert_eq!(behavior.tick(&mut TickContext::new(&arena, &mut script)), Status::Success);
        assert_eq!(script.runs, 3);

        let counter = behavior
            .task()
            .and_then(|task| task.as_decorator())
            .map(|task| task.counter());
        assert_eq!(counter, Some(3));
    }

    #[test]
    fn repeat_propagates_failure_immediately() {
        let (arena, root) = decorated(DecoratorKind::Repeat { limit: 5 });
        let mut script = Script::new(&[Status::Success, Status::Failure]);
        let mut behavior = Behavior::bound(&arena, root);

        assert_eq!(behavior.tick(&mut TickContext::new(&arena, &mut script)), Status::Failure);
        assert_eq!(script.runs, 2);
    }

    #[test]
    fn repeat_yields_while_child_runs() {
        let (arena, root) = decorated(DecoratorKind::Repeat { limit: 2 });
        let mut script = Script::new(&[Status::Success, Status::Running, Status::Success]);
        let mut behavior = Behavior::bound(&arena, root);

        assert_eq!(behavior.tick(&mut TickContext::new(&arena, &mut script)), Status::Running);
        assert_eq!(behavior.tick(&mut TickContext::new(&arena, &mut script)), Status::Success);
        assert_eq!(script.runs, 3);
    }

    #[test]
    fn inverter_swaps_outcome() {
        let (arena, root) = decorated(DecoratorKind::Inverter);
        let mut script = Script::new(&[Status::Success, Status::Running, Status::Failure]);
        let mut behavior = Behavior::bound(&arena, root);

        let mut ctx = TickContext::new(&arena, &mut script);
        assert_eq!(behavior.tick(&mut ctx), Status::Failure);
        assert_eq!(behavior.tick(&mut ctx), Status::Running);
        assert_eq!(behavior.tick(&mut ctx), Status::Success);
    }

    #[test]
    fn always_succeed_hides_failure() {
        let (arena, root) = decorated(DecoratorKind::AlwaysSucceed);
        let mut script = Script::new(&[Status::Failure]);
        let mut behavior = Behavior::bound(&arena, root);

        assert_eq!(behavior.tick(&mut TickContext::new(&arena, &mut script)), Status::Success);
        assert_eq!(script.runs, 1); // Child still executed
    }

    #[test]
    fn aborting_decorator_aborts_running_child() {
        let (arena, root) = decorated(DecoratorKind::Inverter);
        let mut script = Script::new(&[Status::Running]);
        let mut behavior = Behavior::bound(&arena, root);

        let mut ctx = TickContext::new(&arena, &mut script);
        behavior.tick(&mut ctx);
        behavior.abort(&mut ctx);

        let child = behavior
            .task()
            .and_then(|task| task.as_decorator())
            .map(|task| task.child().status());
        assert_eq!(child, Some(Status::Aborted));
    }
}
