//! Closure-backed leaf nodes.
//!
//! Most conditions and many actions carry no per-run state. [`Action`] and
//! [`Condition`] wrap a closure so such leaves can be written inline instead
//! of implementing [`LeafNode`] and [`Task`] by hand.

use crate::node::LeafNode;
use crate::task::Task;
use crate::Status;

/// Leaf whose every update calls `F` with the blackboard.
///
/// Returning `Status::Running` keeps the action active across ticks.
#[derive(Clone)]
pub struct Action<F> {
    update: F,
}

impl<F> Action<F> {
    pub fn new(update: F) -> Self {
        Self { update }
    }
}

struct ActionTask<F> {
    update: F,
}

impl<C, F> Task<C> for ActionTask<F>
where
    F: Fn(&mut C) -> Status,
{
    fn update(&mut self, ctx: &mut C) -> Status {
        (self.update)(ctx)
    }
}

impl<C, F> LeafNode<C> for Action<F>
where
    C: 'static,
    F: Fn(&mut C) -> Status + Clone + 'static,
{
    fn create(&self) -> Box<dyn Task<C>> {
        Box::new(ActionTask {
            update: self.update.clone(),
        })
    }
}

/// Leaf that succeeds when the predicate holds and fails otherwise.
#[derive(Clone)]
pub struct Condition<F> {
    predicate: F,
}

impl<F> Condition<F> {
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

struct ConditionTask<F> {
    predicate: F,
}

impl<C, F> Task<C> for ConditionTask<F>
where
    F: Fn(&C) -> bool,
{
    fn update(&mut self, ctx: &mut C) -> Status {
        if (self.predicate)(ctx) {
            Status::Success
        } else {
            Status::Failure
        }
    }
}

impl<C, F> LeafNode<C> for Condition<F>
where
    C: 'static,
    F: Fn(&C) -> bool + Clone + 'static,
{
    fn create(&self) -> Box<dyn Task<C>> {
        Box::new(ConditionTask {
            predicate: self.predicate.clone(),
        })
    }
}
