//! Builder utilities for ergonomic behavior tree construction.
//!
//! Nodes must be allocated parent-first so that child offsets point forward.
//! Instead of allocating and wiring every node by hand, describe the tree as a
//! [`Blueprint`] with the helper functions in this module and lower it into an
//! arena with [`Blueprint::build`]:
//!
//! ```rust
//! use behavior_engine::builder::{action, condition, sequence};
//! use behavior_engine::{Arena, Status};
//!
//! let mut arena = Arena::<i32>::default();
//! let root = sequence(vec![
//!     condition(|hp: &i32| *hp > 0),
//!     action(|hp: &mut i32| {
//!         *hp -= 1;
//!         Status::Success
//!     }),
//! ])
//! .build(&mut arena)
//! .unwrap();
//!
//! assert_eq!(arena.child_count(root), 2);
//! ```

use crate::error::Result;
use crate::leaf::{Action, Condition};
use crate::node::{CompositeKind, DecoratorKind, LeafNode, Node, Policy};
use crate::{Arena, NodeId, Status};

/// Declarative description of a subtree.
pub enum Blueprint<C> {
    Leaf(Box<dyn LeafNode<C>>),
    Decorator {
        kind: DecoratorKind,
        child: Box<Blueprint<C>>,
    },
    Composite {
        kind: CompositeKind,
        children: Vec<Blueprint<C>>,
    },
    Monitor {
        conditions: Vec<Blueprint<C>>,
        actions: Vec<Blueprint<C>>,
    },
}

impl<C> Blueprint<C> {
    /// Allocates this subtree in `arena`, parents before children, and
    /// returns the id of its root.
    pub fn build(self, arena: &mut Arena<C>) -> Result<NodeId> {
        match self {
            Blueprint::Leaf(leaf) => arena.allocate(Node::Leaf(leaf)),
            Blueprint::Decorator { kind, child } => {
                let id = arena.decorator(kind)?;
                let child = child.build(arena)?;
                arena.add_child(id, child)?;
                Ok(id)
            }
            Blueprint::Composite { kind, children } => {
                let id = arena.composite(kind)?;
                for child in children {
                    let child = child.build(arena)?;
                    arena.add_child(id, child)?;
                }
                Ok(id)
            }
            Blueprint::Monitor {
                conditions,
                actions,
            } => {
                let id = arena.monitor()?;
                for action in actions {
                    let action = action.build(arena)?;
                    arena.add_action(id, action)?;
                }
                // Conditions are inserted at the front; reverse to keep their order
                for condition in conditions.into_iter().rev() {
                    let condition = condition.build(arena)?;
                    arena.add_condition(id, condition)?;
                }
                Ok(id)
            }
        }
    }
}

/// Creates a sequence node.
#[inline]
pub fn sequence<C>(children: Vec<Blueprint<C>>) -> Blueprint<C> {
    Blueprint::Composite {
        kind: CompositeKind::Sequence,
        children,
    }
}

/// Creates a selector node.
#[inline]
pub fn selector<C>(children: Vec<Blueprint<C>>) -> Blueprint<C> {
    Blueprint::Composite {
        kind: CompositeKind::Selector,
        children,
    }
}

/// Creates a parallel node with the given success and failure policies.
#[inline]
pub fn parallel<C>(success: Policy, failure: Policy, children: Vec<Blueprint<C>>) -> Blueprint<C> {
    Blueprint::Composite {
        kind: CompositeKind::Parallel { success, failure },
        children,
    }
}

/// Creates a monitor node. Conditions keep their order and run before the
/// actions on every tick.
#[inline]
pub fn monitor<C>(conditions: Vec<Blueprint<C>>, actions: Vec<Blueprint<C>>) -> Blueprint<C> {
    Blueprint::Monitor {
        conditions,
        actions,
    }
}

/// Creates an active selector node.
#[inline]
pub fn active_selector<C>(children: Vec<Blueprint<C>>) -> Blueprint<C> {
    Blueprint::Composite {
        kind: CompositeKind::ActiveSelector,
        children,
    }
}

/// Creates a repeat node. A `limit` of 0 is rejected by [`Blueprint::build`].
#[inline]
pub fn repeat<C>(limit: u32, child: Blueprint<C>) -> Blueprint<C> {
    Blueprint::Decorator {
        kind: DecoratorKind::Repeat { limit },
        child: Box::new(child),
    }
}

/// Creates an inverter node.
#[inline]
pub fn inverter<C>(child: Blueprint<C>) -> Blueprint<C> {
    Blueprint::Decorator {
        kind: DecoratorKind::Inverter,
        child: Box::new(child),
    }
}

/// Creates an always-succeed node.
#[inline]
pub fn always_succeed<C>(child: Blueprint<C>) -> Blueprint<C> {
    Blueprint::Decorator {
        kind: DecoratorKind::AlwaysSucceed,
        child: Box::new(child),
    }
}

/// Wraps a caller-defined leaf node.
#[inline]
pub fn leaf<C, L: LeafNode<C> + 'static>(leaf: L) -> Blueprint<C> {
    Blueprint::Leaf(Box::new(leaf))
}

/// Creates an [`Action`] leaf from a closure.
#[inline]
pub fn action<C, F>(update: F) -> Blueprint<C>
where
    C: 'static,
    F: Fn(&mut C) -> Status + Clone + 'static,
{
    leaf(Action::new(update))
}

/// Creates a [`Condition`] leaf from a predicate.
#[inline]
pub fn condition<C, F>(predicate: F) -> Blueprint<C>
where
    C: 'static,
    F: Fn(&C) -> bool + Clone + 'static,
{
    leaf(Condition::new(predicate))
}
