//! Immutable tree topology.
//!
//! A [`Node`] describes one tree position: what kind of control flow it runs,
//! how it is configured, and where its children live. Nodes never change once
//! the tree is assembled; all per-run state lives in the task a node creates
//! (see [`crate::task`]).
//!
//! The variant set is closed: leaves supplied by the caller, the decorators in
//! [`DecoratorKind`], and the composites in [`CompositeKind`].

use arrayvec::ArrayVec;

use crate::composite::{ActiveSelectorTask, ParallelTask, SerialTask};
use crate::decorator::DecoratorTask;
use crate::error::{Result, TreeError};
use crate::task::{Task, TaskState};
use crate::{NodeId, TreeConfig};

/// Caller-supplied leaf node: a condition or action.
///
/// The node is the immutable half of the pair; each run gets a fresh task
/// from [`create`](LeafNode::create).
pub trait LeafNode<C> {
    /// Creates a task bound to this node.
    fn create(&self) -> Box<dyn Task<C>>;

    /// Releases a task previously returned by [`create`](LeafNode::create).
    fn destroy(&self, task: Box<dyn Task<C>>) {
        drop(task);
    }

    /// Human-readable name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Success and failure policy of a parallel node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Policy {
    /// A single child reaching the outcome decides the node.
    RequireOne,
    /// Every child must reach the outcome.
    RequireAll,
}

/// Single-child node kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecoratorKind {
    /// Re-runs the child until it has succeeded `limit` times.
    Repeat { limit: u32 },
    /// Swaps the child's success and failure.
    Inverter,
    /// Reports success whenever the child finishes.
    AlwaysSucceed,
}

impl DecoratorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            DecoratorKind::Repeat { .. } => "repeat",
            DecoratorKind::Inverter => "inverter",
            DecoratorKind::AlwaysSucceed => "always_succeed",
        }
    }
}

/// Multi-child node kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositeKind {
    /// Runs children left to right until one does not succeed.
    Sequence,
    /// Runs children left to right until one does not fail.
    Selector,
    /// Ticks every child each tick and combines their results by policy.
    Parallel { success: Policy, failure: Policy },
    /// Parallel that fails or succeeds on the first decided child.
    /// Conditions sit at the front of the child table, actions at the back.
    Monitor,
    /// Selector that re-evaluates from the first child on every tick.
    ActiveSelector,
}

impl CompositeKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CompositeKind::Sequence => "sequence",
            CompositeKind::Selector => "selector",
            CompositeKind::Parallel { .. } => "parallel",
            CompositeKind::Monitor => "monitor",
            CompositeKind::ActiveSelector => "active_selector",
        }
    }

    /// Success and failure policies for the parallel family.
    pub const fn policies(&self) -> Option<(Policy, Policy)> {
        match *self {
            CompositeKind::Parallel { success, failure } => Some((success, failure)),
            CompositeKind::Monitor => Some((Policy::RequireOne, Policy::RequireOne)),
            _ => None,
        }
    }
}

/// Fixed-capacity table of children, stored as 16-bit offsets relative to
/// the owning node's slot.
///
/// An offset of `d` refers to slot `owner + d`. Offsets are never zero, so a
/// child always lives after its parent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChildTable {
    offsets: ArrayVec<u16, { TreeConfig::MAX_CHILDREN }>,
}

impl ChildTable {
    /// Computes the relative offset from `owner` to `child`.
    pub fn encode(owner: NodeId, child: NodeId) -> Result<u16> {
        child
            .index()
            .checked_sub(owner.index())
            .filter(|distance| (1..=TreeConfig::MAX_CHILD_OFFSET).contains(distance))
            .map(|distance| distance as u16)
            .ok_or(TreeError::OffsetOutOfRange {
                parent: owner,
                child,
            })
    }

    /// Resolves an offset back into an absolute node id.
    #[inline]
    pub fn decode(owner: NodeId, offset: u16) -> NodeId {
        NodeId::new(owner.raw() + u32::from(offset))
    }

    /// Appends `child` at the back of the table.
    pub fn push(&mut self, owner: NodeId, child: NodeId) -> Result<()> {
        self.ensure_room(owner)?;
        let offset = Self::encode(owner, child)?;
        self.offsets.push(offset);
        Ok(())
    }

    /// Inserts `child` at index 0, shifting the existing children right.
    pub fn push_front(&mut self, owner: NodeId, child: NodeId) -> Result<()> {
        self.ensure_room(owner)?;
        let offset = Self::encode(owner, child)?;
        self.offsets.insert(0, offset);
        Ok(())
    }

    /// Absolute id of the child at `index`.
    pub fn get(&self, owner: NodeId, index: usize) -> Option<NodeId> {
        self.offsets
            .get(index)
            .map(|&offset| Self::decode(owner, offset))
    }

    pub fn iter(&self, owner: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.offsets
            .iter()
            .map(move |&offset| Self::decode(owner, offset))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    fn ensure_room(&self, owner: NodeId) -> Result<()> {
        if self.offsets.is_full() {
            return Err(TreeError::ChildTableFull {
                node: owner,
                capacity: TreeConfig::MAX_CHILDREN,
            });
        }
        Ok(())
    }
}

/// Decorator node: exactly one child once the tree is complete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decorator {
    pub kind: DecoratorKind,
    child: Option<u16>,
}

impl Decorator {
    pub fn new(kind: DecoratorKind) -> Self {
        Self { kind, child: None }
    }

    pub fn child(&self, owner: NodeId) -> Option<NodeId> {
        self.child.map(|offset| ChildTable::decode(owner, offset))
    }

    pub(crate) fn set_child(&mut self, owner: NodeId, child: NodeId) -> Result<()> {
        if self.child.is_some() {
            return Err(TreeError::DecoratorOccupied(owner));
        }
        self.child = Some(ChildTable::encode(owner, child)?);
        Ok(())
    }
}

/// Composite node: an ordered, fixed-capacity list of children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Composite {
    pub kind: CompositeKind,
    pub children: ChildTable,
}

impl Composite {
    pub fn new(kind: CompositeKind) -> Self {
        Self {
            kind,
            children: ChildTable::default(),
        }
    }
}

/// One immutable tree position.
pub enum Node<C> {
    Leaf(Box<dyn LeafNode<C>>),
    Decorator(Decorator),
    Composite(Composite),
}

impl<C> Node<C> {
    /// Short kind label, used in errors and logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Leaf(_) => "leaf",
            Node::Decorator(decorator) => decorator.kind.as_str(),
            Node::Composite(composite) => composite.kind.as_str(),
        }
    }

    /// Creates a fresh task for a run of the node stored at `id`.
    pub(crate) fn create(&self, id: NodeId) -> TaskState<C> {
        match self {
            Node::Leaf(leaf) => TaskState::Leaf(leaf.create()),
            Node::Decorator(decorator) => {
                TaskState::Decorator(Box::new(DecoratorTask::new(id, decorator.kind)))
            }
            Node::Composite(composite) => match (composite.kind, composite.kind.policies()) {
                (_, Some((success, failure))) => {
                    TaskState::Parallel(Box::new(ParallelTask::new(id, success, failure)))
                }
                (CompositeKind::Sequence, None) => {
                    TaskState::Serial(Box::new(SerialTask::sequence(id)))
                }
                (CompositeKind::Selector, None) => {
                    TaskState::Serial(Box::new(SerialTask::selector(id)))
                }
                (_, None) => TaskState::ActiveSelector(Box::new(ActiveSelectorTask::new(id))),
            },
        }
    }

    /// Releases a task created by [`Node::create`].
    pub(crate) fn destroy(&self, task: TaskState<C>) {
        match (self, task) {
            (Node::Leaf(leaf), TaskState::Leaf(task)) => leaf.destroy(task),
            (_, task) => drop(task),
        }
    }
}

impl<C> core::fmt::Debug for Node<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Node::Leaf(leaf) => f.debug_tuple("Leaf").field(&leaf.name()).finish(),
            Node::Decorator(decorator) => f.debug_tuple("Decorator").field(decorator).finish(),
            Node::Composite(composite) => f.debug_tuple("Composite").field(composite).finish(),
        }
    }
}
