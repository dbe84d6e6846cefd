//! Fixed-capacity node arena.
//!
//! Every node of one tree is carved out of a single [`Arena`]. The arena has a
//! byte budget fixed at construction, hands out slots in allocation order,
//! and never frees an individual node: the whole tree is released at once
//! when the arena is dropped.
//!
//! Nodes are addressed by [`NodeId`], a slot index. Parents reference their
//! children through 16-bit offsets (see [`ChildTable`]), so a child must be
//! allocated after its parent and within `u16::MAX` slots of it. Since every
//! edge points forward, trees built in an arena are acyclic.

use std::fmt;

use tracing::trace;

use crate::error::{Result, TreeError};
use crate::node::{Composite, CompositeKind, Decorator, DecoratorKind, LeafNode, Node, Policy};
use crate::task::TaskState;
use crate::TreeConfig;

/// Index of a node slot inside its arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Bump-allocated storage for the nodes of one tree.
pub struct Arena<C> {
    nodes: Vec<Node<C>>,
    used: usize,
    capacity: usize,
}

impl<C> Arena<C> {
    /// Bytes charged against the budget for every allocated node.
    pub const SLOT_BYTES: usize = std::mem::size_of::<Node<C>>();

    pub fn new(config: &TreeConfig) -> Self {
        Self::with_capacity(config.arena_bytes)
    }

    /// Creates an arena with a budget of `bytes`.
    ///
    /// Node storage is reserved up front and never grows past the budget.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(bytes / Self::SLOT_BYTES),
            used: 0,
            capacity: bytes,
        }
    }

    /// Places `node` in the next free slot and advances the cursor.
    pub fn allocate(&mut self, node: Node<C>) -> Result<NodeId> {
        if self.used + Self::SLOT_BYTES > self.capacity {
            return Err(TreeError::ArenaExhausted {
                requested: Self::SLOT_BYTES,
                used: self.used,
                capacity: self.capacity,
            });
        }

        let id = NodeId::new(self.nodes.len() as u32);
        trace!(node = %id, kind = node.kind_name(), used = self.used, "allocate");
        self.nodes.push(node);
        self.used += Self::SLOT_BYTES;
        Ok(id)
    }

    pub fn leaf<L: LeafNode<C> + 'static>(&mut self, leaf: L) -> Result<NodeId> {
        self.allocate(Node::Leaf(Box::new(leaf)))
    }

    pub fn decorator(&mut self, kind: DecoratorKind) -> Result<NodeId> {
        if let DecoratorKind::Repeat { limit: 0 } = kind {
            return Err(TreeError::InvalidRepeatLimit);
        }
        self.allocate(Node::Decorator(Decorator::new(kind)))
    }

    pub fn repeat(&mut self, limit: u32) -> Result<NodeId> {
        self.decorator(DecoratorKind::Repeat { limit })
    }

    pub fn inverter(&mut self) -> Result<NodeId> {
        self.decorator(DecoratorKind::Inverter)
    }

    pub fn always_succeed(&mut self) -> Result<NodeId> {
        self.decorator(DecoratorKind::AlwaysSucceed)
    }

    pub fn composite(&mut self, kind: CompositeKind) -> Result<NodeId> {
        self.allocate(Node::Composite(Composite::new(kind)))
    }

    pub fn sequence(&mut self) -> Result<NodeId> {
        self.composite(CompositeKind::Sequence)
    }

    pub fn selector(&mut self) -> Result<NodeId> {
        self.composite(CompositeKind::Selector)
    }

    pub fn parallel(&mut self, success: Policy, failure: Policy) -> Result<NodeId> {
        self.composite(CompositeKind::Parallel { success, failure })
    }

    pub fn monitor(&mut self) -> Result<NodeId> {
        self.composite(CompositeKind::Monitor)
    }

    pub fn active_selector(&mut self) -> Result<NodeId> {
        self.composite(CompositeKind::ActiveSelector)
    }

    /// Attaches `child` to a composite (appended) or a decorator (its only child).
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.ensure_exists(child)?;
        match self.get_mut(parent)? {
            Node::Composite(composite) => composite.children.push(parent, child),
            Node::Decorator(decorator) => decorator.set_child(parent, child),
            Node::Leaf(_) => Err(TreeError::WrongKind {
                node: parent,
                expected: "composite or decorator",
            }),
        }
    }

    /// Inserts `child` at the front of a composite's child table.
    pub fn add_child_front(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.ensure_exists(child)?;
        match self.get_mut(parent)? {
            Node::Composite(composite) => composite.children.push_front(parent, child),
            _ => Err(TreeError::WrongKind {
                node: parent,
                expected: "composite",
            }),
        }
    }

    /// Adds a guard condition to a monitor. Conditions are checked before
    /// any action on every tick.
    pub fn add_condition(&mut self, monitor: NodeId, condition: NodeId) -> Result<()> {
        self.ensure_monitor(monitor)?;
        self.add_child_front(monitor, condition)
    }

    /// Adds an action to a monitor, after every condition.
    pub fn add_action(&mut self, monitor: NodeId, action: NodeId) -> Result<()> {
        self.ensure_monitor(monitor)?;
        self.add_child(monitor, action)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node<C>> {
        self.nodes.get(id.index())
    }

    /// Child `index` of a composite, or the child of a decorator at index 0.
    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        match self.get(id)? {
            Node::Composite(composite) => composite.children.get(id, index),
            Node::Decorator(decorator) if index == 0 => decorator.child(id),
            _ => None,
        }
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        match self.get(id) {
            Some(Node::Composite(composite)) => composite.children.len(),
            Some(Node::Decorator(decorator)) => usize::from(decorator.child(id).is_some()),
            _ => 0,
        }
    }

    /// Number of allocated nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn used_bytes(&self) -> usize {
        self.used
    }

    pub fn capacity_bytes(&self) -> usize {
        self.capacity
    }

    pub fn remaining_bytes(&self) -> usize {
        self.capacity - self.used
    }

    /// Checks that everything reachable from `root` can run: composites have
    /// children and decorators have their child.
    pub fn validate(&self, root: NodeId) -> Result<()> {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            let node = self.get(id).ok_or(TreeError::UnknownNode(id))?;
            if std::mem::replace(&mut visited[id.index()], true) {
                continue;
            }

            match node {
                Node::Leaf(_) => {}
                Node::Decorator(decorator) => {
                    stack.push(decorator.child(id).ok_or(TreeError::MissingChild(id))?);
                }
                Node::Composite(composite) => {
                    if composite.children.is_empty() {
                        return Err(TreeError::EmptyComposite(id));
                    }
                    stack.extend(composite.children.iter(id));
                }
            }
        }

        Ok(())
    }

    /// Node at `id`. Ids handed to the run phase come from a validated tree,
    /// so a missing node is a broken invariant.
    pub(crate) fn node(&self, id: NodeId) -> &Node<C> {
        match self.nodes.get(id.index()) {
            Some(node) => node,
            None => panic!("node {id} is not part of this arena"),
        }
    }

    /// Child `index` of `id` during a run.
    pub(crate) fn expect_child(&self, id: NodeId, index: usize) -> NodeId {
        match self.child(id, index) {
            Some(child) => child,
            None => panic!("node {id} has no child at index {index}"),
        }
    }

    pub(crate) fn create_task(&self, id: NodeId) -> TaskState<C> {
        self.node(id).create(id)
    }

    pub(crate) fn destroy_task(&self, id: NodeId, task: TaskState<C>) {
        self.node(id).destroy(task);
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node<C>> {
        self.nodes.get_mut(id.index()).ok_or(TreeError::UnknownNode(id))
    }

    fn ensure_exists(&self, id: NodeId) -> Result<()> {
        self.get(id).map(|_| ()).ok_or(TreeError::UnknownNode(id))
    }

    fn ensure_monitor(&self, id: NodeId) -> Result<()> {
        match self.get(id) {
            Some(Node::Composite(Composite {
                kind: CompositeKind::Monitor,
                ..
            })) => Ok(()),
            Some(_) => Err(TreeError::WrongKind {
                node: id,
                expected: "monitor",
            }),
            None => Err(TreeError::UnknownNode(id)),
        }
    }
}

impl<C> Default for Arena<C> {
    fn default() -> Self {
        Self::new(&TreeConfig::default())
    }
}

impl<C> fmt::Debug for Arena<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("nodes", &self.nodes)
            .field("used", &self.used)
            .field("capacity", &self.capacity)
            .finish()
    }
}
