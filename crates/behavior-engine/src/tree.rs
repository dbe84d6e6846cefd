//! A validated arena paired with the scheduler that runs it.

use tracing::debug;

use crate::builder::Blueprint;
use crate::error::Result;
use crate::scheduler::{BehaviorId, Completion, Observer, Scheduler};
use crate::{Arena, Behavior, NodeId, Status, TreeConfig};

/// Owns the node arena of one tree and drives behaviors over it.
///
/// # Example
///
/// ```
/// use behavior_engine::builder::{action, sequence};
/// use behavior_engine::{BehaviorTree, Observer, Status, TreeConfig};
///
/// let blueprint = sequence(vec![
///     action(|turns: &mut u32| {
///         *turns += 1;
///         if *turns < 3 { Status::Running } else { Status::Success }
///     }),
/// ]);
/// let mut tree = BehaviorTree::from_blueprint(&TreeConfig::default(), blueprint).unwrap();
/// let id = tree.start_root(Some(Observer::Notify));
///
/// let mut turns = 0;
/// while !tree.is_idle() {
///     tree.tick(&mut turns);
/// }
///
/// assert_eq!(turns, 3);
/// assert_eq!(tree.status(id), Some(Status::Success));
/// ```
pub struct BehaviorTree<C> {
    arena: Arena<C>,
    scheduler: Scheduler<C>,
    root: NodeId,
}

impl<C> BehaviorTree<C> {
    /// Wraps an arena whose structure under `root` is sound.
    pub fn new(arena: Arena<C>, root: NodeId) -> Result<Self> {
        arena.validate(root)?;
        debug!(
            root = %root,
            nodes = arena.len(),
            used_bytes = arena.used_bytes(),
            "tree ready"
        );

        Ok(Self {
            arena,
            scheduler: Scheduler::new(),
            root,
        })
    }

    /// Allocates `blueprint` into a fresh arena sized by `config`.
    pub fn from_blueprint(config: &TreeConfig, blueprint: Blueprint<C>) -> Result<Self> {
        let mut arena = Arena::new(config);
        let root = blueprint.build(&mut arena)?;
        Self::new(arena, root)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn arena(&self) -> &Arena<C> {
        &self.arena
    }

    pub fn scheduler(&self) -> &Scheduler<C> {
        &self.scheduler
    }

    /// Schedules a behavior bound to the root node.
    pub fn start_root(&mut self, observer: Option<Observer>) -> BehaviorId {
        let behavior = Behavior::bound(&self.arena, self.root);
        self.scheduler.start(behavior, observer)
    }

    /// Schedules a behavior bound to any node of the tree.
    pub fn start(&mut self, node: NodeId, observer: Option<Observer>) -> Result<BehaviorId> {
        self.arena.validate(node)?;
        let behavior = Behavior::bound(&self.arena, node);
        Ok(self.scheduler.start(behavior, observer))
    }

    /// Runs one scheduler pass against `state`.
    pub fn tick(&mut self, state: &mut C) {
        self.scheduler.tick(&self.arena, state);
    }

    /// See [`Scheduler::stop`].
    pub fn stop(&mut self, state: &mut C, id: BehaviorId, result: Status) {
        self.scheduler.stop(&self.arena, state, id, result);
    }

    pub fn status(&self, id: BehaviorId) -> Option<Status> {
        self.scheduler.status(id)
    }

    /// See [`Scheduler::children_of`].
    pub fn children_of(&self, parent: BehaviorId) -> impl Iterator<Item = BehaviorId> + '_ {
        self.scheduler.children_of(parent)
    }

    /// Releases a finished behavior and destroys its task. Returns `false` if
    /// `id` is unknown.
    pub fn remove(&mut self, id: BehaviorId) -> bool {
        match self.scheduler.remove(id) {
            Some(mut behavior) => {
                behavior.teardown(&self.arena);
                true
            }
            None => false,
        }
    }

    pub fn drain_completions(&mut self) -> impl Iterator<Item = Completion> + '_ {
        self.scheduler.drain_completions()
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }
}
