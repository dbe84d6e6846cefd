//! Behavior tree engine with a compact node arena and a cooperative scheduler.
//!
//! A tree is split into two halves:
//!
//! - **Nodes** ([`Node`]) are the immutable structure. They live in an
//!   [`Arena`] with a fixed byte budget and reference their children through
//!   16-bit forward offsets, so trees are acyclic by construction.
//! - **Tasks** ([`TaskState`], [`Task`]) are the per-run state created from a
//!   node whenever a [`Behavior`] is bound to it. Many behaviors can run the
//!   same node concurrently.
//!
//! # Architecture
//!
//! - [`Status`]: lifecycle of a run
//! - [`Behavior`]: tick wrapper that drives the initialize/update/terminate
//!   hooks of one task
//! - [`builder`]: declarative [`Blueprint`](builder::Blueprint)s allocated
//!   parents-first
//! - [`Scheduler`]: steps every active behavior once per tick; sequences and
//!   selectors suspend while their current child runs as its own behavior
//! - [`BehaviorTree`]: validated arena plus scheduler
//!
//! Control nodes: sequence, selector, parallel (with [`Policy`]), monitor,
//! active selector, repeat, inverter and always-succeed.

pub mod arena;
pub mod behavior;
pub mod builder;
pub mod composite;
pub mod config;
pub mod decorator;
pub mod error;
pub mod leaf;
pub mod node;
pub mod scheduler;
pub mod status;
pub mod task;
pub mod tree;

pub use arena::{Arena, NodeId};
pub use behavior::Behavior;
pub use composite::{ActiveSelectorTask, ParallelTask, SerialTask};
pub use config::TreeConfig;
pub use decorator::DecoratorTask;
pub use error::{Result, TreeError};
pub use leaf::{Action, Condition};
pub use node::{
    ChildTable, Composite, CompositeKind, Decorator, DecoratorKind, LeafNode, Node, Policy,
};
pub use scheduler::{BehaviorId, Completion, Observer, Scheduler};
pub use status::Status;
pub use task::{Task, TaskState, TickContext};
pub use tree::BehaviorTree;
