//! Cooperative tree-wide scheduler.
//!
//! The [`Scheduler`] owns every behavior that is currently active at the top
//! level of a tree, plus every child a suspended composite handed to it, and
//! steps each of them once per [`tick`](Scheduler::tick).
//!
//! # Pass Structure
//!
//! A tick appends a sentinel to the run queue and steps behaviors from the
//! front until the sentinel comes up. Running behaviors go to the back of the
//! queue, behind the sentinel, so each is ticked at most once per pass.
//! Children a suspended parent hands over go to the front and are ticked in
//! the same pass.
//!
//! # Completion Delivery
//!
//! A behavior may carry an [`Observer`]. When it reaches a terminal status:
//! - [`Observer::Notify`] records a [`Completion`] for the driver
//! - [`Observer::Parent`] releases the child and resumes its suspended parent
//!   with the child's status; a parent that finishes in turn is delivered to
//!   its own observer
//!
//! Behaviors without an observer are queued again and start a new run on the
//! next pass. Delivery walks an explicit worklist, so deep trees never recurse.

use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, trace, warn};

use crate::task::{Spawn, TickContext};
use crate::{Arena, Behavior, Status};

/// Handle to a behavior owned by a [`Scheduler`].
///
/// Slots are reused; the generation distinguishes a released behavior from
/// the one that took its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BehaviorId {
    index: u32,
    generation: u32,
}

impl fmt::Display for BehaviorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Who is told when a scheduled behavior reaches a terminal status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Observer {
    /// Record a [`Completion`] for [`Scheduler::drain_completions`].
    Notify,
    /// Resume `parent` with the status of its child at `index`.
    ///
    /// Set by the scheduler for children it starts on behalf of a suspended
    /// sequence or selector.
    Parent { parent: BehaviorId, index: u16 },
}

/// Terminal status reported for a behavior started with [`Observer::Notify`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Completion {
    pub id: BehaviorId,
    pub status: Status,
}

struct Entry<C> {
    behavior: Behavior<C>,
    observer: Option<Observer>,
    /// Queued or suspended; cleared once a completion has been delivered.
    live: bool,
}

struct Slot<C> {
    generation: u32,
    entry: Option<Entry<C>>,
}

/// Run queue stepping every active behavior of a tree once per tick.
pub struct Scheduler<C> {
    slots: Vec<Slot<C>>,
    free: Vec<u32>,
    queue: VecDeque<Option<BehaviorId>>,
    completions: Vec<Completion>,
    spawns: Vec<Spawn>,
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            queue: VecDeque::new(),
            completions: Vec::new(),
            spawns: Vec::new(),
        }
    }

    /// Takes ownership of `behavior` and queues it behind the behaviors
    /// already waiting.
    ///
    /// # Panics
    ///
    /// Panics if `behavior` is unbound or suspended.
    pub fn start(&mut self, behavior: Behavior<C>, observer: Option<Observer>) -> BehaviorId {
        assert!(behavior.is_bound(), "cannot schedule a behavior with no bound task");
        assert!(
            behavior.status() != Status::Suspended,
            "cannot schedule a suspended behavior"
        );

        let node = behavior.node();
        let id = self.insert(behavior, observer);
        debug!(id = %id, node = ?node, observer = ?observer, "start");
        self.queue.push_back(Some(id));
        id
    }

    /// Runs one full pass over the queue.
    pub fn tick(&mut self, arena: &Arena<C>, state: &mut C) {
        self.queue.push_back(None);
        while self.step(arena, state) {}
    }

    /// Steps the behavior at the front of the queue. Returns `false` once the
    /// pass sentinel (or an empty queue) is reached.
    pub fn step(&mut self, arena: &Arena<C>, state: &mut C) -> bool {
        let Some(Some(id)) = self.queue.pop_front() else {
            return false;
        };

        let mut spawns = std::mem::take(&mut self.spawns);
        let Some(entry) = self.entry_mut(id) else {
            trace!(id = %id, "skipping released behavior");
            self.spawns = spawns;
            return true;
        };

        let status = entry
            .behavior
            .tick(&mut TickContext::scheduled(arena, state, &mut spawns));
        let observed = entry.observer.is_some();
        trace!(id = %id, status = %status, "step");

        self.launch(arena, id, &mut spawns);
        self.spawns = spawns;

        match status {
            Status::Running => self.queue.push_back(Some(id)),
            // Resumed by a child completion
            Status::Suspended => {}
            _ if observed => self.complete(arena, state, id, status),
            // No one to tell: run again next pass
            _ => self.queue.push_back(Some(id)),
        }

        true
    }

    /// Forces `id` into the terminal status `result` and delivers the
    /// completion to its observer. Scheduled children started on its behalf
    /// are aborted and released first.
    ///
    /// # Panics
    ///
    /// Panics if `result` is not terminal, if `id` is unknown, or if the
    /// behavior has already completed.
    pub fn stop(&mut self, arena: &Arena<C>, state: &mut C, id: BehaviorId, result: Status) {
        assert!(
            !result.is_active(),
            "behaviors can only be stopped with a terminal status, got {result}"
        );

        let live = match self.entry_mut(id) {
            Some(entry) => entry.live,
            None => panic!("cannot stop unknown behavior {id}"),
        };
        assert!(live, "behavior {id} has already completed");

        debug!(id = %id, result = %result, "stop");
        self.dequeue(id);
        self.cancel_children(arena, state, id);

        let Some(entry) = self.entry_mut(id) else {
            return;
        };
        entry
            .behavior
            .force(&mut TickContext::new(arena, state), result);
        entry.live = false;

        if entry.observer.is_some() {
            self.complete(arena, state, id, result);
        }
    }

    /// Releases a behavior that is not active and returns it to the caller.
    ///
    /// # Panics
    ///
    /// Panics if the behavior is still running or suspended; stop it first.
    pub fn remove(&mut self, id: BehaviorId) -> Option<Behavior<C>> {
        let status = self.entry(id)?.behavior.status();
        assert!(
            !status.is_active(),
            "cannot remove behavior {id} while it is {status}"
        );

        self.dequeue(id);
        self.release(id)
    }

    /// Scheduled children currently running on behalf of `parent`.
    pub fn children_of(&self, parent: BehaviorId) -> impl Iterator<Item = BehaviorId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(move |(index, slot)| match slot.entry.as_ref()?.observer {
                Some(Observer::Parent { parent: owner, .. }) if owner == parent => Some(BehaviorId {
                    index: index as u32,
                    generation: slot.generation,
                }),
                _ => None,
            })
    }

    pub fn status(&self, id: BehaviorId) -> Option<Status> {
        self.entry(id).map(|entry| entry.behavior.status())
    }

    pub fn behavior(&self, id: BehaviorId) -> Option<&Behavior<C>> {
        self.entry(id).map(|entry| &entry.behavior)
    }

    /// Completions recorded for behaviors started with [`Observer::Notify`].
    pub fn drain_completions(&mut self) -> impl Iterator<Item = Completion> + '_ {
        self.completions.drain(..)
    }

    /// Number of behaviors owned by the scheduler.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` when no behavior is waiting to be stepped.
    pub fn is_idle(&self) -> bool {
        self.queue.iter().all(Option::is_none)
    }

    fn entry(&self, id: BehaviorId) -> Option<&Entry<C>> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    fn entry_mut(&mut self, id: BehaviorId) -> Option<&mut Entry<C>> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    fn insert(&mut self, behavior: Behavior<C>, observer: Option<Observer>) -> BehaviorId {
        let entry = Entry {
            behavior,
            observer,
            live: true,
        };

        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(entry);
                BehaviorId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                BehaviorId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    fn release(&mut self, id: BehaviorId) -> Option<Behavior<C>> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(entry.behavior)
    }

    fn dequeue(&mut self, id: BehaviorId) {
        self.queue.retain(|queued| *queued != Some(id));
    }

    /// Starts the children requested by `parent` at the front of the queue,
    /// so they are stepped in the current pass.
    fn launch(&mut self, arena: &Arena<C>, parent: BehaviorId, spawns: &mut Vec<Spawn>) {
        // Reversed so they run in request order
        for spawn in spawns.drain(..).rev() {
            let observer = Observer::Parent {
                parent,
                index: spawn.index,
            };
            let id = self.insert(Behavior::bound(arena, spawn.node), Some(observer));
            trace!(
                parent = %parent,
                child = %id,
                node = %spawn.node,
                index = spawn.index,
                "launch"
            );
            self.queue.push_front(Some(id));
        }
    }

    /// Delivers terminal statuses up the observer chain starting at `id`.
    fn complete(&mut self, arena: &Arena<C>, state: &mut C, id: BehaviorId, status: Status) {
        let mut pending = vec![(id, status)];

        while let Some((id, status)) = pending.pop() {
            let Some(entry) = self.entry_mut(id) else {
                continue;
            };
            entry.live = false;
            let observer = entry.observer;

            match observer {
                None => {}
                Some(Observer::Notify) => {
                    debug!(id = %id, status = %status, "complete");
                    self.completions.push(Completion { id, status });
                }
                Some(Observer::Parent { parent, index }) => {
                    if let Some(mut child) = self.release(id) {
                        child.teardown(arena);
                    }

                    let mut spawns = std::mem::take(&mut self.spawns);
                    let resumed = match self.entry_mut(parent) {
                        Some(entry) if entry.behavior.status() == Status::Suspended => {
                            let mut ctx = TickContext::scheduled(arena, state, &mut spawns);
                            let result = entry.behavior.on_child_done(&mut ctx, index, status);
                            Some((result, entry.observer.is_some()))
                        }
                        _ => {
                            warn!(
                                parent = %parent,
                                child = %id,
                                status = %status,
                                "dropping completion for a parent that is no longer waiting"
                            );
                            None
                        }
                    };
                    debug!(parent = %parent, child = %id, index, status = %status, "child done");

                    self.launch(arena, parent, &mut spawns);
                    self.spawns = spawns;

                    match resumed {
                        None | Some((Status::Suspended, _)) => {}
                        Some((Status::Running, _)) | Some((_, false)) => {
                            self.queue.push_back(Some(parent))
                        }
                        Some((result, true)) => pending.push((parent, result)),
                    }
                }
            }
        }
    }

    /// Aborts and releases every scheduled descendant of `root`.
    fn cancel_children(&mut self, arena: &Arena<C>, state: &mut C, root: BehaviorId) {
        let mut owners = vec![root];

        while let Some(owner) = owners.pop() {
            let children: Vec<BehaviorId> = self.children_of(owner).collect();

            for child in children {
                debug!(parent = %owner, child = %child, "abort scheduled child");
                self.dequeue(child);
                if let Some(mut behavior) = self.release(child) {
                    if behavior.status().is_active() {
                        behavior.abort(&mut TickContext::new(arena, state));
                    }
                    behavior.teardown(arena);
                }
                owners.push(child);
            }
        }
    }
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}
