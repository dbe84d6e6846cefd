//! Control-flow nodes ticked directly through a [`Behavior`].

mod common;

use behavior_engine::Status::{Aborted, Failure, Running, Success};
use behavior_engine::builder::{
    Blueprint, active_selector, always_succeed, inverter, leaf, monitor, parallel, repeat,
    selector, sequence,
};
use behavior_engine::{Arena, Behavior, NodeId, Policy, Status, TickContext};
use common::{Probe, Scripted};

fn scripted(range: std::ops::Range<usize>) -> Vec<Blueprint<Probe>> {
    range.map(|i| leaf(Scripted(i))).collect()
}

fn build(blueprint: Blueprint<Probe>) -> (Arena<Probe>, NodeId) {
    common::init_tracing();
    let mut arena = Arena::default();
    let root = blueprint.build(&mut arena).unwrap();
    arena.validate(root).unwrap();
    (arena, root)
}

fn tick(arena: &Arena<Probe>, behavior: &mut Behavior<Probe>, probe: &mut Probe) -> Status {
    behavior.tick(&mut TickContext::new(arena, probe))
}

#[test]
fn sequence_succeeds_only_when_every_child_succeeds() {
    let (arena, root) = build(sequence(scripted(0..3)));
    let mut probe = Probe::new(&[Success, Success, Success]);
    let mut behavior = Behavior::bound(&arena, root);

    assert_eq!(tick(&arena, &mut behavior, &mut probe), Success);
    assert_eq!(probe.take_updates(), vec![0, 1, 2]);
}

#[test]
fn sequence_stops_at_first_failure() {
    let (arena, root) = build(sequence(scripted(0..3)));
    let mut probe = Probe::new(&[Success, Failure, Success]);
    let mut behavior = Behavior::bound(&arena, root);

    assert_eq!(tick(&arena, &mut behavior, &mut probe), Failure);
    assert_eq!(probe.take_updates(), vec![0, 1]);
}

#[test]
fn selector_returns_first_non_failure() {
    let (arena, root) = build(selector(scripted(0..3)));
    let mut probe = Probe::new(&[Failure, Running, Success]);
    let mut behavior = Behavior::bound(&arena, root);

    assert_eq!(tick(&arena, &mut behavior, &mut probe), Running);
    assert_eq!(probe.take_updates(), vec![0, 1]);

    probe.set(1, Failure);
    assert_eq!(tick(&arena, &mut behavior, &mut probe), Success);
    assert_eq!(probe.take_updates(), vec![1, 2]);
}

#[test]
fn selector_fails_only_when_every_child_fails() {
    let (arena, root) = build(selector(scripted(0..3)));
    let mut probe = Probe::new(&[Failure, Failure, Failure]);
    let mut behavior = Behavior::bound(&arena, root);

    assert_eq!(tick(&arena, &mut behavior, &mut probe), Failure);
    assert_eq!(probe.take_updates(), vec![0, 1, 2]);
}

#[test]
fn parallel_require_all_success_fails_as_soon_as_one_child_fails() {
    let (arena, root) = build(parallel(Policy::RequireAll, Policy::RequireOne, scripted(0..2)));
    let mut probe = Probe::new(&[Success, Running]);
    let mut behavior = Behavior::bound(&arena, root);

    assert_eq!(tick(&arena, &mut behavior, &mut probe), Running);

    probe.set(1, Failure);
    assert_eq!(tick(&arena, &mut behavior, &mut probe), Failure);
    // The child that already succeeded is not ticked again
    assert_eq!(probe.take_updates(), vec![0, 1, 1]);
}

#[test]
fn parallel_checks_failure_before_success() {
    let (arena, root) = build(parallel(Policy::RequireOne, Policy::RequireOne, scripted(0..2)));
    let mut probe = Probe::new(&[Failure, Success]);
    let mut behavior = Behavior::bound(&arena, root);

    assert_eq!(tick(&arena, &mut behavior, &mut probe), Failure);
    assert_eq!(probe.take_updates(), vec![0]);
}

#[test]
fn parallel_aborts_children_still_running_at_return() {
    let (arena, root) = build(parallel(Policy::RequireOne, Policy::RequireAll, scripted(0..2)));
    let mut probe = Probe::new(&[Running, Success]);
    let mut behavior = Behavior::bound(&arena, root);

    assert_eq!(tick(&arena, &mut behavior, &mut probe), Success);
    assert_eq!(probe.terminations(0), vec![Aborted]);
}

#[test]
fn monitor_condition_interrupts_action() {
    let (arena, root) = build(monitor(vec![leaf(Scripted(0))], vec![leaf(Scripted(1))]));
    let mut probe = Probe::new(&[Running, Running]);
    let mut behavior = Behavior::bound(&arena, root);

    assert_eq!(tick(&arena, &mut behavior, &mut probe), Running);
    assert_eq!(probe.take_updates(), vec![0, 1]);

    probe.set(0, Failure);
    assert_eq!(tick(&arena, &mut behavior, &mut probe), Failure);
    assert_eq!(probe.terminations(1), vec![Aborted]);
}

#[test]
fn repeat_runs_child_limit_times_within_one_tick() {
    let (arena, root) = build(repeat(3, leaf(Scripted(0))));
    let mut probe = Probe::new(&[Success]);
    let mut behavior = Behavior::bound(&arena, root);

    assert_eq!(tick(&arena, &mut behavior, &mut probe), Success);
    assert_eq!(probe.initializations(0), 3);
    assert_eq!(probe.take_updates(), vec![0, 0, 0]);
}

#[test]
fn repeat_stops_on_child_failure() {
    let (arena, root) = build(repeat(5, leaf(Scripted(0))));
    let mut probe = Probe::new(&[Failure]);
    let mut behavior = Behavior::bound(&arena, root);

    assert_eq!(tick(&arena, &mut behavior, &mut probe), Failure);
    assert_eq!(probe.take_updates(), vec![0]);
}

#[test]
fn active_selector_lets_higher_priority_child_take_over() {
    // Guarded branch first, fallback action second
    let (arena, root) = build(active_selector(scripted(0..2)));
    let mut probe = Probe::new(&[Failure, Running]);
    let mut behavior = Behavior::bound(&arena, root);

    assert_eq!(tick(&arena, &mut behavior, &mut probe), Running);

    probe.set(0, Success);
    assert_eq!(tick(&arena, &mut behavior, &mut probe), Success);
    assert_eq!(probe.terminations(1), vec![Aborted]);
}

#[test]
fn parallel_reruns_children_that_ended_aborted() {
    let (arena, root) = build(parallel(Policy::RequireAll, Policy::RequireAll, scripted(0..2)));
    let mut probe = Probe::new(&[Success, Aborted]);
    let mut behavior = Behavior::bound(&arena, root);

    // The aborted child counts toward neither total
    assert_eq!(tick(&arena, &mut behavior, &mut probe), Running);

    probe.set(1, Success);
    assert_eq!(tick(&arena, &mut behavior, &mut probe), Success);
    assert_eq!(probe.initializations(0), 1);
    assert_eq!(probe.initializations(1), 2);
    assert_eq!(probe.take_updates(), vec![0, 1, 1]);
}

#[test]
fn rest_then_tick_matches_fresh_setup_for_every_node_kind() {
    let kinds: [(&str, fn() -> Blueprint<Probe>); 9] = [
        ("leaf", || leaf(Scripted(0))),
        ("sequence", || sequence(scripted(0..3))),
        ("selector", || selector(scripted(0..3))),
        ("parallel", || parallel(Policy::RequireAll, Policy::RequireAll, scripted(0..3))),
        ("monitor", || monitor(vec![leaf(Scripted(0))], scripted(1..3))),
        ("active_selector", || active_selector(scripted(0..3))),
        ("repeat", || repeat(2, leaf(Scripted(1)))),
        ("inverter", || inverter(leaf(Scripted(0)))),
        ("always_succeed", || always_succeed(leaf(Scripted(0)))),
    ];

    for (kind, blueprint) in kinds {
        let (arena, root) = build(blueprint());
        let mut probe = Probe::new(&[Failure, Success, Success]);

        let mut reused = Behavior::bound(&arena, root);
        let first = tick(&arena, &mut reused, &mut probe);
        assert!(first.is_terminal(), "{kind} did not finish in one tick");
        reused.rest();
        probe.events.clear();
        let reused_status = tick(&arena, &mut reused, &mut probe);
        let reused_events = std::mem::take(&mut probe.events);

        let mut fresh = Behavior::new();
        fresh.setup(&arena, root);
        let fresh_status = tick(&arena, &mut fresh, &mut probe);

        assert_eq!(reused_status, fresh_status, "{kind}");
        assert_eq!(reused_events, probe.events, "{kind}");
    }
}
