// tests/dispatcher_core.rs

use std::collections::BTreeSet;

use assetdag::engine::core::DispatchState;
use assetdag::engine::{CoreCommand, DispatcherCore, RunOutcome, RuntimeEvent, TriggerQueue};

fn change(tasks: &[&str]) -> RuntimeEvent {
    RuntimeEvent::ChangeDetected {
        tasks: tasks.iter().map(|t| t.to_string()).collect(),
        path: "src/scripts/main.js".to_string(),
    }
}

fn finished() -> RuntimeEvent {
    RuntimeEvent::RunFinished {
        outcome: Some(RunOutcome::new(1)),
    }
}

fn start(tasks: &[&str]) -> CoreCommand {
    CoreCommand::StartRun(tasks.iter().map(|t| t.to_string()).collect())
}

#[test]
fn test_change_while_idle_starts_run() {
    let mut core = DispatcherCore::new();
    assert!(core.is_idle());

    let step = core.step(change(&["scripts", "lint"]));

    assert!(step.keep_running);
    // Task lists are sorted and deduplicated.
    assert_eq!(step.commands, vec![start(&["lint", "scripts"])]);
    assert_eq!(core.state(), DispatchState::Triggered);
}

#[test]
fn test_changes_during_run_coalesce_into_one_batch() {
    let mut core = DispatcherCore::new();
    core.step(change(&["styles"]));

    let batches: [&[&str]; 3] = [&["scripts"], &["views"], &["scripts", "lint"]];
    for tasks in batches {
        let step = core.step(change(tasks));
        assert!(step.commands.is_empty());
        assert!(step.keep_running);
    }
    assert!(!core.queue_is_empty());

    let step = core.step(finished());
    assert_eq!(step.commands, vec![start(&["lint", "scripts", "views"])]);
    assert_eq!(core.state(), DispatchState::Triggered);
    assert!(core.queue_is_empty());

    let step = core.step(finished());
    assert!(step.commands.is_empty());
    assert!(core.is_idle());
}

#[test]
fn test_empty_change_is_ignored() {
    let mut core = DispatcherCore::new();

    let step = core.step(change(&[]));

    assert!(step.commands.is_empty());
    assert!(core.is_idle());
}

#[test]
fn test_shutdown_when_idle_stops_immediately() {
    let mut core = DispatcherCore::new();

    let step = core.step(RuntimeEvent::ShutdownRequested);

    assert!(!step.keep_running);
    assert!(step.commands.is_empty());
}

#[test]
fn test_shutdown_waits_for_in_flight_run_and_drops_pending() {
    let mut core = DispatcherCore::new();
    core.step(change(&["styles"]));
    core.step(change(&["views"]));

    let step = core.step(RuntimeEvent::ShutdownRequested);
    assert!(step.keep_running);
    assert!(core.queue_is_empty());

    // Changes after shutdown are not queued.
    let step = core.step(change(&["scripts"]));
    assert!(step.commands.is_empty());
    assert!(core.queue_is_empty());

    let step = core.step(finished());
    assert!(!step.keep_running);
    assert!(step.commands.is_empty());
    assert!(core.is_idle());
}

#[test]
fn test_failed_run_still_releases_pending_batch() {
    let mut core = DispatcherCore::new();
    core.step(change(&["styles"]));
    core.step(change(&["styles"]));

    let step = core.step(RuntimeEvent::RunFinished { outcome: None });
    assert_eq!(step.commands, vec![start(&["styles"])]);
}

#[test]
fn test_direct_on_change_and_on_run_finished() {
    let mut core = DispatcherCore::default();

    assert_eq!(
        core.on_change(["views".to_string()]),
        Some(vec!["views".to_string()])
    );
    assert_eq!(core.on_change(["styles".to_string()]), None);
    assert_eq!(core.on_run_finished(), Some(vec!["styles".to_string()]));
    assert_eq!(core.on_run_finished(), None);
    assert!(core.is_idle());
}

#[test]
fn test_trigger_queue_merges_and_drains() {
    let mut queue = TriggerQueue::new();
    assert!(queue.is_empty());
    assert_eq!(queue.drain_pending(), None);

    queue.record(["a".to_string(), "b".to_string()]);
    queue.record(["b".to_string(), "c".to_string()]);

    let expected: BTreeSet<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    assert_eq!(queue.drain_pending(), Some(expected));
    assert!(queue.is_empty());

    queue.record(["d".to_string()]);
    assert_eq!(queue.clear(), 1);
    assert!(queue.is_empty());
}
