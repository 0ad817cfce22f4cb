use std::error::Error;

use jobq::{DagStore, Queue};
use jobq_test_utils::init_tracing;
use jobq_test_utils::jobs::{event_log, events, RecordingJob};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn diamond_runs_join_after_both_branches() -> TestResult {
    init_tracing();

    // A -> {B, C} -> D
    let queue = Queue::new();
    let log = event_log();

    let task_a = queue.default_task(RecordingJob::new("A", &log));
    let task_b = queue.default_task(RecordingJob::new("B", &log));
    let task_c = queue.default_task(RecordingJob::new("C", &log));
    let task_d = queue.default_task(RecordingJob::new("D", &log));

    task_a.add_child(&task_b)?.add_child(&task_c)?;
    task_b.add_child(&task_d)?;
    task_c.add_child(&task_d)?;

    queue.run()?;

    let ran = events(&log);
    assert_eq!(ran.len(), 4, "each job runs exactly once: {ran:?}");
    assert_eq!(ran[0], "A");
    assert_eq!(ran[3], "D", "the join must run after both branches: {ran:?}");

    // Sibling ties break by insertion order, so the full order is fixed.
    assert_eq!(ran, vec!["A", "B", "C", "D"]);

    Ok(())
}

#[test]
fn ordered_descendants_of_a_diamond_put_the_join_last() -> TestResult {
    let mut store: DagStore<&str> = DagStore::new();
    let a = store.add_vertex("a");
    let b = store.add_vertex("b");
    let c = store.add_vertex("c");
    let d = store.add_vertex("d");

    store.add_edge(&a, &b)?;
    store.add_edge(&a, &c)?;
    store.add_edge(&b, &d)?;
    store.add_edge(&c, &d)?;

    let order = store.ordered_descendants(&a)?;
    assert_eq!(order, vec![b.clone(), c.clone(), d.clone()]);

    let pos = |id: &str| order.iter().position(|v| v == id);
    assert!(pos(&d) > pos(&b));
    assert!(pos(&d) > pos(&c));

    // The map form agrees on membership.
    let all = store.descendants(&a)?;
    assert_eq!(all.len(), 3);
    assert!(all.contains_key(&b) && all.contains_key(&c) && all.contains_key(&d));

    Ok(())
}

#[test]
fn chain_runs_in_dependency_order() -> TestResult {
    init_tracing();

    let queue = Queue::new();
    let log = event_log();

    let task_a = queue.default_task(RecordingJob::new("A", &log));
    let task_b = queue.default_task(RecordingJob::new("B", &log));
    let task_c = queue.default_task(RecordingJob::new("C", &log));

    // Wired in reverse to show order comes from edges, not insertion.
    task_b.add_child(&task_c)?;
    task_a.add_child(&task_b)?;

    queue.run()?;
    assert_eq!(events(&log), vec!["A", "B", "C"]);

    Ok(())
}

#[test]
fn roots_are_listed_in_insertion_order() {
    let mut store: DagStore<u32> = DagStore::new();
    let ids: Vec<_> = (0..4).map(|n| store.add_vertex(n)).collect();

    assert_eq!(store.roots(), ids);

    // Linking 0 -> 2 removes 2 from the roots but keeps the others' order.
    store.add_edge(&ids[0], &ids[2]).unwrap();
    assert_eq!(
        store.roots(),
        vec![ids[0].clone(), ids[1].clone(), ids[3].clone()]
    );
}
