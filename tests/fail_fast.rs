use std::error::Error;

use jobq::{Queue, QueueOptions};
use jobq_test_utils::init_tracing;
use jobq_test_utils::jobs::{CountingJob, FailingJob};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn failing_root_short_circuits_its_descendants() -> TestResult {
    init_tracing();

    let queue = Queue::new();
    let job_a = FailingJob::new("boom");
    let job_b = CountingJob::new();

    let task_a = queue.default_task(job_a.clone());
    let task_b = queue.default_task(job_b.clone());
    task_a.add_child(&task_b)?;

    let err = queue.run().expect_err("run must surface the job error");
    assert_eq!(err.to_string(), "boom");
    assert_eq!(job_a.calls(), 1);
    assert_eq!(job_b.calls(), 0);

    Ok(())
}

#[test]
fn failure_in_one_subtree_aborts_unstarted_roots() -> TestResult {
    init_tracing();

    let queue = Queue::new();
    let failing = FailingJob::new("first root fails");
    let unrelated = CountingJob::new();

    // Insertion order decides root order: the failing root goes first.
    queue.add(failing.clone());
    queue.add(unrelated.clone());

    let err = queue.run().expect_err("run must surface the job error");
    assert_eq!(err.to_string(), "first root fails");
    assert_eq!(unrelated.calls(), 0);

    Ok(())
}

#[test]
fn failed_task_counts_as_ran_until_reset() -> TestResult {
    init_tracing();

    let queue = Queue::new();
    let job_a = FailingJob::new("boom");
    let job_b = CountingJob::new();

    let task_a = queue.default_task(job_a.clone());
    let task_b = queue.default_task(job_b.clone());
    task_a.add_child(&task_b)?;

    queue.run().expect_err("first run fails");
    assert!(task_a.has_run());

    // A is not re-attempted; it short-circuits and B gets its turn.
    queue.run()?;
    assert_eq!(job_a.calls(), 1);
    assert_eq!(job_b.calls(), 1);

    // An explicit whole-graph reset re-arms A, so the failure comes back.
    queue.reset_after(&[])?;
    let err = queue.run().expect_err("reset re-arms the failing task");
    assert_eq!(err.to_string(), "boom");
    assert_eq!(job_a.calls(), 2);

    Ok(())
}

#[test]
fn retry_failed_option_reruns_failed_tasks_without_reset() -> TestResult {
    init_tracing();

    let queue = Queue::with_options(QueueOptions { retry_failed: true });
    let job_a = FailingJob::new("boom");
    let job_b = CountingJob::new();

    let task_a = queue.default_task(job_a.clone());
    let task_b = queue.default_task(job_b.clone());
    task_a.add_child(&task_b)?;

    queue.run().expect_err("first attempt fails");
    queue.run().expect_err("second attempt retries and fails again");

    assert_eq!(job_a.calls(), 2);
    assert_eq!(job_b.calls(), 0);

    Ok(())
}
