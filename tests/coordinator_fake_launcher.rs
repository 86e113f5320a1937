// tests/coordinator_fake_launcher.rs

mod common;
use crate::common::builders::{RunRequestBuilder, fake_template};
use crate::common::{init_tracing, log, status, with_timeout};

use std::error::Error;

use agentrun::engine::{RunCoordinator, RunState, StopOutcome};
use agentrun::errors::RunError;
use agentrun::types::RunRequest;
use agentrun_test_utils::fake_launcher::FakeLauncher;

type TestResult = Result<(), Box<dyn Error>>;

fn coordinator() -> (RunCoordinator, FakeLauncher) {
    let launcher = FakeLauncher::new();
    let coordinator = RunCoordinator::new(launcher.clone(), fake_template());
    (coordinator, launcher)
}

#[tokio::test]
async fn lines_then_exit_produce_exact_event_sequence() -> TestResult {
    init_tracing();
    let (coordinator, launcher) = coordinator();

    let stream = coordinator.start(&RunRequest::new("open the docs"))?;
    let process = launcher.take_process();
    process.write_line("A").await;
    process.write_line("B").await;
    process.exit(2);

    let events = with_timeout(stream.collect_events()).await;
    assert_eq!(
        events,
        vec![status("starting"), log("A"), log("B"), status("exit:2")]
    );
    assert_eq!(coordinator.state(), RunState::Idle);
    Ok(())
}

#[tokio::test]
async fn whitespace_task_is_rejected_without_touching_the_slot() {
    init_tracing();
    let (coordinator, launcher) = coordinator();

    let err = coordinator.start(&RunRequest::new("   ")).unwrap_err();
    assert_eq!(err, RunError::InvalidArgument);
    assert!(coordinator.slot().is_empty());
    assert!(launcher.launched().is_empty());
}

#[tokio::test]
async fn blank_task_is_invalid_even_while_a_run_is_active() -> TestResult {
    init_tracing();
    let (coordinator, launcher) = coordinator();

    let stream = coordinator.start(&RunRequest::new("first"))?;

    // The task is validated before admission, so a blank task gets 400
    // rather than 409 when the slot is busy.
    let err = coordinator.start(&RunRequest::new("  ")).unwrap_err();
    assert_eq!(err, RunError::InvalidArgument);
    assert_eq!(launcher.launched().len(), 1);

    launcher.take_process().exit(0);
    with_timeout(stream.collect_events()).await;
    Ok(())
}

#[tokio::test]
async fn task_is_trimmed_and_appended_after_fixed_args() -> TestResult {
    init_tracing();
    let (coordinator, launcher) = coordinator();

    let stream = coordinator.start(&RunRequest::new("  book a table \n"))?;
    launcher.take_process().exit(0);
    with_timeout(stream.collect_events()).await;

    let spec = &launcher.launched()[0];
    assert_eq!(spec.args, vec!["run_task.py".to_string(), "book a table".to_string()]);
    Ok(())
}

#[tokio::test]
async fn second_start_while_running_is_rejected() -> TestResult {
    init_tracing();
    let (coordinator, launcher) = coordinator();

    let stream = coordinator.start(&RunRequest::new("first"))?;
    let err = coordinator.start(&RunRequest::new("second")).unwrap_err();
    assert_eq!(err, RunError::AlreadyRunning);
    assert_eq!(launcher.launched().len(), 1, "rejected start must not spawn");

    launcher.take_process().exit(0);
    let events = with_timeout(stream.collect_events()).await;
    assert_eq!(events.last(), Some(&status("exit:0")));
    Ok(())
}

#[tokio::test]
async fn start_right_after_final_event_is_admitted() -> TestResult {
    init_tracing();
    let (coordinator, launcher) = coordinator();

    for round in 0..3 {
        let mut stream = coordinator.start(&RunRequest::new(format!("round {round}")))?;
        launcher.take_process().exit(round);

        let mut last = None;
        while let Some(event) = with_timeout(stream.next_event()).await {
            last = Some(event);
        }
        assert_eq!(last.and_then(|e| e.exit_code()), Some(round));
        assert!(coordinator.slot().is_empty(), "slot must be clear after final event");
    }
    assert_eq!(launcher.launched().len(), 3);
    Ok(())
}

#[tokio::test]
async fn spawn_failure_leaves_slot_empty_and_retry_is_admitted() -> TestResult {
    init_tracing();
    let (coordinator, launcher) = coordinator();

    launcher.fail_next_spawn("No such file or directory");
    let err = coordinator.start(&RunRequest::new("task")).unwrap_err();
    assert!(matches!(err, RunError::SpawnFailed(ref msg) if msg.contains("No such file")));
    assert!(coordinator.slot().is_empty());

    let stream = coordinator.start(&RunRequest::new("task"))?;
    launcher.take_process().exit(0);
    with_timeout(stream.collect_events()).await;
    Ok(())
}

#[tokio::test]
async fn stop_with_no_run_reports_not_stopped() {
    init_tracing();
    let (coordinator, _launcher) = coordinator();

    assert_eq!(coordinator.stop().await, StopOutcome::NotRunning);
    assert!(!coordinator.stop().await.stopped());
    assert!(coordinator.slot().is_empty());
}

#[tokio::test]
async fn stop_interrupts_live_process_and_stream_reports_real_exit() -> TestResult {
    init_tracing();
    let (coordinator, launcher) = coordinator();

    let stream = coordinator.start(&RunRequest::new("long task"))?;
    let mut process = launcher.take_process();
    process.write_line("working").await;

    let (outcome, ()) = with_timeout(async {
        tokio::join!(coordinator.stop(), process.wait_for_interrupt())
    })
    .await;
    assert_eq!(outcome, StopOutcome::Delivered);

    // stop() does not clear the slot; the process still has to exit.
    assert_eq!(coordinator.state(), RunState::Streaming);

    process.exit(-2);
    let events = with_timeout(stream.collect_events()).await;
    assert_eq!(
        events,
        vec![status("starting"), log("working"), status("exit:-2")]
    );
    assert!(coordinator.slot().is_empty());
    Ok(())
}

#[tokio::test]
async fn repeated_stop_does_not_signal_twice() -> TestResult {
    init_tracing();
    let (coordinator, launcher) = coordinator();

    let stream = coordinator.start(&RunRequest::new("long task"))?;
    let mut process = launcher.take_process();

    let (first, ()) = with_timeout(async {
        tokio::join!(coordinator.stop(), process.wait_for_interrupt())
    })
    .await;
    assert!(first.stopped());

    // No one is serving interrupts now; a second signal would hang here.
    let second = with_timeout(coordinator.stop()).await;
    assert_eq!(second, StopOutcome::Delivered);

    process.exit(130);
    let events = with_timeout(stream.collect_events()).await;
    assert_eq!(events.last(), Some(&status("exit:130")));
    Ok(())
}

#[tokio::test]
async fn stop_clears_a_stale_run_and_old_pump_cannot_evict_new_one() -> TestResult {
    init_tracing();
    let (coordinator, launcher) = coordinator();

    let old_stream = coordinator.start(&RunRequest::new("old"))?;
    let mut old = launcher.take_process();
    old.vanish();

    assert_eq!(coordinator.stop().await, StopOutcome::NotRunning);
    assert!(coordinator.slot().is_empty());

    let new_stream = coordinator.start(&RunRequest::new("new"))?;
    let new = launcher.take_process();

    // The old run finishing late must leave the new run in place.
    old.exit(1);
    let old_events = with_timeout(old_stream.collect_events()).await;
    assert_eq!(old_events.last(), Some(&status("exit:1")));
    assert_eq!(coordinator.state(), RunState::Streaming);
    assert_eq!(
        coordinator.start(&RunRequest::new("third")).unwrap_err(),
        RunError::AlreadyRunning
    );

    new.exit(0);
    with_timeout(new_stream.collect_events()).await;
    assert!(coordinator.slot().is_empty());
    Ok(())
}

#[tokio::test]
async fn dropped_observer_still_releases_slot_on_exit() -> TestResult {
    init_tracing();
    let (coordinator, launcher) = coordinator();

    let stream = coordinator.start(&RunRequest::new("task"))?;
    let process = launcher.take_process();
    drop(stream);

    process.write_line("nobody is listening").await;
    process.exit(0);

    with_timeout(async {
        while !coordinator.slot().is_empty() {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await;

    let next = coordinator.start(&RunRequest::new("next"))?;
    launcher.take_process().exit(0);
    with_timeout(next.collect_events()).await;
    Ok(())
}

#[tokio::test]
async fn credentials_become_prefixed_environment_entries() -> TestResult {
    init_tracing();
    let (coordinator, launcher) = coordinator();

    let request = RunRequestBuilder::new("log in")
        .credential("  KEY  ", "v1")
        .credential("", "v2")
        .credential("KEY", "v3")
        .build();
    let stream = coordinator.start(&request)?;
    launcher.take_process().exit(0);
    with_timeout(stream.collect_events()).await;

    let env = &launcher.launched()[0].env;
    let derived: Vec<_> = env.iter().filter(|(k, _)| k.starts_with("CRED_")).collect();
    assert_eq!(derived, vec![(&"CRED_KEY".to_string(), &"v3".to_string())]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_while_starting_interrupts_once_the_process_exists() -> TestResult {
    init_tracing();
    let (coordinator, launcher) = coordinator();
    let gate = launcher.hold_next_launch();

    let starter = {
        let coordinator = coordinator.clone();
        tokio::task::spawn_blocking(move || coordinator.start(&RunRequest::new("slow spawn")))
    };
    gate.wait_entered();
    assert_eq!(coordinator.state(), RunState::Starting);

    let stopper = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.stop().await })
    };
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(!stopper.is_finished(), "stop must wait for the spawn to settle");

    gate.release();
    let stream = with_timeout(starter).await??;
    let mut process = launcher.take_process();

    with_timeout(process.wait_for_interrupt()).await;
    assert_eq!(with_timeout(stopper).await?, StopOutcome::Delivered);

    process.exit(-2);
    let events = with_timeout(stream.collect_events()).await;
    assert_eq!(events.last(), Some(&status("exit:-2")));
    assert!(coordinator.slot().is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_while_starting_reports_not_running_when_spawn_fails() -> TestResult {
    init_tracing();
    let (coordinator, launcher) = coordinator();
    let gate = launcher.hold_next_launch();
    launcher.fail_next_spawn("permission denied");

    let starter = {
        let coordinator = coordinator.clone();
        tokio::task::spawn_blocking(move || coordinator.start(&RunRequest::new("doomed")))
    };
    gate.wait_entered();

    let stopper = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.stop().await })
    };
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(!stopper.is_finished(), "stop must wait for the spawn to settle");

    gate.release();
    let err = with_timeout(starter).await?.unwrap_err();
    assert_eq!(err, RunError::SpawnFailed("permission denied".to_string()));

    assert_eq!(with_timeout(stopper).await?, StopOutcome::NotRunning);
    assert!(coordinator.slot().is_empty());
    Ok(())
}
