//! Composed flow: the response controller answers within its budget while
//! the persistence queue commits the resulting mutation in the background.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use herald_core::{ActionId, MemoryBackend};
use herald_queue::{CommitQueue, QueueConfig, SnapshotStore};
use herald_responder::{
    ActionKind, ActionState, BoxError, BudgetOptions, ReplyContent, ResponderConfig,
    ResponseController,
};
use herald_test_utils::{GatewayCallKind, ScriptedGateway, SimulatedClock, init_test_logging};

#[tokio::test(start_paused = true)]
async fn approval_flow_replies_fast_and_persists_in_background() {
    init_test_logging();

    let clock = SimulatedClock::shared();
    let gateway = Arc::new(ScriptedGateway::new(clock.clone()));
    let controller = ResponseController::new(
        gateway.clone(),
        clock.clone(),
        ResponderConfig::default(),
    )
    .expect("valid config");

    let backend = Arc::new(MemoryBackend::new());
    let store = Arc::new(SnapshotStore::new(backend));
    let queue = CommitQueue::new(store.clone(), clock.clone(), QueueConfig::default())
        .expect("valid config");

    let id: ActionId = "900".parse().unwrap();
    controller.register(id.clone(), ActionKind::ButtonPress).unwrap();

    // The button was pressed 300ms ago by the time the handler runs.
    clock.advance(Duration::from_millis(300));

    let persist_queue = queue.clone();
    let handled = controller
        .run_with_budget(
            &id,
            BudgetOptions::default(),
            async { Ok(ReplyContent::text("request approved")) },
            Some(async move {
                let outcome = persist_queue.submit(
                    "pedidos",
                    Bytes::from(r#"{"status": "approved"}"#),
                    "approval recorded",
                );
                if outcome.resolved().await {
                    Ok(())
                } else {
                    Err::<(), BoxError>("commit failed".into())
                }
            }),
        )
        .await;

    assert!(handled);
    assert_eq!(
        controller.snapshot(&id).unwrap().state,
        ActionState::Completed
    );

    // The caller saw a direct reply and the follow-up result.
    let calls = gateway.calls();
    assert_eq!(calls[0].kind, GatewayCallKind::Acknowledge);
    assert_eq!(calls[1].kind, GatewayCallKind::FollowUp);
    assert_eq!(calls[1].text.as_deref(), Some("request approved"));

    // The background submission drains into a durable commit.
    let mut head = None;
    for _ in 0..50 {
        head = store.head_commit().await.expect("head readable");
        if head.is_some() {
            break;
        }
        tokio::task::yield_now().await;
    }
    let head = head.expect("background commit landed");
    assert_eq!(head.label, "approval recorded");
    assert_eq!(head.targets, vec!["pedidos".to_string()]);

    let record = store
        .read_record("pedidos")
        .await
        .expect("record readable")
        .expect("record staged");
    assert_eq!(record, Bytes::from(r#"{"status": "approved"}"#));
}

#[tokio::test(start_paused = true)]
async fn queue_failure_stays_behind_the_error_boundary() {
    let clock = SimulatedClock::shared();
    let gateway = Arc::new(ScriptedGateway::new(clock.clone()));
    let controller = ResponseController::new(
        gateway.clone(),
        clock.clone(),
        ResponderConfig::default(),
    )
    .expect("valid config");

    let store = Arc::new(SnapshotStore::new(Arc::new(MemoryBackend::new())));
    let recording = herald_test_utils::RecordingCommitStore::new(store);
    recording.fail_next_commit(herald_queue::error::Error::conflict("head moved"));
    let queue = CommitQueue::new(
        Arc::new(recording.clone()),
        clock.clone(),
        QueueConfig::default(),
    )
    .expect("valid config");

    let id: ActionId = "901".parse().unwrap();
    controller.register(id.clone(), ActionKind::FormSubmit).unwrap();

    let persist_queue = queue.clone();
    let handled = controller
        .run_with_budget(
            &id,
            BudgetOptions::default(),
            async { Ok(ReplyContent::text("saved")) },
            Some(async move {
                let outcome =
                    persist_queue.submit("config", Bytes::from("{}"), "settings change");
                if outcome.resolved().await {
                    Ok(())
                } else {
                    Err::<(), BoxError>("commit failed".into())
                }
            }),
        )
        .await;

    // The caller's exchange already completed; the failed background
    // commit is logged, never surfaced.
    assert!(handled);
    assert_eq!(
        controller.snapshot(&id).unwrap().state,
        ActionState::Completed
    );

    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(recording.commit_count(), 1);
}
