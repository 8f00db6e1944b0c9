//! One active turn per session.

mod common;

use std::time::Duration;

use common::{wait_for_content, wait_for_requests, Harness, SESSION};

use parlor::adapters::mock::{frame_chunk, MockStream};
use parlor::error::TurnError;
use parlor::models::{MessageRole, TurnStatus};

#[tokio::test]
async fn test_superseded_turn_never_writes_again() {
    let harness = Harness::new();
    let (old_sender, old_stream) = MockStream::channel();
    harness.transport.push(old_stream);
    harness
        .transport
        .push(MockStream::frames(&[r#"{"content":"new answer"}"#, "[DONE]"]));
    let mut feed = harness.registry.subscribe();

    let first = harness.registry.start(SESSION, "first", vec![]);
    old_sender
        .send(Ok(frame_chunk(r#"{"content":"old "}"#)))
        .unwrap();
    wait_for_content(&mut feed, "old ").await;

    let second = harness.registry.start(SESSION, "second", vec![]);
    assert_eq!(first.status(), TurnStatus::Aborted);

    // Late frames on the superseded stream
    let _ = old_sender.send(Ok(frame_chunk(r#"{"content":"late"}"#)));
    let _ = old_sender.send(Ok(frame_chunk("[DONE]")));

    assert_eq!(first.wait().await.status, TurnStatus::Aborted);
    assert_eq!(second.wait().await.status, TurnStatus::Done);

    let transcript = harness.transcript();
    assert!(!transcript.iter().any(|(_, c)| c.contains("late")));
    assert_eq!(
        transcript,
        vec![
            (MessageRole::User, "first".to_string()),
            (MessageRole::Assistant, "old ".to_string()),
            (MessageRole::User, "second".to_string()),
            (MessageRole::Assistant, "new answer".to_string()),
        ]
    );
    assert!(harness.messages().iter().all(|m| m.terminal));
}

#[tokio::test]
async fn test_try_start_on_busy_session() {
    let harness = Harness::new();
    harness.transport.push(MockStream::frames_then_hang(&[]));

    let first = harness.registry.try_start(SESSION, "one", vec![]).unwrap();
    let second = harness.registry.try_start(SESSION, "two", vec![]);

    assert_eq!(
        second.unwrap_err(),
        TurnError::SessionBusy {
            session_id: SESSION.to_string()
        }
    );
    assert!(!TurnError::SessionBusy {
        session_id: SESSION.to_string()
    }
    .is_fatal());
    assert_eq!(first.status(), TurnStatus::Streaming);

    first.abort();
    first.wait().await;
}

#[tokio::test]
async fn test_try_start_after_previous_finished() {
    let harness = Harness::new();
    harness.transport.push(MockStream::frames(&["[DONE]"]));
    harness.transport.push(MockStream::frames(&["[DONE]"]));

    let first = harness.registry.try_start(SESSION, "one", vec![]).unwrap();
    first.wait().await;

    let second = harness.registry.try_start(SESSION, "two", vec![]);
    assert!(second.is_ok());
    assert!(second.unwrap().wait().await.is_done());
}

#[tokio::test]
async fn test_session_free_after_done_on_open_stream() {
    let harness = Harness::new();
    harness.transport.push(MockStream::frames_then_hang(&[
        r#"{"content":"all done"}"#,
        r#"{"done":true}"#,
    ]));
    harness.transport.push(MockStream::frames(&["[DONE]"]));

    let first = harness.registry.try_start(SESSION, "one", vec![]).unwrap();
    let outcome = tokio::time::timeout(Duration::from_secs(1), first.wait())
        .await
        .expect("completion should end the turn");
    assert_eq!(outcome.status, TurnStatus::Done);
    for _ in 0..100 {
        if harness.registry.active_turn_id(SESSION).is_none() {
            break;
        }
        tokio::task::yield_now().await;
    }

    let second = harness.registry.try_start(SESSION, "two", vec![]);
    assert!(second.is_ok());
    assert!(second.unwrap().wait().await.is_done());
}

#[tokio::test]
async fn test_active_entry_released_on_terminal_state() {
    let harness = Harness::new();
    harness.transport.push(MockStream::frames_then_hang(&[]));

    let handle = harness.registry.start(SESSION, "q", vec![]);
    wait_for_requests(&harness.transport, 1).await;
    let id = handle.id().to_string();
    assert_eq!(harness.registry.active_turn_id(SESSION), Some(id));

    handle.abort();
    handle.wait().await;
    for _ in 0..100 {
        if harness.registry.active_turn_id(SESSION).is_none() {
            break;
        }
        tokio::task::yield_now().await;
    }

    assert_eq!(harness.registry.active_turn_id(SESSION), None);
    assert!(!harness.registry.abort(SESSION));
}

#[tokio::test]
async fn test_remove_session_returns_conversation() {
    let harness = Harness::new();
    harness
        .transport
        .push(MockStream::frames(&[r#"{"content":"bye"}"#, "[DONE]"]));

    harness.registry.start(SESSION, "q", vec![]).wait().await;
    let conversation = harness.registry.remove(SESSION).unwrap();

    assert_eq!(conversation.len(), 2);
    assert!(harness.registry.messages(SESSION).is_empty());
}
