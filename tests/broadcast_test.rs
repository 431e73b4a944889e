//! Broadcasting against scripted relays.

mod common;

use std::time::Duration;

use common::{setup_broadcaster, signed_note, wait_for_event, RelayBehavior, TEST_PUBKEY};
use nostr_gateway::crypto::SchnorrSigner;
use nostr_gateway::nostr::{EventDraft, RelayStatus};
use nostr_gateway::GatewayError;
use serde_json::json;

const GOOD: &str = "wss://good.example";
const PICKY: &str = "wss://picky.example";
const SILENT: &str = "wss://silent.example";
const DOWN: &str = "wss://down.example";
const SLOW: &str = "wss://slow.example";

#[tokio::test]
async fn test_mixed_outcomes_are_aggregated_per_relay() {
    let (broadcaster, _client, _store) = setup_broadcaster(&[
        (GOOD, RelayBehavior::Accept),
        (PICKY, RelayBehavior::Reject("bad event")),
        (SILENT, RelayBehavior::Hang),
    ])
    .await;
    let event = signed_note("hello relays", json!([]), 1_700_000_000);

    tokio::time::pause();
    let started = tokio::time::Instant::now();
    let result = broadcaster.broadcast(&event).await;

    // Bounded by the single publish timeout, not the sum over relays.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(10));
    assert!(elapsed < Duration::from_secs(11));

    assert_eq!(result.event_id, event.id);
    assert_eq!(result.published_count, 1);
    assert_eq!(result.total_relays, 3);

    let urls: Vec<&str> = result.results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, vec![GOOD, PICKY, SILENT]);

    assert!(result.results[0].success);
    assert_eq!(result.results[0].message.as_deref(), Some("Published successfully"));
    assert_eq!(result.results[1].error.as_deref(), Some("bad event"));
    assert_eq!(result.results[2].error.as_deref(), Some("Publish timeout"));

    let tracker = broadcaster.tracker();
    assert_eq!(
        tracker.get(GOOD),
        Some(RelayStatus {
            connected: true,
            last_error: None
        })
    );
    assert_eq!(tracker.get(PICKY).unwrap().last_error.as_deref(), Some("bad event"));
    assert!(!tracker.get(SILENT).unwrap().connected);
    assert_eq!(
        tracker.get(SILENT).unwrap().last_error.as_deref(),
        Some("Publish timeout")
    );
}

#[tokio::test]
async fn test_custom_publish_timeout() {
    let (broadcaster, _client, _store) = setup_broadcaster(&[(SILENT, RelayBehavior::Hang)]).await;
    let broadcaster = broadcaster.with_publish_timeout(Duration::from_secs(2));
    let event = signed_note("quick", json!([]), 1_700_000_000);

    tokio::time::pause();
    let started = tokio::time::Instant::now();
    let result = broadcaster.broadcast(&event).await;

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(result.published_count, 0);
    assert_eq!(result.results[0].error.as_deref(), Some("Publish timeout"));
}

#[tokio::test]
async fn test_late_acknowledgement_is_ignored() {
    let (broadcaster, client, _store) = setup_broadcaster(&[
        (SLOW, RelayBehavior::Delayed(Duration::from_secs(11))),
        (GOOD, RelayBehavior::Accept),
    ])
    .await;
    let event = signed_note("too slow", json!([]), 1_700_000_000);

    tokio::time::pause();
    let result = broadcaster.broadcast(&event).await;

    assert_eq!(result.published_count, 1);
    assert!(!result.results[0].success);
    assert_eq!(result.results[0].error.as_deref(), Some("Publish timeout"));

    // Well past the moment the slow relay would have answered.
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(client.acknowledged(), vec![GOOD.to_string()]);
    assert_eq!(
        broadcaster.tracker().get(SLOW),
        Some(RelayStatus {
            connected: false,
            last_error: Some("Publish timeout".to_string())
        })
    );
}

#[tokio::test]
async fn test_unreachable_relay_does_not_affect_others() {
    let (broadcaster, client, _store) = setup_broadcaster(&[
        (DOWN, RelayBehavior::Unreachable("connection refused")),
        (GOOD, RelayBehavior::Accept),
    ])
    .await;
    let event = signed_note("isolated", json!([]), 1_700_000_000);

    let result = broadcaster.broadcast(&event).await;

    assert_eq!(result.published_count, 1);
    assert!(!result.results[0].success);
    assert_eq!(result.results[0].error.as_deref(), Some("connection refused"));
    assert!(result.results[1].success);

    // The unreachable relay never saw a publish attempt.
    assert_eq!(client.published(), vec![(GOOD.to_string(), event.id.clone())]);
    assert_eq!(
        broadcaster.tracker().get(DOWN).unwrap().last_error.as_deref(),
        Some("connection refused")
    );
}

#[tokio::test]
async fn test_zero_successes_is_still_a_result() {
    let (broadcaster, _client, _store) = setup_broadcaster(&[
        (PICKY, RelayBehavior::Reject("")),
        (DOWN, RelayBehavior::Unreachable("dns failure")),
    ])
    .await;
    let event = signed_note("nobody listens", json!([]), 1_700_000_000);

    let result = broadcaster.broadcast(&event).await;
    assert_eq!(result.published_count, 0);
    assert_eq!(result.total_relays, 2);
    assert_eq!(result.results[0].error.as_deref(), Some("Publish failed"));
}

#[tokio::test]
async fn test_publish_signs_persists_and_broadcasts() {
    let (broadcaster, client, store) = setup_broadcaster(&[(GOOD, RelayBehavior::Accept)]).await;
    let draft = broadcaster
        .builder()
        .build("persist me", &json!([["t", "gateway"]]));

    let result = broadcaster.publish(draft).await.unwrap();
    assert_eq!(result.published_count, 1);
    assert_eq!(client.published().len(), 1);

    let stored = wait_for_event(&store, &result.event_id)
        .await
        .expect("event is persisted");
    assert_eq!(stored.pubkey, TEST_PUBKEY);
    assert_eq!(stored.content, "persist me");
    assert!(SchnorrSigner::new().verify(&stored).unwrap());
}

#[tokio::test]
async fn test_event_is_persisted_even_when_no_relay_accepts() {
    let (broadcaster, _client, store) =
        setup_broadcaster(&[(DOWN, RelayBehavior::Unreachable("offline"))]).await;
    let draft = EventDraft::new(1, "kept locally", vec![]);

    let result = broadcaster.publish(draft).await.unwrap();
    assert_eq!(result.published_count, 0);
    assert!(wait_for_event(&store, &result.event_id).await.is_some());
}

#[tokio::test]
async fn test_republishing_the_same_event_is_harmless() {
    let (broadcaster, client, store) = setup_broadcaster(&[(GOOD, RelayBehavior::Accept)]).await;
    let event = signed_note("twice", json!([]), 1_700_000_000);

    let first = broadcaster.publish(EventDraft::from(event.clone())).await.unwrap();
    let second = broadcaster.publish(EventDraft::from(event.clone())).await.unwrap();

    assert_eq!(first.event_id, event.id);
    assert_eq!(second.event_id, event.id);
    assert_eq!(client.published().len(), 2);

    wait_for_event(&store, &event.id).await.expect("event is persisted");
    broadcaster.persist_detached(event).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_invalid_event_fails_before_any_relay_is_contacted() {
    let (broadcaster, client, store) = setup_broadcaster(&[(GOOD, RelayBehavior::Accept)]).await;

    let err = broadcaster
        .publish_value(&json!({"kind": "1", "content": "typed wrong"}))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::InvalidEvent(_)));

    let mut draft = EventDraft::new(1, "bad id", vec![]);
    draft.id = Some("xyz".to_string());
    assert!(broadcaster.publish(draft).await.is_err());

    assert!(client.published().is_empty());
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_startup_check_records_reachability() {
    let (broadcaster, client, _store) = setup_broadcaster(&[
        (GOOD, RelayBehavior::Accept),
        (DOWN, RelayBehavior::Unreachable("timed out")),
    ])
    .await;

    let tracker = broadcaster.tracker();
    tracker.probe_all(client.as_ref()).await;

    let listing = tracker.list();
    assert_eq!(listing.len(), 2);
    assert!(listing[0].connected);
    assert!(!listing[1].connected);
    assert_eq!(listing[1].error.as_deref(), Some("timed out"));
    assert_eq!(client.released(), vec![GOOD.to_string()]);
}
