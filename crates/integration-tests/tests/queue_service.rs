//! Integration tests for the queue service against `PostgreSQL`.
//!
//! Run with `cargo test -p barberq-integration-tests -- --ignored` and
//! `BARBERQ_TEST_DATABASE_URL` pointing at a scratch database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use barberq_core::{Email, QueueStatus};
use barberq_integration_tests::{TestContext, client};
use barberq_server::db::PersonRepository;
use barberq_server::services::QueueError;
use barberq_server::services::queue::{JoinRequest, NotifyRequest, RegisterRequest};

fn join_request(barber: &Email, service: &str) -> JoinRequest {
    JoinRequest {
        barber_email: Some(barber.as_str().to_owned()),
        service: Some(service.to_owned()),
        ..Default::default()
    }
}

// =============================================================================
// Join
// =============================================================================

#[tokio::test]
#[ignore = "requires database"]
async fn test_repeated_join_does_not_grow_queue() {
    let ctx = TestContext::new().await;
    let (barber_id, email) = ctx.barber("Zé").await;
    let ana = client("Ana");
    let service = ctx.service();

    let first = service.join(&ana, join_request(&email, "Corte")).await.unwrap();
    let second = service.join(&ana, join_request(&email, "Barba")).await.unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.entry_id, second.entry_id);
    assert_eq!(second.position, Some(1));

    let queue = service.barber_queue(barber_id).await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].service, "Corte");
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_concurrent_joins_keep_one_active_entry() {
    let ctx = TestContext::new().await;
    let (barber_id, email) = ctx.barber("Zé").await;
    let ana = client("Ana");

    let service_a = ctx.service();
    let service_b = ctx.service();
    let (a, b) = tokio::join!(
        service_a.join(&ana, join_request(&email, "Corte")),
        service_b.join(&ana, join_request(&email, "Corte")),
    );

    // The loser of the person upsert race may see a conflict; never two entries
    let created = [a, b].into_iter().filter_map(Result::ok).filter(|r| r.created).count();
    assert!(created <= 1);
    assert!(ctx.service().barber_queue(barber_id).await.unwrap().len() <= 1);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_join_unknown_barber_is_not_found() {
    let ctx = TestContext::new().await;
    let email = Email::parse("nobody-here@barbearia.test").unwrap();

    let err = ctx
        .service()
        .join(&client("Ana"), join_request(&email, "Corte"))
        .await
        .unwrap_err();
    assert!(matches!(err, QueueError::NotFound("barber")));
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_join_after_done_creates_new_entry() {
    let ctx = TestContext::new().await;
    let (barber_id, email) = ctx.barber("Zé").await;
    let ana = client("Ana");
    let service = ctx.service();

    let first = service.join(&ana, join_request(&email, "Corte")).await.unwrap();
    service
        .transition(barber_id, first.entry_id, QueueStatus::InService)
        .await
        .unwrap();
    service
        .transition(barber_id, first.entry_id, QueueStatus::Done)
        .await
        .unwrap();

    let again = service.join(&ana, join_request(&email, "Barba")).await.unwrap();
    assert!(again.created);
    assert_ne!(again.entry_id, first.entry_id);
    assert_eq!(again.position, Some(1));
}

// =============================================================================
// Transitions
// =============================================================================

#[tokio::test]
#[ignore = "requires database"]
async fn test_invalid_transitions_are_rejected() {
    let ctx = TestContext::new().await;
    let (barber_id, email) = ctx.barber("Zé").await;
    let service = ctx.service();
    let joined = service
        .join(&client("Ana"), join_request(&email, "Corte"))
        .await
        .unwrap();

    let err = service
        .transition(barber_id, joined.entry_id, QueueStatus::Done)
        .await
        .unwrap_err();
    assert!(matches!(err, QueueError::InvalidTransition(_)));

    let cancelled = service
        .transition(barber_id, joined.entry_id, QueueStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.id, joined.entry_id);
    assert_eq!(cancelled.status, QueueStatus::Cancelled);
    assert_eq!(cancelled.position, None);

    let err = service
        .transition(barber_id, joined.entry_id, QueueStatus::Waiting)
        .await
        .unwrap_err();
    assert!(matches!(err, QueueError::InvalidTransition(_)));
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_transition_requires_owning_barber() {
    let ctx = TestContext::new().await;
    let (_, email) = ctx.barber("Zé").await;
    let (other_barber, _) = ctx.barber("Rui").await;
    let service = ctx.service();
    let joined = service
        .join(&client("Ana"), join_request(&email, "Corte"))
        .await
        .unwrap();

    let err = service
        .transition(other_barber, joined.entry_id, QueueStatus::InService)
        .await
        .unwrap_err();
    assert!(matches!(err, QueueError::NotFound(_)));
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_positions_follow_service_progress() {
    let ctx = TestContext::new().await;
    let (barber_id, email) = ctx.barber("Zé").await;
    let service = ctx.service();

    let p = service.join(&client("P"), join_request(&email, "Corte")).await.unwrap();
    let q = service.join(&client("Q"), join_request(&email, "Barba")).await.unwrap();
    assert_eq!((p.position, q.position), (Some(1), Some(2)));

    service
        .transition(barber_id, p.entry_id, QueueStatus::InService)
        .await
        .unwrap();
    let queue = service.barber_queue(barber_id).await.unwrap();
    assert_eq!(queue[0].position, Some(1));
    assert_eq!(queue[1].position, Some(2));

    let done = service
        .transition(barber_id, p.entry_id, QueueStatus::Done)
        .await
        .unwrap();
    assert_eq!(done.status, QueueStatus::Done);
    assert_eq!(done.position, None);

    let queue = service.barber_queue(barber_id).await.unwrap();
    let ids: Vec<_> = queue.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![p.entry_id, q.entry_id]);
    assert_eq!(queue[0].status, QueueStatus::Done);
    assert_eq!(queue[1].position, Some(1));
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_cancelled_entries_are_hidden() {
    let ctx = TestContext::new().await;
    let (barber_id, email) = ctx.barber("Zé").await;
    let service = ctx.service();

    let p = service.join(&client("P"), join_request(&email, "Corte")).await.unwrap();
    service.join(&client("Q"), join_request(&email, "Corte")).await.unwrap();
    let cancelled = service
        .transition(barber_id, p.entry_id, QueueStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.status, QueueStatus::Cancelled);
    assert_eq!(cancelled.position, None);

    let queue = service.barber_queue(barber_id).await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].position, Some(1));

    let public = service.public_queue(Some(email.as_str())).await.unwrap();
    assert_eq!(public.len(), 1);
    assert_eq!(public[0].client_name.as_deref(), Some("Q"));
}

// =============================================================================
// Client views
// =============================================================================

#[tokio::test]
#[ignore = "requires database"]
async fn test_client_snapshot_tracks_own_entry() {
    let ctx = TestContext::new().await;
    let (_, email) = ctx.barber("Zé").await;
    let service = ctx.service();
    let ana = client("Ana");
    let bia = client("Bia");

    let snapshot = service.client_snapshot(&ana).await.unwrap();
    assert!(snapshot.entry.is_none());

    service.join(&bia, join_request(&email, "Corte")).await.unwrap();
    let joined = service.join(&ana, join_request(&email, "Corte")).await.unwrap();

    let snapshot = service.client_snapshot(&ana).await.unwrap();
    assert_eq!(snapshot.entry.map(|e| e.id), Some(joined.entry_id));
    assert_eq!(snapshot.position, Some(2));
    assert_eq!(snapshot.queue.len(), 2);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_profile_and_barber_registration() {
    let ctx = TestContext::new().await;
    let service = ctx.service();
    let identity = client("Carla");

    let err = service.profile(&identity).await.unwrap_err();
    assert!(matches!(err, QueueError::NotFound("person")));

    let (person, created) = service
        .register_barber(&identity, RegisterRequest::default())
        .await
        .unwrap();
    assert!(created);
    assert!(person.is_barber());

    let (again, created) = service
        .register_barber(&identity, RegisterRequest::default())
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(again.id, person.id);

    assert_eq!(service.profile(&identity).await.unwrap().id, person.id);
}

// =============================================================================
// Removal
// =============================================================================

#[tokio::test]
#[ignore = "requires database"]
async fn test_removing_last_entry_leaves_empty_queue() {
    let ctx = TestContext::new().await;
    let (barber_id, email) = ctx.barber("Zé").await;
    let service = ctx.service();
    let ana = client("Ana");
    let joined = service.join(&ana, join_request(&email, "Corte")).await.unwrap();

    service.remove(barber_id, joined.entry_id).await.unwrap();

    assert!(service.barber_queue(barber_id).await.unwrap().is_empty());
    // The client had no other entries
    let repo = PersonRepository::new(&ctx.pool);
    assert!(repo.get_by_external_id(&ana.uid).await.unwrap().is_none());
    // The barber is kept
    assert!(repo.get_by_id(barber_id).await.unwrap().is_some());

    let err = service.remove(barber_id, joined.entry_id).await.unwrap_err();
    assert!(matches!(err, QueueError::NotFound(_)));
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_remove_keeps_client_with_other_entries() {
    let ctx = TestContext::new().await;
    let (ze, ze_email) = ctx.barber("Zé").await;
    let (_, rui_email) = ctx.barber("Rui").await;
    let service = ctx.service();
    let ana = client("Ana");

    let with_ze = service.join(&ana, join_request(&ze_email, "Corte")).await.unwrap();
    service.join(&ana, join_request(&rui_email, "Barba")).await.unwrap();

    service.remove(ze, with_ze.entry_id).await.unwrap();

    let repo = PersonRepository::new(&ctx.pool);
    assert!(repo.get_by_external_id(&ana.uid).await.unwrap().is_some());
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_clear_empty_queue_returns_zero() {
    let ctx = TestContext::new().await;
    let (barber_id, _) = ctx.barber("Zé").await;

    let cleared = ctx.service().clear(barber_id).await.unwrap();
    assert_eq!(cleared.entries, 0);
    assert_eq!(cleared.persons, 0);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_clear_is_scoped_to_barber() {
    let ctx = TestContext::new().await;
    let (ze, ze_email) = ctx.barber("Zé").await;
    let (rui, rui_email) = ctx.barber("Rui").await;
    let service = ctx.service();

    service.join(&client("Ana"), join_request(&ze_email, "Corte")).await.unwrap();
    service.join(&client("Bia"), join_request(&ze_email, "Corte")).await.unwrap();
    service.join(&client("Caio"), join_request(&rui_email, "Corte")).await.unwrap();

    let cleared = service.clear(ze).await.unwrap();
    assert_eq!(cleared.entries, 2);
    assert_eq!(cleared.persons, 2);

    assert!(service.barber_queue(ze).await.unwrap().is_empty());
    assert_eq!(service.barber_queue(rui).await.unwrap().len(), 1);
}

// =============================================================================
// Notify
// =============================================================================

#[tokio::test]
#[ignore = "requires database"]
async fn test_notify_uses_stored_contact() {
    let ctx = TestContext::new().await;
    let (barber_id, email) = ctx.barber("Zé").await;
    let service = ctx.service();
    let ana = client("Ana");
    let joined = service.join(&ana, join_request(&email, "Corte")).await.unwrap();

    let links = service
        .notify(barber_id, joined.entry_id, NotifyRequest::default())
        .await
        .unwrap();

    let digits: String = ana.phone.unwrap().chars().filter(char::is_ascii_digit).collect();
    assert_eq!(links.phone.as_str(), digits);
    assert_eq!(links.recipient_name, "Ana");
    assert!(links.web_url.starts_with(&format!("https://wa.me/{digits}?text=")));
}
