//! Event catalog lifecycle integration tests
//!
//! Creation round trips, the publish guards, the cancellation cascade and
//! the deletion rules, all against a real Postgres.

mod helpers;

use helpers::*;
use serial_test::serial;

use evently::models::event::{EventFilters, EventStatus, UpdateEventRequest};
use evently::models::ticket::{TicketStatus, UpdateTicketRequest};
use evently::models::user::UserRole;
use evently::EventlyError;

#[tokio::test]
#[serial]
async fn create_paid_event_round_trips_tickets_and_questions() {
    let db = TestDatabase::new().await.expect("test database");
    db.truncate().await.expect("truncate");
    let services = db.services();

    let organiser_id = seed_user(&db.pool, "org@example.com", UserRole::Organizer)
        .await
        .expect("seed organiser");

    let request = paid_event_request(
        "Jazz Night",
        100,
        vec![ticket("VIP", 12000, 10), ticket("Standard", 4500, 90)],
        vec![
            question("Dietary requirements?", true, 1),
            question("Accessibility needs?", false, 2),
            question("How did you hear about us?", false, 3),
        ],
    );

    let details = services
        .events
        .create_event(organiser_id, request)
        .await
        .expect("create event");

    assert_eq!(details.event.status, EventStatus::Draft);
    assert!(!details.event.is_free);
    assert_eq!(details.registration_count, 0);

    // Tickets come back cheapest first
    assert_eq!(details.tickets.len(), 2);
    assert_eq!(details.tickets[0].name, "Standard");
    assert_eq!(details.tickets[1].name, "VIP");
    assert_eq!(details.tickets[0].quantity_sold, 0);

    // Questions in display order
    let order: Vec<i32> = details.questions.iter().map(|q| q.display_order).collect();
    assert_eq!(order, vec![1, 2, 3]);
    assert!(details.questions[0].is_required);
}

#[tokio::test]
#[serial]
async fn publishing_requires_at_least_one_question() {
    let db = TestDatabase::new().await.expect("test database");
    db.truncate().await.expect("truncate");
    let services = db.services();

    let organiser_id = seed_user(&db.pool, "org@example.com", UserRole::Organizer)
        .await
        .expect("seed organiser");
    let ctx = organizer_ctx(organiser_id);

    let bare = services
        .events
        .create_event(organiser_id, free_event_request("Bare Event", 10, vec![]))
        .await
        .expect("create event");

    let err = services
        .events
        .update_event_status(bare.event.id, EventStatus::Published, &ctx)
        .await
        .expect_err("publish should fail");
    assert!(matches!(err, EventlyError::Validation(msg)
        if msg.contains("at least one question")));

    let ready = services
        .events
        .create_event(
            organiser_id,
            free_event_request("Ready Event", 10, vec![question("Name tag text?", false, 1)]),
        )
        .await
        .expect("create event");

    let published = services
        .events
        .update_event_status(ready.event.id, EventStatus::Published, &ctx)
        .await
        .expect("publish");
    assert_eq!(published.status, EventStatus::Published);
}

#[tokio::test]
#[serial]
async fn cancelling_a_published_event_cancels_its_registrations() {
    let db = TestDatabase::new().await.expect("test database");
    db.truncate().await.expect("truncate");
    let services = db.services();

    let organiser_id = seed_user(&db.pool, "org@example.com", UserRole::Organizer)
        .await
        .expect("seed organiser");
    let ctx = organizer_ctx(organiser_id);

    let event = services
        .events
        .create_event(
            organiser_id,
            free_event_request("Doomed Event", 20, vec![question("Any notes?", false, 1)]),
        )
        .await
        .expect("create event");
    services
        .events
        .update_event_status(event.event.id, EventStatus::Published, &ctx)
        .await
        .expect("publish");

    for i in 0..5 {
        services
            .registrations
            .register_for_event(registration_request(
                event.event.id,
                &format!("attendee{i}@example.com"),
            ))
            .await
            .expect("register");
    }

    let cancelled = services
        .events
        .update_event_status(event.event.id, EventStatus::Cancelled, &ctx)
        .await
        .expect("cancel");
    assert_eq!(cancelled.status, EventStatus::Cancelled);

    let (live,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND status != 'CANCELLED'",
    )
    .bind(event.event.id)
    .fetch_one(&db.pool)
    .await
    .expect("count");
    assert_eq!(live, 0);

    // Participants survive the cascade
    assert_eq!(db.count_rows("participants").await.expect("count"), 5);

    // A cancelled event can only go back to draft
    let err = services
        .events
        .update_event_status(event.event.id, EventStatus::Published, &ctx)
        .await
        .expect_err("republish should fail");
    assert!(matches!(err, EventlyError::InvalidStateTransition { .. }));

    let drafted = services
        .events
        .update_event_status(event.event.id, EventStatus::Draft, &ctx)
        .await
        .expect("back to draft");
    assert_eq!(drafted.status, EventStatus::Draft);
}

#[tokio::test]
#[serial]
async fn events_with_registrations_cannot_be_deleted() {
    let db = TestDatabase::new().await.expect("test database");
    db.truncate().await.expect("truncate");
    let services = db.services();

    let organiser_id = seed_user(&db.pool, "org@example.com", UserRole::Organizer)
        .await
        .expect("seed organiser");
    let ctx = organizer_ctx(organiser_id);

    let event = services
        .events
        .create_event(
            organiser_id,
            free_event_request("Busy Event", 10, vec![question("Any notes?", false, 1)]),
        )
        .await
        .expect("create event");
    services
        .events
        .update_event_status(event.event.id, EventStatus::Published, &ctx)
        .await
        .expect("publish");
    services
        .registrations
        .register_for_event(registration_request(event.event.id, "pat@example.com"))
        .await
        .expect("register");

    let err = services
        .events
        .delete_event(event.event.id, &ctx)
        .await
        .expect_err("delete should fail");
    assert!(matches!(err, EventlyError::Validation(msg)
        if msg.contains("cancel the event instead")));

    // A fresh draft deletes cleanly
    let draft = services
        .events
        .create_event(organiser_id, free_event_request("Scratch", 10, vec![]))
        .await
        .expect("create event");
    services
        .events
        .delete_event(draft.event.id, &ctx)
        .await
        .expect("delete draft");
    let gone = services.events.get_event_by_id(draft.event.id).await;
    assert!(matches!(gone, Err(EventlyError::NotFound { .. })));
}

#[tokio::test]
#[serial]
async fn completed_events_are_immutable() {
    let db = TestDatabase::new().await.expect("test database");
    db.truncate().await.expect("truncate");
    let services = db.services();

    let organiser_id = seed_user(&db.pool, "org@example.com", UserRole::Organizer)
        .await
        .expect("seed organiser");
    let ctx = organizer_ctx(organiser_id);

    let event = services
        .events
        .create_event(organiser_id, free_event_request("Past Event", 10, vec![]))
        .await
        .expect("create event");

    // Completion happens out of band once the event date passes
    sqlx::query("UPDATE events SET status = 'COMPLETED' WHERE id = $1")
        .bind(event.event.id)
        .execute(&db.pool)
        .await
        .expect("mark completed");

    let update = UpdateEventRequest {
        name: Some("Renamed".to_string()),
        ..Default::default()
    };
    let err = services
        .events
        .update_event(event.event.id, update, &ctx)
        .await
        .expect_err("update should fail");
    assert!(matches!(err, EventlyError::Validation(msg)
        if msg.contains("completed event")));

    let err = services
        .events
        .update_event_status(event.event.id, EventStatus::Draft, &ctx)
        .await
        .expect_err("transition should fail");
    assert!(matches!(err, EventlyError::InvalidStateTransition { .. }));
}

#[tokio::test]
#[serial]
async fn paid_to_free_toggle_is_blocked_by_registrations() {
    let db = TestDatabase::new().await.expect("test database");
    db.truncate().await.expect("truncate");
    let services = db.services();

    let organiser_id = seed_user(&db.pool, "org@example.com", UserRole::Organizer)
        .await
        .expect("seed organiser");
    let ctx = organizer_ctx(organiser_id);

    let event = services
        .events
        .create_event(
            organiser_id,
            paid_event_request(
                "Paid Social",
                20,
                vec![ticket("Standard", 1500, 10)],
                vec![question("Any notes?", false, 1)],
            ),
        )
        .await
        .expect("create event");
    let ticket_id = event.tickets[0].id;
    services
        .events
        .update_event_status(event.event.id, EventStatus::Published, &ctx)
        .await
        .expect("publish");

    let mut registration = registration_request(event.event.id, "buyer@example.com");
    registration.ticket_id = Some(ticket_id);
    registration.quantity = Some(1);
    services
        .registrations
        .register_for_event(registration)
        .await
        .expect("register");

    let to_free = UpdateEventRequest {
        is_free: Some(true),
        ..Default::default()
    };
    let err = services
        .events
        .update_event(event.event.id, to_free, &ctx)
        .await
        .expect_err("toggle should fail");
    assert!(matches!(err, EventlyError::Validation(msg)
        if msg.contains("registrations exist")));

    // The rejected toggle leaves the event and its tickets untouched
    let unchanged = services
        .events
        .get_event_by_id(event.event.id)
        .await
        .expect("event");
    assert!(!unchanged.is_free);
    let ticket = services
        .tickets
        .get_ticket_by_id(ticket_id)
        .await
        .expect("ticket");
    assert_eq!(ticket.status, TicketStatus::Active);
}

#[tokio::test]
#[serial]
async fn paid_to_free_toggle_deactivates_unsold_tickets() {
    let db = TestDatabase::new().await.expect("test database");
    db.truncate().await.expect("truncate");
    let services = db.services();

    let organiser_id = seed_user(&db.pool, "org@example.com", UserRole::Organizer)
        .await
        .expect("seed organiser");
    let ctx = organizer_ctx(organiser_id);

    let event = services
        .events
        .create_event(
            organiser_id,
            paid_event_request(
                "Quiet Social",
                20,
                vec![ticket("Standard", 1500, 10)],
                vec![],
            ),
        )
        .await
        .expect("create event");
    let ticket_id = event.tickets[0].id;

    let to_free = UpdateEventRequest {
        is_free: Some(true),
        ..Default::default()
    };
    let updated = services
        .events
        .update_event(event.event.id, to_free, &ctx)
        .await
        .expect("toggle to free");
    assert!(updated.event.is_free);

    // Rows survive deactivated, so historic pricing stays queryable
    let ticket = services
        .tickets
        .get_ticket_by_id(ticket_id)
        .await
        .expect("ticket");
    assert_eq!(ticket.status, TicketStatus::Inactive);
    assert!(services
        .tickets
        .get_tickets_by_event(event.event.id)
        .await
        .expect("active tickets")
        .is_empty());
}

#[tokio::test]
#[serial]
async fn free_to_paid_toggle_requires_tickets_in_the_same_update() {
    let db = TestDatabase::new().await.expect("test database");
    db.truncate().await.expect("truncate");
    let services = db.services();

    let organiser_id = seed_user(&db.pool, "org@example.com", UserRole::Organizer)
        .await
        .expect("seed organiser");
    let ctx = organizer_ctx(organiser_id);

    let event = services
        .events
        .create_event(organiser_id, free_event_request("Free Social", 20, vec![]))
        .await
        .expect("create event");

    let bare = UpdateEventRequest {
        is_free: Some(false),
        ..Default::default()
    };
    let err = services
        .events
        .update_event(event.event.id, bare, &ctx)
        .await
        .expect_err("toggle without tickets should fail");
    assert!(matches!(err, EventlyError::Validation(msg)
        if msg.contains("ticket type is required")));

    let with_tickets = UpdateEventRequest {
        is_free: Some(false),
        tickets: Some(vec![ticket("Standard", 2000, 15)]),
        ..Default::default()
    };
    let updated = services
        .events
        .update_event(event.event.id, with_tickets, &ctx)
        .await
        .expect("toggle to paid");
    assert!(!updated.event.is_free);
    assert_eq!(updated.tickets.len(), 1);
    assert_eq!(updated.tickets[0].name, "Standard");
}

#[tokio::test]
#[serial]
async fn ticket_quantity_cannot_shrink_below_sales() {
    let db = TestDatabase::new().await.expect("test database");
    db.truncate().await.expect("truncate");
    let services = db.services();

    let organiser_id = seed_user(&db.pool, "org@example.com", UserRole::Organizer)
        .await
        .expect("seed organiser");
    let ctx = organizer_ctx(organiser_id);

    let event = services
        .events
        .create_event(
            organiser_id,
            paid_event_request(
                "Workshop",
                20,
                vec![ticket("Standard", 3000, 10)],
                vec![question("Any notes?", false, 1)],
            ),
        )
        .await
        .expect("create event");
    let ticket_id = event.tickets[0].id;
    services
        .events
        .update_event_status(event.event.id, EventStatus::Published, &ctx)
        .await
        .expect("publish");

    let mut registration = registration_request(event.event.id, "buyer@example.com");
    registration.ticket_id = Some(ticket_id);
    registration.quantity = Some(3);
    services
        .registrations
        .register_for_event(registration)
        .await
        .expect("register");

    let shrink = UpdateTicketRequest {
        quantity_total: Some(2),
        ..Default::default()
    };
    let err = services
        .tickets
        .update_ticket(ticket_id, shrink, &ctx)
        .await
        .expect_err("shrink should fail");
    assert!(matches!(err, EventlyError::Validation(msg)
        if msg.contains("below the number already sold")));

    // Shrinking to exactly the sold count is allowed
    let to_sold = UpdateTicketRequest {
        quantity_total: Some(3),
        ..Default::default()
    };
    let updated = services
        .tickets
        .update_ticket(ticket_id, to_sold, &ctx)
        .await
        .expect("shrink to sold count");
    assert_eq!(updated.quantity_total, 3);
}

#[tokio::test]
#[serial]
async fn purchased_tickets_cannot_be_deleted() {
    let db = TestDatabase::new().await.expect("test database");
    db.truncate().await.expect("truncate");
    let services = db.services();

    let organiser_id = seed_user(&db.pool, "org@example.com", UserRole::Organizer)
        .await
        .expect("seed organiser");
    let ctx = organizer_ctx(organiser_id);

    let event = services
        .events
        .create_event(
            organiser_id,
            paid_event_request(
                "Concert",
                20,
                vec![ticket("Standard", 3000, 10), ticket("VIP", 9000, 5)],
                vec![question("Any notes?", false, 1)],
            ),
        )
        .await
        .expect("create event");
    let standard_id = event.tickets[0].id;
    let vip_id = event.tickets[1].id;
    services
        .events
        .update_event_status(event.event.id, EventStatus::Published, &ctx)
        .await
        .expect("publish");

    let mut registration = registration_request(event.event.id, "buyer@example.com");
    registration.ticket_id = Some(standard_id);
    registration.quantity = Some(1);
    services
        .registrations
        .register_for_event(registration)
        .await
        .expect("register");

    let err = services
        .tickets
        .delete_ticket(standard_id, &ctx)
        .await
        .expect_err("delete should fail");
    assert!(matches!(err, EventlyError::Validation(msg)
        if msg.contains("has been purchased")));

    // The unsold ticket type still deletes
    services
        .tickets
        .delete_ticket(vip_id, &ctx)
        .await
        .expect("delete unsold ticket");
    let gone = services.tickets.get_ticket_by_id(vip_id).await;
    assert!(matches!(gone, Err(EventlyError::NotFound { .. })));
}

#[tokio::test]
#[serial]
async fn anonymous_listing_defaults_to_published_events() {
    let db = TestDatabase::new().await.expect("test database");
    db.truncate().await.expect("truncate");
    let services = db.services();

    let organiser_id = seed_user(&db.pool, "org@example.com", UserRole::Organizer)
        .await
        .expect("seed organiser");
    let admin_id = seed_user(&db.pool, "admin@example.com", UserRole::Admin)
        .await
        .expect("seed admin");
    let ctx = organizer_ctx(organiser_id);

    services
        .events
        .create_event(organiser_id, free_event_request("Hidden Draft", 10, vec![]))
        .await
        .expect("create draft");
    let visible = services
        .events
        .create_event(
            organiser_id,
            free_event_request("Visible Event", 10, vec![question("Any notes?", false, 1)]),
        )
        .await
        .expect("create event");
    services
        .events
        .update_event_status(visible.event.id, EventStatus::Published, &ctx)
        .await
        .expect("publish");

    let page = Default::default();
    let listing = services
        .events
        .get_all_events(EventFilters::default(), page, None)
        .await
        .expect("anonymous list");
    assert_eq!(listing.events.len(), 1);
    assert_eq!(listing.events[0].name, "Visible Event");
    assert_eq!(listing.pagination.total, 1);

    // Non-admin callers cannot widen the status filter
    let widened = EventFilters {
        include_all_statuses: true,
        ..Default::default()
    };
    let listing = services
        .events
        .get_all_events(widened.clone(), page, Some(&participant_ctx(organiser_id)))
        .await
        .expect("participant list");
    assert_eq!(listing.events.len(), 1);

    let listing = services
        .events
        .get_all_events(widened, page, Some(&admin_ctx(admin_id)))
        .await
        .expect("admin list");
    assert_eq!(listing.events.len(), 2);

    // Organisers asking for their own events see every status
    let own = EventFilters {
        organiser_id: Some(organiser_id),
        ..Default::default()
    };
    let listing = services
        .events
        .get_all_events(own, page, Some(&organizer_ctx(organiser_id)))
        .await
        .expect("own events");
    assert_eq!(listing.events.len(), 2);
}

#[tokio::test]
#[serial]
async fn only_the_owner_or_an_admin_can_modify_an_event() {
    let db = TestDatabase::new().await.expect("test database");
    db.truncate().await.expect("truncate");
    let services = db.services();

    let owner_id = seed_user(&db.pool, "owner@example.com", UserRole::Organizer)
        .await
        .expect("seed owner");
    let other_id = seed_user(&db.pool, "other@example.com", UserRole::Organizer)
        .await
        .expect("seed other");
    let admin_id = seed_user(&db.pool, "admin@example.com", UserRole::Admin)
        .await
        .expect("seed admin");

    let event = services
        .events
        .create_event(
            owner_id,
            free_event_request("Owned Event", 10, vec![question("Any notes?", false, 1)]),
        )
        .await
        .expect("create event");

    let err = services
        .events
        .update_event_status(event.event.id, EventStatus::Published, &organizer_ctx(other_id))
        .await
        .expect_err("foreign organiser should be rejected");
    assert!(matches!(err, EventlyError::Authorization(_)));

    services
        .events
        .update_event_status(event.event.id, EventStatus::Published, &admin_ctx(admin_id))
        .await
        .expect("admin override");
}
