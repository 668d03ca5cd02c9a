//! End-to-end booking engine tests
//!
//! Drives the full stack (manager + ledger + redb storage on a real file)
//! through the lifecycle, the shared-calendar races, and the hold expiry
//! path.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Arc;

use consult_server::booking::{BookingError, BookingManager, BookingStorage};
use consult_server::services::{CatalogService, MeetLinkProvisioner};
use shared::booking::{BookingStatus, CancelActor, CreateBookingRequest, SlotStatus};
use shared::models::{Consultant, ConsultantStats, Service, WeeklyTemplate};

fn consultant() -> Consultant {
    Consultant {
        id: "c001".to_string(),
        name: "Sunnie".to_string(),
        title: "Data Science Advisor".to_string(),
        avatar: None,
        specialties: vec!["career planning".to_string()],
        bio: None,
        experience: vec![],
        stats: ConsultantStats::default(),
        services: vec![
            Service {
                id: "s001".to_string(),
                duration_min: 30,
                price: Decimal::from(800),
                description: "quick consultation".to_string(),
            },
            Service {
                id: "s002".to_string(),
                duration_min: 60,
                price: Decimal::from(1500),
                description: "deep dive".to_string(),
            },
        ],
        meeting_platform: Some("Google Meet".to_string()),
        weekly_template: WeeklyTemplate::default(),
        is_available: true,
    }
}

struct TestEngine {
    manager: Arc<BookingManager>,
    catalog: Arc<CatalogService>,
    // Keeps the database file alive for the test's duration
    _dir: tempfile::TempDir,
}

fn engine() -> TestEngine {
    let dir = tempfile::tempdir().unwrap();
    let storage = BookingStorage::open(dir.path().join("consult.redb")).unwrap();
    let catalog = Arc::new(CatalogService::new());
    catalog.upsert(consultant());
    let manager = Arc::new(BookingManager::new(
        storage,
        catalog.clone(),
        Arc::new(MeetLinkProvisioner::default()),
        300,
    ));
    TestEngine {
        manager,
        catalog,
        _dir: dir,
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 3, 8, 0, 0).unwrap()
}

/// Thursday 2025-02-06 10:00 UTC
fn thursday_ten() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 6, 10, 0, 0).unwrap()
}

fn request(requester: &str, slot_start: DateTime<Utc>) -> CreateBookingRequest {
    CreateBookingRequest {
        consultant_id: "c001".to_string(),
        service_id: "s002".to_string(),
        slot_start,
        topic: "career advice".to_string(),
        description: None,
        attachment_url: None,
        requester_id: requester.to_string(),
    }
}

#[tokio::test]
async fn test_full_lifecycle() {
    let engine = engine();
    let manager = &engine.manager;

    // Create: price/duration frozen, pending payment
    let booking = manager
        .create_booking(&request("u001", thursday_ten()), now())
        .unwrap();
    assert_eq!(booking.status, BookingStatus::PendingPayment);
    assert_eq!(booking.price, Decimal::from(1500));

    // Pay: confirmed with a non-empty meeting link
    let confirmed = manager
        .confirm_payment(&booking.id, "pay-001", now())
        .await
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert!(!confirmed.meeting_link.as_deref().unwrap_or("").is_empty());

    // Complete: only after the session end has passed
    let err = manager.complete(&booking.id, thursday_ten()).unwrap_err();
    assert!(matches!(err, BookingError::TooEarly));
    let done = manager
        .complete(&booking.id, thursday_ten() + Duration::minutes(61))
        .unwrap();
    assert_eq!(done.status, BookingStatus::Completed);

    // Rate: once and only once
    let rated = manager
        .rate(&booking.id, 5, Some("great session".to_string()))
        .unwrap();
    assert_eq!(rated.rating, Some(5));
    let err = manager.rate(&booking.id, 3, None).unwrap_err();
    assert!(matches!(err, BookingError::AlreadyRated));
    assert_eq!(manager.get_booking(&booking.id).unwrap().rating, Some(5));
}

#[test]
fn test_no_double_booking_under_concurrency() {
    let engine = engine();

    let mut handles = Vec::new();
    for i in 0..10 {
        let manager = engine.manager.clone();
        handles.push(std::thread::spawn(move || {
            // Fixture jitter only; the engine itself is deterministic
            let jitter = rand::thread_rng().gen_range(0..500u64);
            std::thread::sleep(std::time::Duration::from_micros(jitter));
            manager.create_booking(&request(&format!("u{:03}", i), thursday_ten()), now())
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one concurrent booking may win the slot");
    assert!(
        results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(BookingError::SlotUnavailable)))
    );

    // The stored calendar agrees
    let stored = engine
        .manager
        .bookings_for_consultant("c001", Some(BookingStatus::PendingPayment))
        .unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_cancel_after_confirm_frees_the_slot() {
    let engine = engine();
    let manager = &engine.manager;
    let thursday = thursday_ten().date_naive();

    let booking = manager
        .create_booking(&request("u001", thursday_ten()), now())
        .unwrap();
    manager
        .confirm_payment(&booking.id, "pay-001", now())
        .await
        .unwrap();

    let availability = manager
        .availability("c001", thursday, thursday, now())
        .unwrap();
    let ten = availability
        .slots
        .iter()
        .find(|s| s.id == "slot-2025-02-06-1000")
        .unwrap();
    assert_eq!(ten.status, SlotStatus::Booked);

    manager
        .cancel(&booking.id, CancelActor::Requester, now())
        .unwrap();

    let availability = manager
        .availability("c001", thursday, thursday, now())
        .unwrap();
    let ten = availability
        .slots
        .iter()
        .find(|s| s.id == "slot-2025-02-06-1000")
        .unwrap();
    assert_eq!(ten.status, SlotStatus::Free);
}

#[test]
fn test_idempotent_cancel_keeps_first_timestamp() {
    let engine = engine();
    let manager = &engine.manager;

    let booking = manager
        .create_booking(&request("u001", thursday_ten()), now())
        .unwrap();

    let first = manager
        .cancel(&booking.id, CancelActor::Requester, now())
        .unwrap();
    let second = manager
        .cancel(&booking.id, CancelActor::Requester, now() + Duration::hours(3))
        .unwrap();

    assert_eq!(first.status, BookingStatus::Cancelled);
    assert_eq!(second.status, BookingStatus::Cancelled);
    assert_eq!(first.cancelled_at, second.cancelled_at);
}

#[test]
fn test_abandoned_hold_expires_and_slot_recovers() {
    let engine = engine();
    let manager = &engine.manager;

    // A reservation is made but never committed (checkout abandoned)
    manager
        .ledger()
        .try_reserve("c001", thursday_ten(), 60, "u001", now())
        .unwrap();

    let err = manager
        .create_booking(&request("u002", thursday_ten()), now())
        .unwrap_err();
    assert!(matches!(err, BookingError::SlotUnavailable));

    // At T+6 minutes the 5-minute hold is dead; the sweep reclaims it and
    // the same slot is obtainable again
    let later = now() + Duration::minutes(6);
    assert_eq!(manager.sweep_expired_holds(later).unwrap(), 1);
    let booking = manager
        .create_booking(&request("u002", thursday_ten()), later)
        .unwrap();
    assert_eq!(booking.requester_id, "u002");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_confirm_and_reject_race_has_one_winner() {
    let engine = engine();
    let manager = engine.manager.clone();

    let booking = manager
        .create_booking(&request("u001", thursday_ten()), now())
        .unwrap();

    let confirm = {
        let manager = manager.clone();
        let id = booking.id.clone();
        tokio::spawn(async move { manager.confirm_payment(&id, "pay-001", now()).await })
    };
    let reject = {
        let manager = manager.clone();
        let id = booking.id.clone();
        tokio::task::spawn_blocking(move || {
            manager.reject(&id, Some("schedule conflict".to_string()), now())
        })
    };

    let confirm_result = confirm.await.unwrap();
    let reject_result = reject.await.unwrap();

    // Whichever transition commits first wins; the loser sees a typed
    // invalid-transition error, never a silent overwrite
    assert_eq!(
        confirm_result.is_ok() as u8 + reject_result.is_ok() as u8,
        1,
        "exactly one of confirm/reject may win"
    );

    let stored = manager.get_booking(&booking.id).unwrap();
    if confirm_result.is_ok() {
        assert_eq!(stored.status, BookingStatus::Confirmed);
        assert!(matches!(
            reject_result,
            Err(BookingError::InvalidTransition { .. })
        ));
    } else {
        assert_eq!(stored.status, BookingStatus::Rejected);
        assert!(matches!(
            confirm_result,
            Err(BookingError::InvalidTransition { .. })
        ));
    }
}

#[test]
fn test_price_change_never_rewrites_existing_bookings() {
    let engine = engine();
    let manager = &engine.manager;

    let booking = manager
        .create_booking(&request("u001", thursday_ten()), now())
        .unwrap();
    assert_eq!(booking.price, Decimal::from(1500));

    let mut updated = consultant();
    updated.services[1].price = Decimal::from(2000);
    updated.services[1].duration_min = 90;
    engine.catalog.upsert(updated);

    let stored = manager.get_booking(&booking.id).unwrap();
    assert_eq!(stored.price, Decimal::from(1500));
    assert_eq!(stored.duration_min, 60);

    // New bookings pick up the new terms
    let other_slot = thursday_ten() + Duration::hours(4);
    let fresh = manager
        .create_booking(&request("u002", other_slot), now())
        .unwrap();
    assert_eq!(fresh.price, Decimal::from(2000));
}

#[test]
fn test_bookings_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("consult.redb");
    let booking_id;

    {
        let storage = BookingStorage::open(&db_path).unwrap();
        let catalog = Arc::new(CatalogService::new());
        catalog.upsert(consultant());
        let manager = BookingManager::new(
            storage,
            catalog,
            Arc::new(MeetLinkProvisioner::default()),
            300,
        );
        booking_id = manager
            .create_booking(&request("u001", thursday_ten()), now())
            .unwrap()
            .id;
    }

    // A fresh process sees the same durable record
    let storage = BookingStorage::open(&db_path).unwrap();
    let catalog = Arc::new(CatalogService::new());
    catalog.upsert(consultant());
    let manager = BookingManager::new(
        storage,
        catalog,
        Arc::new(MeetLinkProvisioner::default()),
        300,
    );

    let stored = manager.get_booking(&booking_id).unwrap();
    assert_eq!(stored.status, BookingStatus::PendingPayment);
    assert_eq!(stored.price, Decimal::from(1500));

    // And the slot is still occupied
    let err = manager
        .create_booking(&request("u002", thursday_ten()), now())
        .unwrap_err();
    assert!(matches!(err, BookingError::SlotUnavailable));
}
