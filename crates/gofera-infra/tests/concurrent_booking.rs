//! Racing bookings against the in-memory store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use gofera_core::domain::{NewRide, Ride, RuleViolation};
use gofera_core::error::RepoError;
use gofera_core::ports::RideRepository;
use gofera_infra::InMemoryStore;

fn ride(driver_id: Uuid, seats: u32) -> Ride {
    Ride::new(
        driver_id,
        NewRide {
            start_location: "Mekelle".into(),
            destination: "Adigrat".into(),
            date: Utc::now() + Duration::days(3),
            time: "09:00".into(),
            eta_hours: 2.0,
            available_seats: seats,
            price: 120.0,
            description: Some("Morning trip".into()),
            vehicle: None,
            pickup_points: Vec::new(),
            restrictions: None,
        },
    )
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_last_seat_goes_to_exactly_one_caller() {
    let store = Arc::new(InMemoryStore::new());
    let created = store.create(ride(Uuid::new_v4(), 1)).await.unwrap();

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let store = Arc::clone(&store);
            let ride_id = created.id;
            tokio::spawn(async move { store.book(ride_id, Uuid::new_v4(), 1, Utc::now()).await })
        })
        .collect();

    let mut won = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => won += 1,
            Err(RepoError::Rejected(RuleViolation::NotEnoughSeats { .. })) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(won, 1);
    let stored = store.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(stored.booked_seats(), 1);
    assert!(stored.is_full());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_same_user_cannot_double_book_concurrently() {
    let store = Arc::new(InMemoryStore::new());
    let created = store.create(ride(Uuid::new_v4(), 8)).await.unwrap();
    let passenger = Uuid::new_v4();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let store = Arc::clone(&store);
            let ride_id = created.id;
            tokio::spawn(async move { store.book(ride_id, passenger, 1, Utc::now()).await })
        })
        .collect();

    let mut won = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            won += 1;
        }
    }

    assert_eq!(won, 1);
    let stored = store.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(stored.passengers.len(), 1);
    assert_eq!(stored.remaining_seats(), 7);
}
