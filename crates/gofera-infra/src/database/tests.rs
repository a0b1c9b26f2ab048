use chrono::{TimeZone, Utc};
use sea_orm::{DatabaseBackend, MockDatabase};
use serde_json::json;
use uuid::Uuid;

use gofera_core::domain::{Rating, RideStatus, RuleViolation, UserRole};
use gofera_core::error::RepoError;
use gofera_core::ports::{RatingRepository, RideRepository, RideSearch, UserRepository};

use crate::database::entity::{rating, ride, ride_booking, user};
use crate::database::{PostgresRatingRepository, PostgresRideRepository, PostgresUserRepository};

fn user_model(id: Uuid) -> user::Model {
    let now = Utc::now();
    user::Model {
        id,
        name: "Selam".to_owned(),
        email: "selam@example.com".to_owned(),
        password_hash: "$argon2id$stub".to_owned(),
        phone: "+251911223344".to_owned(),
        is_driver: true,
        vehicle: Some(json!({"make": "Toyota", "model": "Vitz", "licensePlate": "AA-3-12345"})),
        role: "admin".to_owned(),
        rating: 4.0,
        total_rides: 2,
        active: true,
        push_subscription: None,
        password_reset_token: None,
        password_reset_expires: None,
        password_changed_at: None,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

fn ride_model(id: Uuid, driver_id: Uuid, seats: i32) -> ride::Model {
    let now = Utc::now();
    ride::Model {
        id,
        driver_id,
        start_location: "Addis Ababa".to_owned(),
        destination: "Bahir Dar".to_owned(),
        date: Utc.with_ymd_and_hms(2026, 12, 1, 0, 0, 0).unwrap().into(),
        time: "06:30".to_owned(),
        eta_hours: 9.0,
        available_seats: seats,
        price: 850.0,
        description: None,
        status: "active".to_owned(),
        vehicle: None,
        pickup_points: json!([{"location": "Megenagna", "time": "06:15"}]),
        restrictions: json!({"smoking": false, "pets": true, "luggage": true}),
        active: true,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

fn booking_model(ride_id: Uuid, user_id: Uuid, seats: i32) -> ride_booking::Model {
    ride_booking::Model {
        id: Uuid::new_v4(),
        ride_id,
        user_id,
        seats,
        booked_at: Utc::now().into(),
    }
}

#[tokio::test]
async fn test_find_user_maps_json_and_role() {
    let id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_model(id)]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let user = repo.find_by_id(id).await.unwrap().unwrap();

    assert_eq!(user.id, id);
    assert_eq!(user.role, UserRole::Admin);
    assert_eq!(user.total_rides, 2);
    let vehicle = user.vehicle.unwrap();
    assert_eq!(vehicle.make.as_deref(), Some("Toyota"));
    assert_eq!(vehicle.license_plate.as_deref(), Some("AA-3-12345"));
}

#[tokio::test]
async fn test_find_ride_attaches_bookings() {
    let ride_id = Uuid::new_v4();
    let passenger = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![ride_model(ride_id, Uuid::new_v4(), 4)]])
        .append_query_results([vec![booking_model(ride_id, passenger, 3)]])
        .into_connection();

    let repo = PostgresRideRepository::new(db);
    let ride = repo.find_by_id(ride_id).await.unwrap().unwrap();

    assert_eq!(ride.passengers.len(), 1);
    assert_eq!(ride.booking_for(passenger).map(|b| b.seats), Some(3));
    assert_eq!(ride.remaining_seats(), 1);
    assert_eq!(ride.total_revenue(), 3.0 * 850.0);
    assert!(ride.restrictions.pets);
    assert_eq!(ride.pickup_points[0].location, "Megenagna");
}

#[tokio::test]
async fn test_search_min_seats_counts_bookings() {
    let driver = Uuid::new_v4();
    let crowded = Uuid::new_v4();
    let roomy = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![
            ride_model(crowded, driver, 3),
            ride_model(roomy, driver, 3),
        ]])
        .append_query_results([vec![booking_model(crowded, Uuid::new_v4(), 2)]])
        .into_connection();

    let repo = PostgresRideRepository::new(db);
    let filter = RideSearch {
        min_seats: Some(2),
        ..Default::default()
    };
    let rides = repo.search(&filter).await.unwrap();

    assert_eq!(rides.len(), 1);
    assert_eq!(rides[0].id, roomy);
}

#[tokio::test]
async fn test_book_inside_transaction() {
    let ride_id = Uuid::new_v4();
    let driver = Uuid::new_v4();
    let passenger = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![ride_model(ride_id, driver, 3)]])
        .append_query_results([Vec::<ride_booking::Model>::new()])
        .append_query_results([vec![booking_model(ride_id, passenger, 2)]])
        .append_query_results([vec![ride_model(ride_id, driver, 3)]])
        .into_connection();

    let repo = PostgresRideRepository::new(db);
    let ride = repo.book(ride_id, passenger, 2, Utc::now()).await.unwrap();

    assert_eq!(ride.booked_seats(), 2);
    assert_eq!(ride.remaining_seats(), 1);
}

#[tokio::test]
async fn test_book_rejected_on_locked_state() {
    let ride_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![ride_model(ride_id, Uuid::new_v4(), 1)]])
        .append_query_results([vec![booking_model(ride_id, Uuid::new_v4(), 1)]])
        .into_connection();

    let repo = PostgresRideRepository::new(db);
    let err = repo
        .book(ride_id, Uuid::new_v4(), 1, Utc::now())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::Rejected(RuleViolation::NotEnoughSeats {
            requested: 1,
            remaining: 0
        })
    ));
}

#[tokio::test]
async fn test_transition_missing_ride() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<ride::Model>::new()])
        .into_connection();

    let repo = PostgresRideRepository::new(db);
    let err = repo
        .transition(Uuid::new_v4(), RideStatus::Completed)
        .await
        .unwrap_err();

    assert!(matches!(err, RepoError::NotFound));
}

#[tokio::test]
async fn test_record_rating_folds_score() {
    let ratee_id = Uuid::new_v4();
    let stored = Rating::new(Uuid::new_v4(), ratee_id, Uuid::new_v4(), 5);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![rating::Model {
            id: stored.id,
            rater_id: stored.rater_id,
            ratee_id,
            ride_id: stored.ride_id,
            score: 5,
            created_at: stored.created_at.into(),
        }]])
        .append_query_results([vec![user_model(ratee_id)]])
        .append_query_results([vec![user_model(ratee_id)]])
        .into_connection();

    let repo = PostgresRatingRepository::new(db);
    let ratee = repo.record(stored).await.unwrap();

    // (4.0 * 2 + 5) / 3
    assert!((ratee.rating - 13.0 / 3.0).abs() < 1e-9);
    assert_eq!(ratee.total_rides, 3);
}
