//! Ride entity and the booking engine.
//!
//! Seat counts only change through [`Ride::book`] and [`Ride::cancel_booking`].
//! Remaining seats, revenue and fullness are always derived from the booking
//! list, never stored.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::user::VehicleInfo;
use crate::error::DomainError;

pub const MIN_SEATS: u32 = 1;
pub const MAX_SEATS: u32 = 8;
pub const MIN_ETA_HOURS: f64 = 0.5;
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Lifecycle status of a ride. Only `Active` accepts bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    Active,
    Completed,
    Cancelled,
}

impl RideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Active => "active",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RideStatus::Active)
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RideStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RideStatus::Active),
            "completed" => Ok(RideStatus::Completed),
            "cancelled" => Ok(RideStatus::Cancelled),
            other => Err(DomainError::Validation(format!("Unknown ride status: {other}"))),
        }
    }
}

/// A passenger's reservation on a ride.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub user_id: Uuid,
    pub seats: u32,
    pub booked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupPoint {
    pub location: String,
    pub time: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restrictions {
    pub smoking: bool,
    pub pets: bool,
    pub luggage: bool,
}

impl Default for Restrictions {
    fn default() -> Self {
        Self {
            smoking: false,
            pets: false,
            luggage: true,
        }
    }
}

/// Business rules a ride mutation can break. Messages are safe to show clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("Ride is not active")]
    NotActive,

    #[error("You cannot book your own ride")]
    OwnRide,

    #[error("Must book at least 1 seat")]
    InvalidSeatCount,

    #[error("Not enough seats available: requested {requested}, remaining {remaining}")]
    NotEnoughSeats { requested: u32, remaining: u32 },

    #[error("You have already booked this ride")]
    AlreadyBooked,

    #[error("No booking found for this user")]
    NoBooking,

    #[error("Cannot modify a ride with existing passengers")]
    HasPassengers,
}

/// Ride entity - one driver-offered journey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ride {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub start_location: String,
    pub destination: String,
    pub date: DateTime<Utc>,
    pub time: String,
    pub eta_hours: f64,
    pub available_seats: u32,
    pub price: f64,
    pub description: Option<String>,
    pub status: RideStatus,
    pub passengers: Vec<Booking>,
    pub vehicle: Option<VehicleInfo>,
    pub pickup_points: Vec<PickupPoint>,
    pub restrictions: Restrictions,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a driver supplies when posting a ride.
#[derive(Debug, Clone)]
pub struct NewRide {
    pub start_location: String,
    pub destination: String,
    pub date: DateTime<Utc>,
    pub time: String,
    pub eta_hours: f64,
    pub available_seats: u32,
    pub price: f64,
    pub description: Option<String>,
    pub vehicle: Option<VehicleInfo>,
    pub pickup_points: Vec<PickupPoint>,
    pub restrictions: Option<Restrictions>,
}

/// Editable core fields. Status, driver and passengers are not editable here.
#[derive(Debug, Clone, Default)]
pub struct RideChanges {
    pub start_location: Option<String>,
    pub destination: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub time: Option<String>,
    pub eta_hours: Option<f64>,
    pub available_seats: Option<u32>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub vehicle: Option<VehicleInfo>,
    pub pickup_points: Option<Vec<PickupPoint>>,
    pub restrictions: Option<Restrictions>,
}

impl Ride {
    /// Create a new active ride owned by `driver_id`.
    pub fn new(driver_id: Uuid, input: NewRide) -> Result<Self, DomainError> {
        let now = Utc::now();
        let mut ride = Self {
            id: Uuid::new_v4(),
            driver_id,
            start_location: input.start_location.trim().to_string(),
            destination: input.destination.trim().to_string(),
            date: input.date,
            time: input.time,
            eta_hours: input.eta_hours,
            available_seats: input.available_seats,
            price: input.price,
            description: input.description.map(|d| d.trim().to_string()),
            status: RideStatus::Active,
            passengers: Vec::new(),
            vehicle: input.vehicle,
            pickup_points: input.pickup_points,
            restrictions: input.restrictions.unwrap_or_default(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        ride.time = normalize_time(&ride.time)?;
        ride.validate()?;
        Ok(ride)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.start_location.is_empty() {
            return Err(DomainError::Validation(
                "Please provide starting location".into(),
            ));
        }
        if self.destination.is_empty() {
            return Err(DomainError::Validation("Please provide destination".into()));
        }
        if !self.eta_hours.is_finite() || self.eta_hours < MIN_ETA_HOURS {
            return Err(DomainError::Validation(
                "ETA must be at least 0.5 hours".into(),
            ));
        }
        if !(MIN_SEATS..=MAX_SEATS).contains(&self.available_seats) {
            return Err(DomainError::Validation(
                "Available seats must be between 1 and 8".into(),
            ));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(DomainError::Validation("Price cannot be negative".into()));
        }
        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(DomainError::Validation(
                    "Description cannot exceed 500 characters".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn booked_seats(&self) -> u32 {
        self.passengers.iter().map(|p| p.seats).sum()
    }

    /// Offered minus booked. Signed so a corrupt record shows up as negative
    /// rather than wrapping.
    pub fn remaining_seats(&self) -> i64 {
        i64::from(self.available_seats) - i64::from(self.booked_seats())
    }

    pub fn total_revenue(&self) -> f64 {
        f64::from(self.booked_seats()) * self.price
    }

    pub fn is_full(&self) -> bool {
        self.remaining_seats() <= 0
    }

    pub fn has_passengers(&self) -> bool {
        !self.passengers.is_empty()
    }

    pub fn is_driver(&self, user_id: Uuid) -> bool {
        self.driver_id == user_id
    }

    pub fn booking_for(&self, user_id: Uuid) -> Option<&Booking> {
        self.passengers.iter().find(|p| p.user_id == user_id)
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.is_driver(user_id) || self.booking_for(user_id).is_some()
    }

    /// Eligibility predicate for a booking of `seats` by `user_id`.
    pub fn check_booking(&self, user_id: Uuid, seats: u32) -> Result<(), RuleViolation> {
        if self.status != RideStatus::Active {
            return Err(RuleViolation::NotActive);
        }
        if self.is_driver(user_id) {
            return Err(RuleViolation::OwnRide);
        }
        if seats < MIN_SEATS {
            return Err(RuleViolation::InvalidSeatCount);
        }
        if self.booking_for(user_id).is_some() {
            return Err(RuleViolation::AlreadyBooked);
        }
        let remaining = self.remaining_seats().max(0);
        if i64::from(seats) > remaining {
            return Err(RuleViolation::NotEnoughSeats {
                requested: seats,
                remaining: remaining as u32,
            });
        }
        Ok(())
    }

    pub fn can_book(&self, user_id: Uuid, seats: u32) -> bool {
        self.check_booking(user_id, seats).is_ok()
    }

    /// Re-check eligibility and append the booking.
    pub fn book(
        &mut self,
        user_id: Uuid,
        seats: u32,
        booked_at: DateTime<Utc>,
    ) -> Result<&Booking, RuleViolation> {
        self.check_booking(user_id, seats)?;
        self.passengers.push(Booking {
            user_id,
            seats,
            booked_at,
        });
        self.updated_at = booked_at;
        Ok(&self.passengers[self.passengers.len() - 1])
    }

    /// Remove the caller's booking.
    pub fn cancel_booking(&mut self, user_id: Uuid) -> Result<Booking, RuleViolation> {
        if self.status != RideStatus::Active {
            return Err(RuleViolation::NotActive);
        }
        let index = self
            .passengers
            .iter()
            .position(|p| p.user_id == user_id)
            .ok_or(RuleViolation::NoBooking)?;
        self.updated_at = Utc::now();
        Ok(self.passengers.remove(index))
    }

    /// Guard for edits and soft deletes of core fields.
    pub fn check_editable(&self) -> Result<(), RuleViolation> {
        if self.has_passengers() {
            return Err(RuleViolation::HasPassengers);
        }
        if self.status != RideStatus::Active {
            return Err(RuleViolation::NotActive);
        }
        Ok(())
    }

    /// Apply driver edits. Rule violations are reported before field
    /// validation so a booked ride is always rejected the same way. On error
    /// the ride is left untouched.
    pub fn apply_changes(&mut self, changes: RideChanges) -> Result<(), DomainError> {
        self.check_editable()?;

        let mut next = self.clone();
        if let Some(v) = changes.start_location {
            next.start_location = v.trim().to_string();
        }
        if let Some(v) = changes.destination {
            next.destination = v.trim().to_string();
        }
        if let Some(v) = changes.date {
            next.date = v;
        }
        if let Some(v) = changes.time {
            next.time = normalize_time(&v)?;
        }
        if let Some(v) = changes.eta_hours {
            next.eta_hours = v;
        }
        if let Some(v) = changes.available_seats {
            next.available_seats = v;
        }
        if let Some(v) = changes.price {
            next.price = v;
        }
        if let Some(v) = changes.description {
            next.description = Some(v.trim().to_string());
        }
        if let Some(v) = changes.vehicle {
            next.vehicle = Some(v);
        }
        if let Some(v) = changes.pickup_points {
            next.pickup_points = v;
        }
        if let Some(v) = changes.restrictions {
            next.restrictions = v;
        }

        next.validate()?;
        next.updated_at = Utc::now();
        *self = next;
        Ok(())
    }

    /// Move an active ride to a terminal status.
    pub fn transition(&mut self, to: RideStatus) -> Result<(), RuleViolation> {
        if self.status != RideStatus::Active || to == RideStatus::Active {
            return Err(RuleViolation::NotActive);
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn soft_delete(&mut self) -> Result<(), RuleViolation> {
        self.check_editable()?;
        self.active = false;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Parse `H:MM`/`HH:MM` and return the zero-padded form so lexical order
/// matches chronological order.
pub fn normalize_time(raw: &str) -> Result<String, DomainError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| DomainError::Validation("Please provide departure time as HH:MM".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn new_ride(seats: u32, price: f64) -> NewRide {
        NewRide {
            start_location: "Addis Ababa".into(),
            destination: "Adama".into(),
            date: Utc::now(),
            time: "8:30".into(),
            eta_hours: 1.5,
            available_seats: seats,
            price,
            description: None,
            vehicle: None,
            pickup_points: Vec::new(),
            restrictions: None,
        }
    }

    fn ride(seats: u32, price: f64) -> (Uuid, Ride) {
        let driver = Uuid::new_v4();
        (driver, Ride::new(driver, new_ride(seats, price)).unwrap())
    }

    #[test]
    fn test_new_ride_defaults() {
        let (_, ride) = ride(3, 100.0);
        assert_eq!(ride.status, RideStatus::Active);
        assert_eq!(ride.time, "08:30");
        assert!(ride.restrictions.luggage);
        assert!(!ride.restrictions.smoking);
        assert_eq!(ride.remaining_seats(), 3);
        assert!(!ride.is_full());
    }

    #[test]
    fn test_new_ride_validation() {
        let driver = Uuid::new_v4();
        assert!(Ride::new(driver, new_ride(0, 10.0)).is_err());
        assert!(Ride::new(driver, new_ride(9, 10.0)).is_err());
        assert!(Ride::new(driver, new_ride(2, -1.0)).is_err());

        let mut input = new_ride(2, 10.0);
        input.eta_hours = 0.25;
        assert!(Ride::new(driver, input).is_err());

        let mut input = new_ride(2, 10.0);
        input.time = "25:00".into();
        assert!(Ride::new(driver, input).is_err());

        let mut input = new_ride(2, 10.0);
        input.description = Some("x".repeat(501));
        assert!(Ride::new(driver, input).is_err());
    }

    #[test]
    fn test_three_seat_scenario() {
        let (_, mut ride) = ride(3, 150.0);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        ride.book(a, 2, Utc::now()).unwrap();
        assert_eq!(ride.remaining_seats(), 1);
        assert_eq!(ride.total_revenue(), 300.0);

        assert_eq!(
            ride.book(b, 2, Utc::now()).unwrap_err(),
            RuleViolation::NotEnoughSeats {
                requested: 2,
                remaining: 1
            }
        );

        ride.book(b, 1, Utc::now()).unwrap();
        assert_eq!(ride.remaining_seats(), 0);
        assert!(ride.is_full());
    }

    #[test]
    fn test_driver_cannot_book_own_ride() {
        let (driver, mut ride) = ride(3, 10.0);
        assert_eq!(
            ride.book(driver, 1, Utc::now()).unwrap_err(),
            RuleViolation::OwnRide
        );
        assert!(ride.passengers.is_empty());
    }

    #[test]
    fn test_no_double_booking() {
        let (_, mut ride) = ride(4, 10.0);
        let user = Uuid::new_v4();
        ride.book(user, 1, Utc::now()).unwrap();
        assert_eq!(
            ride.book(user, 1, Utc::now()).unwrap_err(),
            RuleViolation::AlreadyBooked
        );
        assert_eq!(ride.passengers.len(), 1);
    }

    #[test]
    fn test_zero_seats_rejected() {
        let (_, ride) = ride(4, 10.0);
        assert_eq!(
            ride.check_booking(Uuid::new_v4(), 0).unwrap_err(),
            RuleViolation::InvalidSeatCount
        );
    }

    #[test]
    fn test_book_then_cancel_restores_remaining() {
        let (_, mut ride) = ride(4, 10.0);
        let user = Uuid::new_v4();
        let before = ride.remaining_seats();
        ride.book(user, 3, Utc::now()).unwrap();
        ride.cancel_booking(user).unwrap();
        assert_eq!(ride.remaining_seats(), before);
        assert_eq!(
            ride.cancel_booking(user).unwrap_err(),
            RuleViolation::NoBooking
        );
    }

    #[test]
    fn test_terminal_rides_reject_bookings() {
        let (_, mut ride) = ride(4, 10.0);
        ride.transition(RideStatus::Completed).unwrap();
        assert_eq!(
            ride.book(Uuid::new_v4(), 1, Utc::now()).unwrap_err(),
            RuleViolation::NotActive
        );
        assert_eq!(
            ride.transition(RideStatus::Cancelled).unwrap_err(),
            RuleViolation::NotActive
        );
        assert_eq!(ride.status, RideStatus::Completed);
    }

    #[test]
    fn test_cannot_transition_back_to_active() {
        let (_, mut ride) = ride(4, 10.0);
        assert!(ride.transition(RideStatus::Active).is_err());
    }

    #[test]
    fn test_edits_rejected_once_booked() {
        let (_, mut ride) = ride(4, 10.0);
        ride.book(Uuid::new_v4(), 1, Utc::now()).unwrap();

        let changes = RideChanges {
            price: Some(5.0),
            ..Default::default()
        };
        assert!(matches!(
            ride.apply_changes(changes),
            Err(DomainError::BusinessRule(_))
        ));
        assert_eq!(ride.price, 10.0);
        assert_eq!(ride.soft_delete().unwrap_err(), RuleViolation::HasPassengers);
    }

    #[test]
    fn test_apply_changes_revalidates() {
        let (_, mut ride) = ride(4, 10.0);
        let changes = RideChanges {
            available_seats: Some(12),
            ..Default::default()
        };
        assert!(matches!(
            ride.apply_changes(changes),
            Err(DomainError::Validation(_))
        ));

        let changes = RideChanges {
            destination: Some(" Hawassa ".into()),
            time: Some("9:05".into()),
            ..Default::default()
        };
        ride.apply_changes(changes).unwrap();
        assert_eq!(ride.destination, "Hawassa");
        assert_eq!(ride.time, "09:05");
    }

    #[test]
    fn test_random_book_cancel_sequences_never_overbook() {
        let mut rng = StdRng::seed_from_u64(0x60fe_4a);
        let users: Vec<Uuid> = (0..6).map(|_| Uuid::new_v4()).collect();

        for _ in 0..200 {
            let seats = rng.gen_range(MIN_SEATS..=MAX_SEATS);
            let (driver, mut ride) = ride(seats, 20.0);

            for _ in 0..50 {
                let actor = if rng.gen_bool(0.1) {
                    driver
                } else {
                    users[rng.gen_range(0..users.len())]
                };

                if rng.gen_bool(0.6) {
                    let requested = rng.gen_range(0..=4);
                    let before = ride.passengers.len();
                    match ride.book(actor, requested, Utc::now()) {
                        Ok(_) => assert_eq!(ride.passengers.len(), before + 1),
                        Err(_) => assert_eq!(ride.passengers.len(), before),
                    }
                } else {
                    let _ = ride.cancel_booking(actor);
                }

                assert!(ride.booked_seats() <= ride.available_seats);
                assert!(ride.remaining_seats() >= 0);
                assert!(ride.booking_for(driver).is_none());

                let mut ids: Vec<Uuid> = ride.passengers.iter().map(|p| p.user_id).collect();
                ids.sort();
                ids.dedup();
                assert_eq!(ids.len(), ride.passengers.len());
            }
        }
    }
}
