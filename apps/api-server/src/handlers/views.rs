//! Conversions between domain entities and wire DTOs.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use gofera_core::domain::{PickupPoint, Restrictions, Ride, User, VehicleInfo};
use gofera_shared::dto::{
    ContactSummary, DriverSummary, PassengerResponse, PickupPointDto, PublicUserResponse,
    RatedUser, RestrictionsDto, RideDriver, RideResponse, UserResponse, UserSearchResult,
    VehicleInfoDto,
};

use crate::middleware::error::AppError;

pub fn vehicle_dto(v: &VehicleInfo) -> VehicleInfoDto {
    VehicleInfoDto {
        make: v.make.clone(),
        model: v.model.clone(),
        year: v.year,
        color: v.color.clone(),
        license_plate: v.license_plate.clone(),
    }
}

pub fn vehicle_from_dto(dto: VehicleInfoDto) -> VehicleInfo {
    VehicleInfo {
        make: dto.make,
        model: dto.model,
        year: dto.year,
        color: dto.color,
        license_plate: dto.license_plate,
    }
}

pub fn pickup_from_dto(dto: PickupPointDto) -> PickupPoint {
    PickupPoint {
        location: dto.location,
        time: dto.time,
    }
}

pub fn restrictions_from_dto(dto: RestrictionsDto) -> Restrictions {
    Restrictions {
        smoking: dto.smoking,
        pets: dto.pets,
        luggage: dto.luggage,
    }
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 instant.
pub fn parse_ride_date(raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| AppError::BadRequest("Please provide a valid date (YYYY-MM-DD)".to_string()))
}

pub fn parse_search_day(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Please provide a valid date (YYYY-MM-DD)".to_string()))
}

pub fn user_response(u: &User) -> UserResponse {
    UserResponse {
        id: u.id.to_string(),
        name: u.name.clone(),
        email: u.email.clone(),
        phone: u.phone.clone(),
        is_driver: u.is_driver,
        vehicle_info: u.vehicle.as_ref().map(vehicle_dto),
        role: u.role.to_string(),
        rating: u.rating,
        total_rides: u.total_rides,
        created_at: u.created_at.to_rfc3339(),
    }
}

pub fn public_user(u: &User) -> PublicUserResponse {
    PublicUserResponse {
        id: u.id.to_string(),
        name: u.name.clone(),
        is_driver: u.is_driver,
        vehicle_info: u.vehicle.as_ref().map(vehicle_dto),
        rating: u.rating,
        total_rides: u.total_rides,
        created_at: u.created_at.to_rfc3339(),
    }
}

pub fn driver_summary(u: &User) -> DriverSummary {
    DriverSummary {
        id: u.id.to_string(),
        name: u.name.clone(),
        rating: u.rating,
        total_rides: u.total_rides,
        vehicle_info: u.vehicle.as_ref().map(vehicle_dto),
    }
}

pub fn search_result(u: &User) -> UserSearchResult {
    UserSearchResult {
        id: u.id.to_string(),
        name: u.name.clone(),
        email: u.email.clone(),
        is_driver: u.is_driver,
        rating: u.rating,
        total_rides: u.total_rides,
    }
}

pub fn rated_user(u: &User) -> RatedUser {
    RatedUser {
        id: u.id.to_string(),
        name: u.name.clone(),
        rating: u.rating,
        total_rides: u.total_rides,
    }
}

/// Render a ride for `viewer`.
///
/// Driver contact details need a signed-in viewer; passenger contacts are
/// shown to the ride's own driver only. `people` holds whichever
/// participants were loaded.
pub fn ride_response(ride: &Ride, viewer: Option<&User>, people: &HashMap<Uuid, User>) -> RideResponse {
    let driver = people.get(&ride.driver_id);
    let viewer_is_driver = viewer.is_some_and(|v| ride.is_driver(v.id));

    let passengers = ride
        .passengers
        .iter()
        .map(|b| PassengerResponse {
            user_id: b.user_id.to_string(),
            contact: people
                .get(&b.user_id)
                .filter(|_| viewer_is_driver)
                .map(|p| ContactSummary {
                    name: p.name.clone(),
                    email: p.email.clone(),
                    phone: p.phone.clone(),
                }),
            seats: b.seats,
            booked_at: b.booked_at.to_rfc3339(),
        })
        .collect();

    RideResponse {
        id: ride.id.to_string(),
        driver: RideDriver {
            id: ride.driver_id.to_string(),
            name: driver.map(|d| d.name.clone()),
            rating: driver.map(|d| d.rating),
            vehicle_info: driver.and_then(|d| d.vehicle.as_ref()).map(vehicle_dto),
            email: driver.filter(|_| viewer.is_some()).map(|d| d.email.clone()),
            phone: driver.filter(|_| viewer.is_some()).map(|d| d.phone.clone()),
        },
        start_location: ride.start_location.clone(),
        destination: ride.destination.clone(),
        date: ride.date.to_rfc3339(),
        time: ride.time.clone(),
        eta: ride.eta_hours,
        available_seats: ride.available_seats,
        price: ride.price,
        description: ride.description.clone(),
        status: ride.status.to_string(),
        passengers,
        vehicle_info: ride.vehicle.as_ref().map(vehicle_dto),
        pickup_points: ride
            .pickup_points
            .iter()
            .map(|p| PickupPointDto {
                location: p.location.clone(),
                time: p.time.clone(),
            })
            .collect(),
        restrictions: RestrictionsDto {
            smoking: ride.restrictions.smoking,
            pets: ride.restrictions.pets,
            luggage: ride.restrictions.luggage,
        },
        remaining_seats: ride.remaining_seats(),
        total_revenue: ride.total_revenue(),
        is_full: ride.is_full(),
        created_at: ride.created_at.to_rfc3339(),
        updated_at: ride.updated_at.to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use gofera_core::domain::{NewRide, NewUser};

    fn user(name: &str, email: &str) -> User {
        User::new(
            NewUser {
                name: name.into(),
                email: email.into(),
                phone: "+251911000000".into(),
                is_driver: true,
            },
            "hash".into(),
        )
        .unwrap()
    }

    fn ride_for(driver: &User) -> Ride {
        Ride::new(
            driver.id,
            NewRide {
                start_location: "Addis Ababa".into(),
                destination: "Dire Dawa".into(),
                date: Utc::now(),
                time: "05:00".into(),
                eta_hours: 8.0,
                available_seats: 3,
                price: 700.0,
                description: None,
                vehicle: None,
                pickup_points: Vec::new(),
                restrictions: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_parse_ride_date() {
        let day = parse_ride_date("2026-12-24").unwrap();
        assert_eq!((day.year(), day.month(), day.day(), day.hour()), (2026, 12, 24, 0));
        assert!(parse_ride_date("2026-12-24T08:00:00Z").is_ok());
        assert!(parse_ride_date("24/12/2026").is_err());
    }

    #[test]
    fn test_contact_visibility() {
        let driver = user("Driver", "driver@example.com");
        let passenger = user("Rider", "rider@example.com");
        let mut ride = ride_for(&driver);
        ride.book(passenger.id, 1, Utc::now()).unwrap();

        let people: HashMap<Uuid, User> = [driver.clone(), passenger.clone()]
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let anonymous = ride_response(&ride, None, &people);
        assert_eq!(anonymous.driver.name.as_deref(), Some("Driver"));
        assert!(anonymous.driver.email.is_none());
        assert!(anonymous.passengers[0].contact.is_none());

        let as_passenger = ride_response(&ride, Some(&passenger), &people);
        assert_eq!(as_passenger.driver.email.as_deref(), Some("driver@example.com"));
        assert!(as_passenger.passengers[0].contact.is_none());

        let as_driver = ride_response(&ride, Some(&driver), &people);
        let contact = as_driver.passengers[0].contact.as_ref().unwrap();
        assert_eq!(contact.email, "rider@example.com");
        assert_eq!(as_driver.remaining_seats, 2);
        assert_eq!(as_driver.total_revenue, 700.0);
    }
}
