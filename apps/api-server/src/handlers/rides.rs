//! Ride handlers: posting, search, editing, booking and status changes.

use std::collections::HashMap;

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use gofera_core::domain::{NewRide, Ride, RideChanges, User};
use gofera_core::ports::RideSearch;
use gofera_core::services::{MyRidesRole, require_driver};
use gofera_shared::ApiResponse;
use gofera_shared::dto::{
    BookRideRequest, CreateRideRequest, MyRidesQuery, RideData, RideSearchQuery, RidesData,
    UpdateRideRequest,
};

use super::views::{
    parse_ride_date, parse_search_day, pickup_from_dto, restrictions_from_dto, ride_response,
    vehicle_from_dto,
};
use crate::middleware::auth::{CurrentUser, OptionalCurrentUser};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::JSON_LIMIT_BYTES;

fn required<T>(value: Option<T>, message: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::BadRequest(message.to_string()))
}

async fn render_one(state: &AppState, ride: Ride, viewer: Option<&User>) -> AppResult<RideData> {
    let people = state.rides.participants(std::slice::from_ref(&ride)).await?;
    Ok(RideData {
        ride: ride_response(&ride, viewer, &people),
    })
}

async fn render_many(state: &AppState, rides: &[Ride], viewer: Option<&User>) -> AppResult<RidesData> {
    let people: HashMap<Uuid, User> = state.rides.participants(rides).await?;
    Ok(RidesData {
        rides: rides
            .iter()
            .map(|r| ride_response(r, viewer, &people))
            .collect(),
    })
}

/// POST /api/rides
pub async fn create_ride(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<CreateRideRequest>,
) -> AppResult<HttpResponse> {
    require_driver(&user)?;
    let req = body.into_inner();

    let input = NewRide {
        start_location: required(req.start_location, "Please provide starting location")?,
        destination: required(req.destination, "Please provide destination")?,
        date: parse_ride_date(&required(req.date, "Please provide departure date")?)?,
        time: required(req.time, "Please provide departure time")?,
        eta_hours: required(req.eta, "Please provide estimated travel time")?,
        available_seats: required(req.available_seats, "Please specify available seats")?,
        price: required(req.price, "Please provide price per seat")?,
        description: req.description,
        vehicle: req.vehicle_info.map(vehicle_from_dto),
        pickup_points: req
            .pickup_points
            .unwrap_or_default()
            .into_iter()
            .map(pickup_from_dto)
            .collect(),
        restrictions: req.restrictions.map(restrictions_from_dto),
    };

    let ride = state.rides.create(&user, input).await?;
    let data = render_one(&state, ride, Some(&user.0)).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(data)))
}

/// GET /api/rides
pub async fn list_rides(
    state: web::Data<AppState>,
    viewer: OptionalCurrentUser,
    query: web::Query<RideSearchQuery>,
) -> AppResult<HttpResponse> {
    let q = query.into_inner();
    let filter = RideSearch {
        start_location: q.start_location.filter(|s| !s.trim().is_empty()),
        destination: q.destination.filter(|s| !s.trim().is_empty()),
        date: q.date.as_deref().map(parse_search_day).transpose()?,
        min_seats: q.min_seats,
        max_price: q.max_price,
    };

    let rides = state.rides.search(&filter).await?;
    let data = render_many(&state, &rides, viewer.0.as_ref()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(data).with_results(rides.len())))
}

/// GET /api/rides/{id}
pub async fn get_ride(
    state: web::Data<AppState>,
    viewer: OptionalCurrentUser,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let ride = state.rides.get(id.into_inner()).await?;
    let data = render_one(&state, ride, viewer.0.as_ref()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(data)))
}

/// PATCH /api/rides/{id}
pub async fn update_ride(
    state: web::Data<AppState>,
    user: CurrentUser,
    id: web::Path<Uuid>,
    body: web::Json<UpdateRideRequest>,
) -> AppResult<HttpResponse> {
    require_driver(&user)?;
    let req = body.into_inner();

    let changes = RideChanges {
        start_location: req.start_location,
        destination: req.destination,
        date: req.date.as_deref().map(parse_ride_date).transpose()?,
        time: req.time,
        eta_hours: req.eta,
        available_seats: req.available_seats,
        price: req.price,
        description: req.description,
        vehicle: req.vehicle_info.map(vehicle_from_dto),
        pickup_points: req
            .pickup_points
            .map(|points| points.into_iter().map(pickup_from_dto).collect()),
        restrictions: req.restrictions.map(restrictions_from_dto),
    };

    let ride = state.rides.update(&user, id.into_inner(), changes).await?;
    let data = render_one(&state, ride, Some(&user.0)).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(data)))
}

/// DELETE /api/rides/{id}
pub async fn delete_ride(
    state: web::Data<AppState>,
    user: CurrentUser,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    require_driver(&user)?;
    state.rides.delete(&user, id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// An empty body books one seat; anything else must be a valid request.
fn booking_request(body: &[u8]) -> AppResult<BookRideRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(BookRideRequest::default());
    }
    if body.len() > JSON_LIMIT_BYTES {
        return Err(AppError::BadRequest("Request body is too large".to_string()));
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("Invalid input data. {e}")))
}

/// POST /api/rides/{id}/book
pub async fn book_ride(
    state: web::Data<AppState>,
    user: CurrentUser,
    id: web::Path<Uuid>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let seats = booking_request(&body)?.seats;

    let ride = state.rides.book(&user, id.into_inner(), seats).await?;
    let data = render_one(&state, ride, Some(&user.0)).await?;
    Ok(HttpResponse::Ok().json(
        ApiResponse::ok(data).with_message(format!("Successfully booked {seats} seat(s)")),
    ))
}

/// DELETE /api/rides/{id}/cancel-booking
pub async fn cancel_booking(
    state: web::Data<AppState>,
    user: CurrentUser,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let ride = state.rides.cancel_booking(&user, id.into_inner()).await?;
    let data = render_one(&state, ride, Some(&user.0)).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(data).with_message("Booking cancelled successfully")))
}

/// PATCH /api/rides/{id}/complete
pub async fn complete_ride(
    state: web::Data<AppState>,
    user: CurrentUser,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    require_driver(&user)?;
    let ride = state.rides.complete(&user, id.into_inner()).await?;
    let data = render_one(&state, ride, Some(&user.0)).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(data).with_message("Ride completed successfully")))
}

/// PATCH /api/rides/{id}/cancel
pub async fn cancel_ride(
    state: web::Data<AppState>,
    user: CurrentUser,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    require_driver(&user)?;
    let ride = state.rides.cancel(&user, id.into_inner()).await?;
    let data = render_one(&state, ride, Some(&user.0)).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(data).with_message("Ride cancelled successfully")))
}

/// GET /api/rides/my-rides?role=driver|passenger|all
pub async fn my_rides(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<MyRidesQuery>,
) -> AppResult<HttpResponse> {
    let role = match query.into_inner().role.as_deref() {
        Some(raw) if !raw.is_empty() => raw.parse::<MyRidesRole>()?,
        _ => MyRidesRole::default(),
    };

    let rides = state.rides.my_rides(&user, role).await?;
    let data = render_many(&state, &rides, Some(&user.0)).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(data).with_results(rides.len())))
}

/// GET /api/rides/my-rides/stats
pub async fn my_ride_stats(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> AppResult<HttpResponse> {
    let stats = state.rides.driver_stats(&user).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(stats)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_booking_body_means_one_seat() {
        assert_eq!(booking_request(b"").unwrap().seats, 1);
        assert_eq!(booking_request(b" \n").unwrap().seats, 1);
        assert_eq!(booking_request(b"{}").unwrap().seats, 1);
        assert_eq!(booking_request(br#"{"seats": 3}"#).unwrap().seats, 3);
    }

    #[test]
    fn test_malformed_seat_counts_rejected() {
        let bodies: [&[u8]; 3] = [br#"{"seats": -2}"#, br#"{"seats": "two"}"#, b"seats=2"];
        for body in bodies {
            assert!(matches!(booking_request(body), Err(AppError::BadRequest(_))));
        }
    }
}
