//! Data Transfer Objects - request/response types for the API.
//!
//! All bodies are camelCase. Ids are UUID strings, instants RFC 3339.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Shared value objects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInfoDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupPointDto {
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestrictionsDto {
    #[serde(default)]
    pub smoking: bool,
    #[serde(default)]
    pub pets: bool,
    #[serde(default = "default_true")]
    pub luggage: bool,
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Auth requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub is_driver: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetPasswordRequest {
    pub password: String,
}

// ---------------------------------------------------------------------------
// User requests
// ---------------------------------------------------------------------------

/// `PATCH /api/users/me`. `password` is accepted only to be rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub vehicle_info: Option<VehicleInfoDto>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BecomeDriverRequest {
    pub vehicle_info: Option<VehicleInfoDto>,
}

/// `rating` stays a float so a fractional score reaches validation and is
/// rejected with a proper message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RateUserRequest {
    pub rating: Option<f64>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSearchQuery {
    pub name: Option<String>,
    pub email: Option<String>,
    pub is_driver: Option<bool>,
}

// ---------------------------------------------------------------------------
// Ride requests
// ---------------------------------------------------------------------------

/// `POST /api/rides`. Required fields are optional here so a missing one is
/// reported by name instead of as a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateRideRequest {
    pub start_location: Option<String>,
    pub destination: Option<String>,
    /// `YYYY-MM-DD` or an RFC 3339 instant.
    pub date: Option<String>,
    pub time: Option<String>,
    /// Estimated travel time in hours.
    pub eta: Option<f64>,
    pub available_seats: Option<u32>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub vehicle_info: Option<VehicleInfoDto>,
    pub pickup_points: Option<Vec<PickupPointDto>>,
    pub restrictions: Option<RestrictionsDto>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateRideRequest {
    pub start_location: Option<String>,
    pub destination: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub eta: Option<f64>,
    pub available_seats: Option<u32>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub vehicle_info: Option<VehicleInfoDto>,
    pub pickup_points: Option<Vec<PickupPointDto>>,
    pub restrictions: Option<RestrictionsDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookRideRequest {
    pub seats: u32,
}

impl Default for BookRideRequest {
    fn default() -> Self {
        Self { seats: 1 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RideSearchQuery {
    pub start_location: Option<String>,
    pub destination: Option<String>,
    /// `YYYY-MM-DD`.
    pub date: Option<String>,
    pub min_seats: Option<u32>,
    pub max_price: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MyRidesQuery {
    pub role: Option<String>,
}

// ---------------------------------------------------------------------------
// User views
// ---------------------------------------------------------------------------

/// The caller's own account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub is_driver: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_info: Option<VehicleInfoDto>,
    pub role: String,
    pub rating: f64,
    pub total_rides: u32,
    pub created_at: String,
}

/// Another user's profile, without contact details.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUserResponse {
    pub id: String,
    pub name: String,
    pub is_driver: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_info: Option<VehicleInfoDto>,
    pub rating: f64,
    pub total_rides: u32,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverSummary {
    pub id: String,
    pub name: String,
    pub rating: f64,
    pub total_rides: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_info: Option<VehicleInfoDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSearchResult {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_driver: bool,
    pub rating: f64,
    pub total_rides: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatedUser {
    pub id: String,
    pub name: String,
    pub rating: f64,
    pub total_rides: u32,
}

// ---------------------------------------------------------------------------
// Ride views
// ---------------------------------------------------------------------------

/// A ride's driver. `email` and `phone` are present only for signed-in callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideDriver {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_info: Option<VehicleInfoDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassengerResponse {
    pub user_id: String,
    /// Filled in for the ride's driver only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactSummary>,
    pub seats: u32,
    pub booked_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideResponse {
    pub id: String,
    pub driver: RideDriver,
    pub start_location: String,
    pub destination: String,
    pub date: String,
    pub time: String,
    pub eta: f64,
    pub available_seats: u32,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: String,
    pub passengers: Vec<PassengerResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_info: Option<VehicleInfoDto>,
    pub pickup_points: Vec<PickupPointDto>,
    pub restrictions: RestrictionsDto,
    pub remaining_seats: i64,
    pub total_revenue: f64,
    pub is_full: bool,
    pub created_at: String,
    pub updated_at: String,
}

// ---------------------------------------------------------------------------
// `data` payload wrappers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserData<T> {
    pub user: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersData<T> {
    pub users: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriversData {
    pub drivers: Vec<DriverSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideData {
    pub ride: RideResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidesData {
    pub rides: Vec<RideResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let book: BookRideRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(book.seats, 1);

        let signup: SignupRequest =
            serde_json::from_value(json!({"name": "Lidya", "email": "l@x.io"})).unwrap();
        assert!(!signup.is_driver);
        assert!(signup.password.is_empty());

        let restrictions: RestrictionsDto = serde_json::from_value(json!({"pets": true})).unwrap();
        assert_eq!(
            restrictions,
            RestrictionsDto {
                smoking: false,
                pets: true,
                luggage: true
            }
        );
    }

    #[test]
    fn test_camel_case_fields() {
        let req: CreateRideRequest = serde_json::from_value(json!({
            "startLocation": "Gondar",
            "availableSeats": 3,
            "vehicleInfo": {"licensePlate": "AA-1"}
        }))
        .unwrap();
        assert_eq!(req.start_location.as_deref(), Some("Gondar"));
        assert_eq!(req.available_seats, Some(3));
        assert_eq!(
            req.vehicle_info.and_then(|v| v.license_plate).as_deref(),
            Some("AA-1")
        );
    }
}
