//! Ride use cases: posting, searching, editing, booking and status changes.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::auth::require_driver;
use crate::domain::{DriverRideStats, NewRide, Ride, RideChanges, RideStatus, User};
use crate::error::{DomainError, RepoError};
use crate::ports::{RideRepository, RideSearch, UserRepository};

/// Which side of the rides a user wants listed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MyRidesRole {
    Driver,
    Passenger,
    #[default]
    All,
}

impl FromStr for MyRidesRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "driver" => Ok(Self::Driver),
            "passenger" => Ok(Self::Passenger),
            "all" => Ok(Self::All),
            other => Err(DomainError::Validation(format!(
                "Invalid role filter: {other}"
            ))),
        }
    }
}

pub struct RideService {
    rides: Arc<dyn RideRepository>,
    users: Arc<dyn UserRepository>,
}

impl RideService {
    pub fn new(rides: Arc<dyn RideRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { rides, users }
    }

    pub async fn create(&self, driver: &User, input: NewRide) -> Result<Ride, DomainError> {
        require_driver(driver)?;

        let mut input = input;
        if input.vehicle.is_none() {
            input.vehicle = driver.vehicle.clone();
        }
        let ride = Ride::new(driver.id, input)?;
        let ride = self.rides.create(ride).await?;

        tracing::info!(ride_id = %ride.id, driver_id = %driver.id, "Ride created");
        Ok(ride)
    }

    pub async fn search(&self, filter: &RideSearch) -> Result<Vec<Ride>, DomainError> {
        Ok(self.rides.search(filter).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Ride, DomainError> {
        self.rides
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::ride_not_found(id))
    }

    pub async fn update(
        &self,
        user: &User,
        id: Uuid,
        changes: RideChanges,
    ) -> Result<Ride, DomainError> {
        let mut ride = self.get(id).await?;
        if !ride.is_driver(user.id) {
            return Err(DomainError::Forbidden(
                "You can only update your own rides".into(),
            ));
        }

        ride.apply_changes(changes)?;
        let ride = self
            .rides
            .update_unbooked(ride)
            .await
            .map_err(|e| not_found_as(e, id))?;

        tracing::info!(ride_id = %id, "Ride updated");
        Ok(ride)
    }

    pub async fn delete(&self, user: &User, id: Uuid) -> Result<(), DomainError> {
        let ride = self.get(id).await?;
        if !ride.is_driver(user.id) {
            return Err(DomainError::Forbidden(
                "You can only delete your own rides".into(),
            ));
        }
        ride.check_editable()?;

        self.rides
            .soft_delete_unbooked(id)
            .await
            .map_err(|e| not_found_as(e, id))?;

        tracing::info!(ride_id = %id, "Ride deleted");
        Ok(())
    }

    pub async fn book(&self, user: &User, id: Uuid, seats: u32) -> Result<Ride, DomainError> {
        // Resolve 404 before eligibility so a missing ride never reads as a rule failure.
        self.get(id).await?;

        let ride = self
            .rides
            .book(id, user.id, seats, Utc::now())
            .await
            .map_err(|e| not_found_as(e, id))?;

        tracing::info!(ride_id = %id, user_id = %user.id, seats, "Seats booked");
        Ok(ride)
    }

    pub async fn cancel_booking(&self, user: &User, id: Uuid) -> Result<Ride, DomainError> {
        self.get(id).await?;

        let ride = self
            .rides
            .cancel_booking(id, user.id)
            .await
            .map_err(|e| not_found_as(e, id))?;

        tracing::info!(ride_id = %id, user_id = %user.id, "Booking cancelled");
        Ok(ride)
    }

    /// Driver marks a ride as completed.
    pub async fn complete(&self, user: &User, id: Uuid) -> Result<Ride, DomainError> {
        self.finish(user, id, RideStatus::Completed).await
    }

    /// Driver cancels the whole ride.
    pub async fn cancel(&self, user: &User, id: Uuid) -> Result<Ride, DomainError> {
        self.finish(user, id, RideStatus::Cancelled).await
    }

    async fn finish(&self, user: &User, id: Uuid, to: RideStatus) -> Result<Ride, DomainError> {
        let ride = self.get(id).await?;
        if !ride.is_driver(user.id) {
            let verb = if to == RideStatus::Completed { "complete" } else { "cancel" };
            return Err(DomainError::Forbidden(format!(
                "You can only {verb} your own rides"
            )));
        }

        let ride = self
            .rides
            .transition(id, to)
            .await
            .map_err(|e| not_found_as(e, id))?;

        tracing::info!(ride_id = %id, status = %to, "Ride status changed");
        Ok(ride)
    }

    /// Rides the user drives, rides on, or both; newest date first.
    pub async fn my_rides(&self, user: &User, role: MyRidesRole) -> Result<Vec<Ride>, DomainError> {
        let mut rides = match role {
            MyRidesRole::Driver => self.rides.find_by_driver(user.id).await?,
            MyRidesRole::Passenger => self.rides.find_by_passenger(user.id).await?,
            MyRidesRole::All => {
                let mut rides = self.rides.find_by_driver(user.id).await?;
                rides.extend(self.rides.find_by_passenger(user.id).await?);
                rides
            }
        };

        rides.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.time.cmp(&a.time)));
        Ok(rides)
    }

    pub async fn driver_stats(&self, user: &User) -> Result<DriverRideStats, DomainError> {
        let rides = self.rides.find_by_driver(user.id).await?;
        Ok(DriverRideStats::from_rides(&rides))
    }

    /// Drivers and passengers referenced by `rides`, keyed by id. Accounts
    /// that were deactivated since are simply absent.
    pub async fn participants(&self, rides: &[Ride]) -> Result<HashMap<Uuid, User>, DomainError> {
        let mut ids: Vec<Uuid> = rides
            .iter()
            .flat_map(|r| std::iter::once(r.driver_id).chain(r.passengers.iter().map(|p| p.user_id)))
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let users = self.users.find_by_ids(&ids).await?;
        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }
}

/// The ride was deleted between the existence check and the write.
fn not_found_as(err: RepoError, id: Uuid) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::ride_not_found(id),
        other => other.into(),
    }
}
