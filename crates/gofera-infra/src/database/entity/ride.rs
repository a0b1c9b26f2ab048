//! Ride entity for SeaORM. Bookings live in `ride_bookings`.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use gofera_core::domain::Ride;
use gofera_core::error::RepoError;

use super::{from_json, ride_booking, to_json, to_u32};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "rides")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub driver_id: Uuid,
    pub start_location: String,
    pub destination: String,
    pub date: DateTimeWithTimeZone,
    pub time: String,
    #[sea_orm(column_type = "Double")]
    pub eta_hours: f64,
    pub available_seats: i32,
    #[sea_orm(column_type = "Double")]
    pub price: f64,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub status: String,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub vehicle: Option<Json>,
    #[sea_orm(column_type = "JsonBinary")]
    pub pickup_points: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub restrictions: Json,
    pub active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::DriverId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Driver,
    #[sea_orm(has_many = "super::ride_booking::Entity")]
    Bookings,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Driver.def()
    }
}

impl Related<super::ride_booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Assemble the domain ride from its row and booking rows.
    pub fn into_domain(self, bookings: Vec<ride_booking::Model>) -> Result<Ride, RepoError> {
        let passengers = bookings
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Ride {
            id: self.id,
            driver_id: self.driver_id,
            start_location: self.start_location,
            destination: self.destination,
            date: self.date.into(),
            time: self.time,
            eta_hours: self.eta_hours,
            available_seats: to_u32(self.available_seats, "available_seats")?,
            price: self.price,
            description: self.description,
            status: self
                .status
                .parse()
                .map_err(|e| RepoError::Query(format!("{e}")))?,
            passengers,
            vehicle: self.vehicle.map(from_json).transpose()?,
            pickup_points: from_json(self.pickup_points)?,
            restrictions: from_json(self.restrictions)?,
            active: self.active,
            created_at: self.created_at.into(),
            updated_at: self.updated_at.into(),
        })
    }
}

/// Ride columns only; bookings are written separately.
impl TryFrom<&Ride> for ActiveModel {
    type Error = RepoError;

    fn try_from(ride: &Ride) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Set(ride.id),
            driver_id: Set(ride.driver_id),
            start_location: Set(ride.start_location.clone()),
            destination: Set(ride.destination.clone()),
            date: Set(ride.date.into()),
            time: Set(ride.time.clone()),
            eta_hours: Set(ride.eta_hours),
            available_seats: Set(ride.available_seats as i32),
            price: Set(ride.price),
            description: Set(ride.description.clone()),
            status: Set(ride.status.as_str().to_string()),
            vehicle: Set(ride.vehicle.as_ref().map(to_json).transpose()?),
            pickup_points: Set(to_json(&ride.pickup_points)?),
            restrictions: Set(to_json(&ride.restrictions)?),
            active: Set(ride.active),
            created_at: Set(ride.created_at.into()),
            updated_at: Set(ride.updated_at.into()),
        })
    }
}
