//! One passenger's seats on a ride. Unique on (ride_id, user_id).

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use gofera_core::domain::Booking;
use gofera_core::error::RepoError;

use super::to_u32;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ride_bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub ride_id: Uuid,
    pub user_id: Uuid,
    pub seats: i32,
    pub booked_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ride::Entity",
        from = "Column::RideId",
        to = "super::ride::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Ride,
}

impl Related<super::ride::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ride.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Booking {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: model.user_id,
            seats: to_u32(model.seats, "seats")?,
            booked_at: model.booked_at.into(),
        })
    }
}

impl ActiveModel {
    pub fn for_booking(ride_id: Uuid, booking: &Booking) -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            ride_id: Set(ride_id),
            user_id: Set(booking.user_id),
            seats: Set(booking.seats as i32),
            booked_at: Set(booking.booked_at.into()),
        }
    }
}
