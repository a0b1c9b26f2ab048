//! Rating entity for SeaORM. Unique on (rater_id, ratee_id, ride_id).

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use gofera_core::domain::Rating;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ratings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub rater_id: Uuid,
    pub ratee_id: Uuid,
    pub ride_id: Uuid,
    pub score: i16,
    pub created_at: DateTimeWithTimeZone,
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

impl From<&Rating> for ActiveModel {
    fn from(rating: &Rating) -> Self {
        Self {
            id: Set(rating.id),
            rater_id: Set(rating.rater_id),
            ratee_id: Set(rating.ratee_id),
            ride_id: Set(rating.ride_id),
            score: Set(i16::from(rating.score)),
            created_at: Set(rating.created_at.into()),
        }
    }
}
