//! User entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use gofera_core::domain::User;
use gofera_core::error::RepoError;

use super::{from_json, to_json, to_u32};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub is_driver: bool,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub vehicle: Option<Json>,
    pub role: String,
    #[sea_orm(column_type = "Double")]
    pub rating: f64,
    pub total_rides: i32,
    pub active: bool,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub push_subscription: Option<Json>,
    pub password_reset_token: Option<String>,
    pub password_reset_expires: Option<DateTimeWithTimeZone>,
    pub password_changed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ride::Entity")]
    Rides,
}

impl Related<super::ride::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rides.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for User {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            name: model.name,
            email: model.email,
            password_hash: model.password_hash,
            phone: model.phone,
            is_driver: model.is_driver,
            vehicle: model.vehicle.map(from_json).transpose()?,
            role: model
                .role
                .parse()
                .map_err(|e| RepoError::Query(format!("{e}")))?,
            rating: model.rating,
            total_rides: to_u32(model.total_rides, "total_rides")?,
            active: model.active,
            push_subscription: model.push_subscription,
            password_reset_token: model.password_reset_token,
            password_reset_expires: model.password_reset_expires.map(Into::into),
            password_changed_at: model.password_changed_at.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

impl TryFrom<User> for ActiveModel {
    type Error = RepoError;

    fn try_from(user: User) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Set(user.id),
            name: Set(user.name),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            phone: Set(user.phone),
            is_driver: Set(user.is_driver),
            vehicle: Set(user.vehicle.as_ref().map(to_json).transpose()?),
            role: Set(user.role.as_str().to_string()),
            rating: Set(user.rating),
            total_rides: Set(user.total_rides as i32),
            active: Set(user.active),
            push_subscription: Set(user.push_subscription),
            password_reset_token: Set(user.password_reset_token),
            password_reset_expires: Set(user.password_reset_expires.map(Into::into)),
            password_changed_at: Set(user.password_changed_at.map(Into::into)),
            created_at: Set(user.created_at.into()),
            updated_at: Set(user.updated_at.into()),
        })
    }
}
