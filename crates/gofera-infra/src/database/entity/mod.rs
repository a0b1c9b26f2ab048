//! SeaORM entities and their conversions to domain types.

pub mod rating;
pub mod ride;
pub mod ride_booking;
pub mod user;

use sea_orm::prelude::Json;
use serde::{Serialize, de::DeserializeOwned};

use gofera_core::error::RepoError;

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<Json, RepoError> {
    serde_json::to_value(value).map_err(|e| RepoError::Query(format!("encode json column: {e}")))
}

pub(crate) fn from_json<T: DeserializeOwned>(value: Json) -> Result<T, RepoError> {
    serde_json::from_value(value).map_err(|e| RepoError::Query(format!("decode json column: {e}")))
}

pub(crate) fn to_u32(value: i32, column: &str) -> Result<u32, RepoError> {
    u32::try_from(value).map_err(|_| RepoError::Query(format!("negative {column}: {value}")))
}
