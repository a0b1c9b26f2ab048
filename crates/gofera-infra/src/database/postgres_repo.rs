//! PostgreSQL repository implementations.
//!
//! Mutating ride operations run inside a transaction that holds a row lock
//! on the ride (`SELECT ... FOR UPDATE`), re-apply the domain rule to the
//! locked state and only then write.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Days, Utc};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, DbConn, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use uuid::Uuid;

use gofera_core::domain::{Rating, Ride, RideStatus, RuleViolation, User, mask_email};
use gofera_core::error::RepoError;
use gofera_core::ports::{RatingRepository, RideRepository, RideSearch, UserRepository, UserSearch};

use super::entity::{rating, ride, ride_booking, user};

fn query_err(e: DbErr) -> RepoError {
    if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return RepoError::Constraint(e.to_string());
    }
    let msg = e.to_string();
    if msg.contains("duplicate") || msg.contains("unique") {
        RepoError::Constraint(msg)
    } else {
        RepoError::Query(msg)
    }
}

fn conn_err(e: DbErr) -> RepoError {
    RepoError::Connection(e.to_string())
}

/// Lowercased `%term%` pattern with LIKE wildcards escaped.
fn contains_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn ci_contains<C: ColumnTrait>(column: C, term: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(contains_pattern(term))
}

/// PostgreSQL user repository.
pub struct PostgresUserRepository {
    db: DbConn,
}

impl PostgresUserRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    async fn one(&self, condition: Condition) -> Result<Option<User>, RepoError> {
        user::Entity::find()
            .filter(condition)
            .one(&self.db)
            .await
            .map_err(query_err)?
            .map(User::try_from)
            .transpose()
    }

    async fn many(
        &self,
        condition: Condition,
        limit: Option<u64>,
    ) -> Result<Vec<User>, RepoError> {
        let mut query = user::Entity::find()
            .filter(condition)
            .order_by_asc(user::Column::Name);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        query
            .all(&self.db)
            .await
            .map_err(query_err)?
            .into_iter()
            .map(User::try_from)
            .collect()
    }
}

fn active_user() -> Condition {
    Condition::all().add(user::Column::Active.eq(true))
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, RepoError> {
        let model: user::ActiveModel = user.try_into()?;
        let saved = model.insert(&self.db).await.map_err(query_err)?;
        saved.try_into()
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let model: user::ActiveModel = user.try_into()?;
        let saved = model.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => RepoError::NotFound,
            other => query_err(other),
        })?;
        saved.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        self.one(active_user().add(user::Column::Id.eq(id))).await
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.many(
            active_user().add(user::Column::Id.is_in(ids.iter().copied())),
            None,
        )
        .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");
        self.one(active_user().add(user::Column::Email.eq(email)))
            .await
    }

    async fn find_by_email_including_inactive(
        &self,
        email: &str,
    ) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email (any status)");
        self.one(Condition::all().add(user::Column::Email.eq(email)))
            .await
    }

    async fn email_taken(&self, email: &str) -> Result<bool, RepoError> {
        let count = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .count(&self.db)
            .await
            .map_err(query_err)?;
        Ok(count > 0)
    }

    async fn find_by_reset_token(
        &self,
        digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepoError> {
        self.one(
            active_user()
                .add(user::Column::PasswordResetToken.eq(digest))
                .add(user::Column::PasswordResetExpires.gt(now)),
        )
        .await
    }

    async fn list_active(&self) -> Result<Vec<User>, RepoError> {
        self.many(active_user(), None).await
    }

    async fn list_drivers(&self) -> Result<Vec<User>, RepoError> {
        user::Entity::find()
            .filter(active_user().add(user::Column::IsDriver.eq(true)))
            .order_by_desc(user::Column::Rating)
            .order_by_asc(user::Column::Name)
            .all(&self.db)
            .await
            .map_err(query_err)?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn search(&self, filter: &UserSearch) -> Result<Vec<User>, RepoError> {
        let mut condition = active_user();
        if let Some(name) = &filter.name {
            condition = condition.add(ci_contains(user::Column::Name, name));
        }
        if let Some(email) = &filter.email {
            condition = condition.add(ci_contains(user::Column::Email, email));
        }
        if let Some(is_driver) = filter.is_driver {
            condition = condition.add(user::Column::IsDriver.eq(is_driver));
        }
        self.many(condition, Some(filter.limit)).await
    }

    async fn deactivate(&self, id: Uuid) -> Result<(), RepoError> {
        let result = user::Entity::update_many()
            .col_expr(user::Column::Active, Expr::value(false))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(query_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

/// PostgreSQL ride repository. Bookings are stored in `ride_bookings`.
pub struct PostgresRideRepository {
    db: DbConn,
}

impl PostgresRideRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    async fn with_bookings<C: ConnectionTrait>(
        conn: &C,
        rows: Vec<ride::Model>,
    ) -> Result<Vec<Ride>, RepoError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut grouped: HashMap<Uuid, Vec<ride_booking::Model>> = HashMap::new();
        for booking in ride_booking::Entity::find()
            .filter(ride_booking::Column::RideId.is_in(ids))
            .order_by_asc(ride_booking::Column::BookedAt)
            .all(conn)
            .await
            .map_err(query_err)?
        {
            grouped.entry(booking.ride_id).or_default().push(booking);
        }

        rows.into_iter()
            .map(|row| {
                let bookings = grouped.remove(&row.id).unwrap_or_default();
                row.into_domain(bookings)
            })
            .collect()
    }

    async fn load(&self, condition: Condition, newest_first: bool) -> Result<Vec<Ride>, RepoError> {
        let query = ride::Entity::find().filter(condition);
        let query = if newest_first {
            query
                .order_by_desc(ride::Column::Date)
                .order_by_desc(ride::Column::Time)
        } else {
            query
                .order_by_asc(ride::Column::Date)
                .order_by_asc(ride::Column::Time)
        };
        let rows = query.all(&self.db).await.map_err(query_err)?;
        Self::with_bookings(&self.db, rows).await
    }

    async fn booked_ride_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, RepoError> {
        Ok(ride_booking::Entity::find()
            .filter(ride_booking::Column::UserId.eq(user_id))
            .all(&self.db)
            .await
            .map_err(query_err)?
            .into_iter()
            .map(|b| b.ride_id)
            .collect())
    }

    /// Lock the live ride row for the rest of `txn` and load its bookings.
    async fn lock(txn: &DatabaseTransaction, id: Uuid) -> Result<Ride, RepoError> {
        let row = ride::Entity::find_by_id(id)
            .filter(ride::Column::Active.eq(true))
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(query_err)?
            .ok_or(RepoError::NotFound)?;

        let mut rides = Self::with_bookings(txn, vec![row]).await?;
        rides.pop().ok_or(RepoError::NotFound)
    }

    async fn save_row(txn: &DatabaseTransaction, ride: &Ride) -> Result<(), RepoError> {
        let model: ride::ActiveModel = ride.try_into()?;
        model.update(txn).await.map_err(query_err)?;
        Ok(())
    }
}

fn live_ride() -> Condition {
    Condition::all().add(ride::Column::Active.eq(true))
}

#[async_trait]
impl RideRepository for PostgresRideRepository {
    async fn create(&self, ride: Ride) -> Result<Ride, RepoError> {
        let model: ride::ActiveModel = (&ride).try_into()?;
        model.insert(&self.db).await.map_err(query_err)?;
        Ok(ride)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ride>, RepoError> {
        Ok(self
            .load(live_ride().add(ride::Column::Id.eq(id)), false)
            .await?
            .pop())
    }

    async fn search(&self, filter: &RideSearch) -> Result<Vec<Ride>, RepoError> {
        let mut condition = live_ride().add(ride::Column::Status.eq(RideStatus::Active.as_str()));

        if let Some(start) = &filter.start_location {
            condition = condition.add(ci_contains(ride::Column::StartLocation, start));
        }
        if let Some(destination) = &filter.destination {
            condition = condition.add(ci_contains(ride::Column::Destination, destination));
        }
        if let Some(day) = filter.date {
            let start = day.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
            let end = day
                .checked_add_days(Days::new(1))
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|d| d.and_utc());
            if let (Some(start), Some(end)) = (start, end) {
                condition = condition
                    .add(ride::Column::Date.gte(start))
                    .add(ride::Column::Date.lt(end));
            }
        }
        if let Some(max_price) = filter.max_price {
            condition = condition.add(ride::Column::Price.lte(max_price));
        }

        let mut rides = self.load(condition, false).await?;
        // Remaining seats depend on the booking rows, so this filter runs after loading.
        if let Some(min_seats) = filter.min_seats {
            rides.retain(|r| r.remaining_seats() >= i64::from(min_seats));
        }
        Ok(rides)
    }

    async fn find_by_driver(&self, driver_id: Uuid) -> Result<Vec<Ride>, RepoError> {
        self.load(live_ride().add(ride::Column::DriverId.eq(driver_id)), true)
            .await
    }

    async fn find_by_passenger(&self, user_id: Uuid) -> Result<Vec<Ride>, RepoError> {
        let ids = self.booked_ride_ids(user_id).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.load(live_ride().add(ride::Column::Id.is_in(ids)), true)
            .await
    }

    async fn find_completed_shared(&self, a: Uuid, b: Uuid) -> Result<Vec<Ride>, RepoError> {
        let rides = self
            .load(
                Condition::all()
                    .add(ride::Column::Status.eq(RideStatus::Completed.as_str()))
                    .add(ride::Column::DriverId.is_in([a, b])),
                false,
            )
            .await?;

        Ok(rides
            .into_iter()
            .filter(|r| {
                (r.driver_id == a && r.booking_for(b).is_some())
                    || (r.driver_id == b && r.booking_for(a).is_some())
            })
            .collect())
    }

    async fn has_active_involvement(&self, user_id: Uuid) -> Result<bool, RepoError> {
        let booked = self.booked_ride_ids(user_id).await?;

        let mut involvement = Condition::any().add(ride::Column::DriverId.eq(user_id));
        if !booked.is_empty() {
            involvement = involvement.add(ride::Column::Id.is_in(booked));
        }

        let count = ride::Entity::find()
            .filter(
                live_ride()
                    .add(ride::Column::Status.eq(RideStatus::Active.as_str()))
                    .add(involvement),
            )
            .count(&self.db)
            .await
            .map_err(query_err)?;
        Ok(count > 0)
    }

    async fn update_unbooked(&self, ride: Ride) -> Result<Ride, RepoError> {
        let txn = self.db.begin().await.map_err(conn_err)?;

        let current = Self::lock(&txn, ride.id).await?;
        current.check_editable()?;

        let updated = Ride {
            passengers: current.passengers,
            status: current.status,
            active: current.active,
            driver_id: current.driver_id,
            created_at: current.created_at,
            ..ride
        };
        Self::save_row(&txn, &updated).await?;

        txn.commit().await.map_err(conn_err)?;
        Ok(updated)
    }

    async fn soft_delete_unbooked(&self, id: Uuid) -> Result<(), RepoError> {
        let txn = self.db.begin().await.map_err(conn_err)?;

        let mut ride = Self::lock(&txn, id).await?;
        ride.soft_delete()?;
        Self::save_row(&txn, &ride).await?;

        txn.commit().await.map_err(conn_err)?;
        Ok(())
    }

    async fn book(
        &self,
        ride_id: Uuid,
        user_id: Uuid,
        seats: u32,
        booked_at: DateTime<Utc>,
    ) -> Result<Ride, RepoError> {
        let txn = self.db.begin().await.map_err(conn_err)?;

        let mut ride = Self::lock(&txn, ride_id).await?;
        let booking = ride.book(user_id, seats, booked_at)?.clone();

        ride_booking::ActiveModel::for_booking(ride_id, &booking)
            .insert(&txn)
            .await
            .map_err(|e| match query_err(e) {
                RepoError::Constraint(_) => RuleViolation::AlreadyBooked.into(),
                other => other,
            })?;
        Self::save_row(&txn, &ride).await?;

        txn.commit().await.map_err(conn_err)?;
        Ok(ride)
    }

    async fn cancel_booking(&self, ride_id: Uuid, user_id: Uuid) -> Result<Ride, RepoError> {
        let txn = self.db.begin().await.map_err(conn_err)?;

        let mut ride = Self::lock(&txn, ride_id).await?;
        ride.cancel_booking(user_id)?;

        ride_booking::Entity::delete_many()
            .filter(ride_booking::Column::RideId.eq(ride_id))
            .filter(ride_booking::Column::UserId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(query_err)?;
        Self::save_row(&txn, &ride).await?;

        txn.commit().await.map_err(conn_err)?;
        Ok(ride)
    }

    async fn transition(&self, ride_id: Uuid, to: RideStatus) -> Result<Ride, RepoError> {
        let txn = self.db.begin().await.map_err(conn_err)?;

        let mut ride = Self::lock(&txn, ride_id).await?;
        ride.transition(to)?;
        Self::save_row(&txn, &ride).await?;

        txn.commit().await.map_err(conn_err)?;
        Ok(ride)
    }
}

/// PostgreSQL rating repository.
pub struct PostgresRatingRepository {
    db: DbConn,
}

impl PostgresRatingRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RatingRepository for PostgresRatingRepository {
    async fn exists(
        &self,
        rater_id: Uuid,
        ratee_id: Uuid,
        ride_id: Uuid,
    ) -> Result<bool, RepoError> {
        let count = rating::Entity::find()
            .filter(rating::Column::RaterId.eq(rater_id))
            .filter(rating::Column::RateeId.eq(ratee_id))
            .filter(rating::Column::RideId.eq(ride_id))
            .count(&self.db)
            .await
            .map_err(query_err)?;
        Ok(count > 0)
    }

    async fn record(&self, rating: Rating) -> Result<User, RepoError> {
        let txn = self.db.begin().await.map_err(conn_err)?;

        rating::ActiveModel::from(&rating)
            .insert(&txn)
            .await
            .map_err(query_err)?;

        let row = user::Entity::find_by_id(rating.ratee_id)
            .filter(user::Column::Active.eq(true))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(query_err)?
            .ok_or(RepoError::NotFound)?;
        let mut ratee = User::try_from(row)?;
        ratee.apply_rating(rating.score);

        let mut model: user::ActiveModel = Default::default();
        model.id = sea_orm::ActiveValue::Unchanged(ratee.id);
        model.rating = Set(ratee.rating);
        model.total_rides = Set(ratee.total_rides as i32);
        model.updated_at = Set(ratee.updated_at.into());
        model.update(&txn).await.map_err(query_err)?;

        txn.commit().await.map_err(conn_err)?;
        Ok(ratee)
    }
}
