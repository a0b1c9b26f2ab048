use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_users::Users;
use super::m20250101_000002_create_rides::Rides;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Ratings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Ratings::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Ratings::RaterId).uuid().not_null())
                    .col(ColumnDef::new(Ratings::RateeId).uuid().not_null())
                    .col(ColumnDef::new(Ratings::RideId).uuid().not_null())
                    .col(ColumnDef::new(Ratings::Score).small_integer().not_null())
                    .col(
                        ColumnDef::new(Ratings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ratings_rater")
                            .from(Ratings::Table, Ratings::RaterId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ratings_ratee")
                            .from(Ratings::Table, Ratings::RateeId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ratings_ride")
                            .from(Ratings::Table, Ratings::RideId)
                            .to(Rides::Table, Rides::Id),
                    )
                    .check(
                        Expr::col(Ratings::Score)
                            .gte(1)
                            .and(Expr::col(Ratings::Score).lte(5)),
                    )
                    .to_owned(),
            )
            .await?;

        // A rater scores a ratee at most once per shared ride.
        manager
            .create_index(
                Index::create()
                    .name("uq_ratings_rater_ratee_ride")
                    .table(Ratings::Table)
                    .col(Ratings::RaterId)
                    .col(Ratings::RateeId)
                    .col(Ratings::RideId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Ratings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Ratings {
    Table,
    Id,
    RaterId,
    RateeId,
    RideId,
    Score,
    CreatedAt,
}
