use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Rides::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Rides::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Rides::DriverId).uuid().not_null())
                    .col(ColumnDef::new(Rides::StartLocation).string().not_null())
                    .col(ColumnDef::new(Rides::Destination).string().not_null())
                    .col(ColumnDef::new(Rides::Date).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Rides::Time).string_len(5).not_null())
                    .col(ColumnDef::new(Rides::EtaHours).double().not_null())
                    .col(ColumnDef::new(Rides::AvailableSeats).integer().not_null())
                    .col(ColumnDef::new(Rides::Price).double().not_null())
                    .col(ColumnDef::new(Rides::Description).text())
                    .col(
                        ColumnDef::new(Rides::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Rides::Vehicle).json_binary())
                    .col(ColumnDef::new(Rides::PickupPoints).json_binary().not_null())
                    .col(ColumnDef::new(Rides::Restrictions).json_binary().not_null())
                    .col(ColumnDef::new(Rides::Active).boolean().not_null().default(true))
                    .col(ColumnDef::new(Rides::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Rides::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rides_driver")
                            .from(Rides::Table, Rides::DriverId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rides_search")
                    .table(Rides::Table)
                    .col(Rides::Status)
                    .col(Rides::Active)
                    .col(Rides::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rides_driver")
                    .table(Rides::Table)
                    .col(Rides::DriverId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RideBookings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RideBookings::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(RideBookings::RideId).uuid().not_null())
                    .col(ColumnDef::new(RideBookings::UserId).uuid().not_null())
                    .col(ColumnDef::new(RideBookings::Seats).integer().not_null())
                    .col(
                        ColumnDef::new(RideBookings::BookedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ride_bookings_ride")
                            .from(RideBookings::Table, RideBookings::RideId)
                            .to(Rides::Table, Rides::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ride_bookings_user")
                            .from(RideBookings::Table, RideBookings::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // One booking per passenger per ride.
        manager
            .create_index(
                Index::create()
                    .name("uq_ride_bookings_ride_user")
                    .table(RideBookings::Table)
                    .col(RideBookings::RideId)
                    .col(RideBookings::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ride_bookings_user")
                    .table(RideBookings::Table)
                    .col(RideBookings::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RideBookings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Rides::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Rides {
    Table,
    Id,
    DriverId,
    StartLocation,
    Destination,
    Date,
    Time,
    EtaHours,
    AvailableSeats,
    Price,
    Description,
    Status,
    Vehicle,
    PickupPoints,
    Restrictions,
    Active,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RideBookings {
    Table,
    Id,
    RideId,
    UserId,
    Seats,
    BookedAt,
}
