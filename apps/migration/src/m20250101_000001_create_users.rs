use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Name).string_len(50).not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::Phone).string_len(16).not_null())
                    .col(ColumnDef::new(Users::IsDriver).boolean().not_null().default(false))
                    .col(ColumnDef::new(Users::Vehicle).json_binary())
                    .col(ColumnDef::new(Users::Role).string_len(16).not_null().default("user"))
                    .col(ColumnDef::new(Users::Rating).double().not_null().default(0.0))
                    .col(ColumnDef::new(Users::TotalRides).integer().not_null().default(0))
                    .col(ColumnDef::new(Users::Active).boolean().not_null().default(true))
                    .col(ColumnDef::new(Users::PushSubscription).json_binary())
                    .col(ColumnDef::new(Users::PasswordResetToken).string())
                    .col(ColumnDef::new(Users::PasswordResetExpires).timestamp_with_time_zone())
                    .col(ColumnDef::new(Users::PasswordChangedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_reset_token")
                    .table(Users::Table)
                    .col(Users::PasswordResetToken)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Users {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    Phone,
    IsDriver,
    Vehicle,
    Role,
    Rating,
    TotalRides,
    Active,
    PushSubscription,
    PasswordResetToken,
    PasswordResetExpires,
    PasswordChangedAt,
    CreatedAt,
    UpdatedAt,
}
