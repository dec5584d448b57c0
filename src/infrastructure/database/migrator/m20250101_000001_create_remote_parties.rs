//! Create remote_parties table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RemoteParties::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RemoteParties::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RemoteParties::CountryCode).string_len(2).not_null())
                    .col(ColumnDef::new(RemoteParties::PartyId).string_len(3).not_null())
                    .col(ColumnDef::new(RemoteParties::Role).string_len(8).not_null())
                    .col(ColumnDef::new(RemoteParties::Name).string().not_null())
                    .col(ColumnDef::new(RemoteParties::Website).string())
                    .col(
                        ColumnDef::new(RemoteParties::Status)
                            .string_len(16)
                            .not_null()
                            .default("ENABLED"),
                    )
                    .col(
                        ColumnDef::new(RemoteParties::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RemoteParties::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // One record per identity
        manager
            .create_index(
                Index::create()
                    .name("idx_remote_parties_identity")
                    .table(RemoteParties::Table)
                    .col(RemoteParties::CountryCode)
                    .col(RemoteParties::PartyId)
                    .col(RemoteParties::Role)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RemoteParties::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum RemoteParties {
    Table,
    Id,
    CountryCode,
    PartyId,
    Role,
    Name,
    Website,
    Status,
    CreatedAt,
    UpdatedAt,
}
