//! Create local_access_infos table (inbound tokens)

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_remote_parties::RemoteParties;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LocalAccessInfos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LocalAccessInfos::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LocalAccessInfos::RemotePartyId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LocalAccessInfos::Token)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(LocalAccessInfos::Status)
                            .string_len(16)
                            .not_null()
                            .default("ALLOWED"),
                    )
                    .col(
                        ColumnDef::new(LocalAccessInfos::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_local_access_infos_remote_party")
                            .from(LocalAccessInfos::Table, LocalAccessInfos::RemotePartyId)
                            .to(RemoteParties::Table, RemoteParties::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LocalAccessInfos::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum LocalAccessInfos {
    Table,
    Id,
    RemotePartyId,
    Token,
    Status,
    CreatedAt,
}
