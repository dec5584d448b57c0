//! Create remote_access_infos table (outbound tokens)

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
                    .table(RemoteAccessInfos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RemoteAccessInfos::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RemoteAccessInfos::RemotePartyId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RemoteAccessInfos::Token).string().not_null())
                    .col(ColumnDef::new(RemoteAccessInfos::VersionsUrl).string())
                    .col(ColumnDef::new(RemoteAccessInfos::Version).string_len(8))
                    .col(ColumnDef::new(RemoteAccessInfos::CredentialsUrl).string())
                    .col(
                        ColumnDef::new(RemoteAccessInfos::Status)
                            .string_len(16)
                            .not_null()
                            .default("NONE"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_remote_access_infos_remote_party")
                            .from(RemoteAccessInfos::Table, RemoteAccessInfos::RemotePartyId)
                            .to(RemoteParties::Table, RemoteParties::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RemoteAccessInfos::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum RemoteAccessInfos {
    Table,
    Id,
    RemotePartyId,
    Token,
    VersionsUrl,
    Version,
    CredentialsUrl,
    Status,
}
