//! Indexes backing the per-user ledger reads and aggregations.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Entries {
    Table,
    UserId,
    Kind,
    CategoryId,
    OccurredOn,
}

#[derive(Iden)]
enum Categories {
    Table,
    OwnerId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx-entries-user_id-kind-occurred_on")
                    .table(Entries::Table)
                    .col(Entries::UserId)
                    .col(Entries::Kind)
                    .col(Entries::OccurredOn)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-entries-category_id")
                    .table(Entries::Table)
                    .col(Entries::CategoryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-owner_id")
                    .table(Categories::Table)
                    .col(Categories::OwnerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table) in [
            ("idx-entries-user_id-kind-occurred_on", Entries::Table.into_iden()),
            ("idx-entries-category_id", Entries::Table.into_iden()),
            ("idx-categories-owner_id", Categories::Table.into_iden()),
        ] {
            manager
                .drop_index(Index::drop().name(name).table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}
