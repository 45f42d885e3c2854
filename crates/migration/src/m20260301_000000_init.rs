//! Initial schema:
//!
//! - `users`: accounts synced from the identity provider
//! - `categories`: private categories (`owner_id` set) and global defaults
//!   (`owner_id` NULL, `owner_key = 'global'`)
//! - `entries`: income and expense ledger, discriminated by `kind`

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Id,
    ExternalId,
    Email,
    DisplayName,
    AvatarUrl,
    Currency,
    MonthlyBudgetMinor,
    IsAdmin,
    CreatedAt,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    OwnerId,
    OwnerKey,
    Name,
    NameNorm,
    Kind,
    Color,
    Icon,
    CreatedAt,
}

#[derive(Iden)]
enum Entries {
    Table,
    Id,
    UserId,
    Kind,
    CategoryId,
    CategoryName,
    AmountMinor,
    Currency,
    OccurredOn,
    Icon,
    Note,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Users::ExternalId).string().unique_key())
                    .col(ColumnDef::new(Users::Email).string())
                    .col(ColumnDef::new(Users::DisplayName).string())
                    .col(ColumnDef::new(Users::AvatarUrl).string())
                    .col(
                        ColumnDef::new(Users::Currency)
                            .string()
                            .not_null()
                            .default("USD"),
                    )
                    .col(ColumnDef::new(Users::MonthlyBudgetMinor).big_integer())
                    .col(
                        ColumnDef::new(Users::IsAdmin)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::OwnerId).blob())
                    .col(ColumnDef::new(Categories::OwnerKey).string().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::NameNorm).string().not_null())
                    .col(ColumnDef::new(Categories::Kind).string().not_null())
                    .col(ColumnDef::new(Categories::Color).string())
                    .col(ColumnDef::new(Categories::Icon).string())
                    .col(ColumnDef::new(Categories::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-categories-owner_id")
                            .from(Categories::Table, Categories::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One category per (owner, kind, normalised name); global defaults
        // share the 'global' owner key so they are covered too.
        manager
            .create_index(
                Index::create()
                    .name("idx-categories-owner_key-kind-name_norm-unique")
                    .table(Categories::Table)
                    .col(Categories::OwnerKey)
                    .col(Categories::Kind)
                    .col(Categories::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Entries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Entries::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Entries::UserId).blob().not_null())
                    .col(ColumnDef::new(Entries::Kind).string().not_null())
                    .col(ColumnDef::new(Entries::CategoryId).blob())
                    .col(ColumnDef::new(Entries::CategoryName).string())
                    .col(ColumnDef::new(Entries::AmountMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(Entries::Currency)
                            .string()
                            .not_null()
                            .default("USD"),
                    )
                    .col(ColumnDef::new(Entries::OccurredOn).date().not_null())
                    .col(ColumnDef::new(Entries::Icon).string())
                    .col(ColumnDef::new(Entries::Note).string())
                    .col(ColumnDef::new(Entries::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-entries-user_id")
                            .from(Entries::Table, Entries::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-entries-category_id")
                            .from(Entries::Table, Entries::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Entries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
