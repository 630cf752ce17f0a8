//! Create friendship table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Friendship::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Friendship::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Friendship::UserLowId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Friendship::UserHighId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Friendship::RequesterId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Friendship::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Friendship::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Friendship::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friendship_user_low")
                            .from(Friendship::Table, Friendship::UserLowId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friendship_user_high")
                            .from(Friendship::Table, Friendship::UserHighId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_low_id, user_high_id) - one edge per unordered pair.
        // The double-send race is settled here, not by application checks.
        manager
            .create_index(
                Index::create()
                    .name("idx_friendship_pair")
                    .table(Friendship::Table)
                    .col(Friendship::UserLowId)
                    .col(Friendship::UserHighId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_low_id (edge listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_friendship_user_low")
                    .table(Friendship::Table)
                    .col(Friendship::UserLowId)
                    .to_owned(),
            )
            .await?;

        // Index: user_high_id (edge listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_friendship_user_high")
                    .table(Friendship::Table)
                    .col(Friendship::UserHighId)
                    .to_owned(),
            )
            .await?;

        // Index: updated_at (stable listing order)
        manager
            .create_index(
                Index::create()
                    .name("idx_friendship_updated_at")
                    .table(Friendship::Table)
                    .col(Friendship::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Friendship::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Friendship {
    Table,
    Id,
    UserLowId,
    UserHighId,
    RequesterId,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
