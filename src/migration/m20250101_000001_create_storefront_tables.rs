// ABOUTME: Initial migration creating principals, profiles, role assignments, orders, and tickets
// ABOUTME: Profiles and roles cascade with their principal; orders and tickets outlive it

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Principals::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Principals::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Principals::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Principals::Username).string().not_null().unique_key())
                    .col(ColumnDef::new(Principals::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Principals::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Profiles::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Profiles::UserId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(Profiles::Username).string().not_null())
                    .col(ColumnDef::new(Profiles::Email).string().not_null())
                    .col(ColumnDef::new(Profiles::Blocked).boolean().not_null().default(false))
                    .col(ColumnDef::new(Profiles::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_profiles_user_id")
                            .from(Profiles::Table, Profiles::UserId)
                            .to(Principals::Table, Principals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RoleAssignments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RoleAssignments::UserId).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(RoleAssignments::Role)
                            .string_len(16)
                            .not_null()
                            .default("user"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_assignments_user_id")
                            .from(RoleAssignments::Table, RoleAssignments::UserId)
                            .to(Principals::Table, Principals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orders::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Orders::UserId).uuid().not_null())
                    .col(ColumnDef::new(Orders::PackageName).string().not_null())
                    .col(ColumnDef::new(Orders::PackagePrice).big_integer().not_null())
                    .col(ColumnDef::new(Orders::DomainName).string().not_null())
                    .col(ColumnDef::new(Orders::PaymentProof).string())
                    .col(
                        ColumnDef::new(Orders::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Orders::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Orders::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_user_id")
                    .table(Orders::Table)
                    .col(Orders::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tickets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tickets::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tickets::UserId).uuid().not_null())
                    .col(ColumnDef::new(Tickets::Subject).string().not_null())
                    .col(ColumnDef::new(Tickets::Message).text().not_null())
                    .col(
                        ColumnDef::new(Tickets::Status)
                            .string_len(16)
                            .not_null()
                            .default("open"),
                    )
                    .col(ColumnDef::new(Tickets::AdminReply).text())
                    .col(ColumnDef::new(Tickets::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Tickets::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tickets_user_id")
                    .table(Tickets::Table)
                    .col(Tickets::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tickets::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(RoleAssignments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Principals::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Principals {
    Table,
    Id,
    Email,
    Username,
    PasswordHash,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
    UserId,
    Username,
    Email,
    Blocked,
    CreatedAt,
}

#[derive(DeriveIden)]
enum RoleAssignments {
    Table,
    UserId,
    Role,
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    UserId,
    PackageName,
    PackagePrice,
    DomainName,
    PaymentProof,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tickets {
    Table,
    Id,
    UserId,
    Subject,
    Message,
    Status,
    AdminReply,
    CreatedAt,
    UpdatedAt,
}
