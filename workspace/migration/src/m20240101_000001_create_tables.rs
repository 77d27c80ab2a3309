use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create currencies table (reference data, seeded separately)
        manager
            .create_table(
                Table::create()
                    .table(Currencies::Table)
                    .if_not_exists()
                    .col(pk_auto(Currencies::Id))
                    .col(string(Currencies::Name))
                    .col(string(Currencies::Area))
                    .col(string(Currencies::Symbol))
                    .col(string_len(Currencies::IsoCode, 3).unique_key())
                    .to_owned(),
            )
            .await?;

        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Name))
                    .col(string(Users::Email).unique_key())
                    .col(string(Users::PasswordHash))
                    .col(integer(Users::CurrencyId))
                    .col(timestamp_with_time_zone(Users::CreatedAt))
                    .col(timestamp_with_time_zone(Users::ModifiedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_currency")
                            .from(Users::Table, Users::CurrencyId)
                            .to(Currencies::Table, Currencies::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create accounts table
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(pk_auto(Accounts::Id))
                    .col(integer(Accounts::UserId))
                    .col(integer(Accounts::CurrencyId))
                    .col(string(Accounts::Name))
                    .col(string_null(Accounts::Notes))
                    .col(string_len(Accounts::AccountType, 20))
                    .col(timestamp_with_time_zone(Accounts::CreatedAt))
                    .col(timestamp_with_time_zone(Accounts::ModifiedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_user")
                            .from(Accounts::Table, Accounts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_currency")
                            .from(Accounts::Table, Accounts::CurrencyId)
                            .to(Currencies::Table, Currencies::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_accounts_user_name")
                    .table(Accounts::Table)
                    .col(Accounts::UserId)
                    .col(Accounts::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create follows table
        manager
            .create_table(
                Table::create()
                    .table(Follows::Table)
                    .if_not_exists()
                    .col(pk_auto(Follows::Id))
                    .col(integer(Follows::FollowerId))
                    .col(integer(Follows::FollowedId))
                    .col(string_len(Follows::State, 10))
                    .col(timestamp_with_time_zone(Follows::CreatedAt))
                    .col(timestamp_with_time_zone(Follows::ModifiedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follow_follower")
                            .from(Follows::Table, Follows::FollowerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follow_followed")
                            .from(Follows::Table, Follows::FollowedId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_follows_pair")
                    .table(Follows::Table)
                    .col(Follows::FollowerId)
                    .col(Follows::FollowedId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create user_images table
        manager
            .create_table(
                Table::create()
                    .table(UserImages::Table)
                    .if_not_exists()
                    .col(pk_auto(UserImages::Id))
                    .col(integer(UserImages::UserId))
                    .col(string(UserImages::FilePath))
                    .col(timestamp_with_time_zone(UserImages::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_image_user")
                            .from(UserImages::Table, UserImages::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create imports table
        manager
            .create_table(
                Table::create()
                    .table(Imports::Table)
                    .if_not_exists()
                    .col(pk_auto(Imports::Id))
                    .col(integer(Imports::UserId))
                    .col(integer(Imports::AccountId))
                    .col(string(Imports::FileName))
                    .col(timestamp_with_time_zone(Imports::ImportedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_import_user")
                            .from(Imports::Table, Imports::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_import_account")
                            .from(Imports::Table, Imports::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create import_rules table
        manager
            .create_table(
                Table::create()
                    .table(ImportRules::Table)
                    .if_not_exists()
                    .col(pk_auto(ImportRules::Id))
                    .col(integer(ImportRules::UserId))
                    .col(string(ImportRules::Name))
                    .col(string(ImportRules::Keyword))
                    .col(timestamp_with_time_zone(ImportRules::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_import_rule_user")
                            .from(ImportRules::Table, ImportRules::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create operations table
        manager
            .create_table(
                Table::create()
                    .table(Operations::Table)
                    .if_not_exists()
                    .col(pk_auto(Operations::Id))
                    .col(integer(Operations::UserId))
                    .col(integer(Operations::AccountId))
                    .col(integer_null(Operations::ImportId))
                    .col(string(Operations::Description))
                    .col(decimal(Operations::Amount).decimal_len(16, 4))
                    .col(date(Operations::Date))
                    .col(timestamp_with_time_zone(Operations::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_operation_user")
                            .from(Operations::Table, Operations::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_operation_account")
                            .from(Operations::Table, Operations::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_operation_import")
                            .from(Operations::Table, Operations::ImportId)
                            .to(Imports::Table, Imports::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create budgets table
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(pk_auto(Budgets::Id))
                    .col(integer(Budgets::UserId))
                    .col(integer(Budgets::CurrencyId))
                    .col(string(Budgets::Name))
                    .col(decimal(Budgets::LimitAmount).decimal_len(16, 4))
                    .col(timestamp_with_time_zone(Budgets::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budget_user")
                            .from(Budgets::Table, Budgets::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budget_currency")
                            .from(Budgets::Table, Budgets::CurrencyId)
                            .to(Currencies::Table, Currencies::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create budget_accounts table (join table)
        manager
            .create_table(
                Table::create()
                    .table(BudgetAccounts::Table)
                    .if_not_exists()
                    .col(integer(BudgetAccounts::BudgetId))
                    .col(integer(BudgetAccounts::AccountId))
                    .primary_key(
                        Index::create()
                            .name("pk_budget_accounts")
                            .col(BudgetAccounts::BudgetId)
                            .col(BudgetAccounts::AccountId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budget_accounts_budget")
                            .from(BudgetAccounts::Table, BudgetAccounts::BudgetId)
                            .to(Budgets::Table, Budgets::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budget_accounts_account")
                            .from(BudgetAccounts::Table, BudgetAccounts::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create periodic_budgets table
        manager
            .create_table(
                Table::create()
                    .table(PeriodicBudgets::Table)
                    .if_not_exists()
                    .col(pk_auto(PeriodicBudgets::Id))
                    .col(integer(PeriodicBudgets::UserId))
                    .col(string(PeriodicBudgets::Name))
                    .col(string_len(PeriodicBudgets::Period, 10))
                    .col(decimal(PeriodicBudgets::LimitAmount).decimal_len(16, 4))
                    .col(timestamp_with_time_zone(PeriodicBudgets::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_periodic_budget_user")
                            .from(PeriodicBudgets::Table, PeriodicBudgets::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order to avoid foreign key constraints
        manager
            .drop_table(Table::drop().table(PeriodicBudgets::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(BudgetAccounts::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Budgets::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Operations::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ImportRules::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Imports::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UserImages::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Follows::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Currencies::Table).to_owned())
            .await?;

        Ok(())
    }
}

// Define identifiers for all tables

#[derive(DeriveIden)]
pub(crate) enum Currencies {
    Table,
    Id,
    Name,
    Area,
    Symbol,
    IsoCode,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    CurrencyId,
    CreatedAt,
    ModifiedAt,
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    UserId,
    CurrencyId,
    Name,
    Notes,
    AccountType,
    CreatedAt,
    ModifiedAt,
}

#[derive(DeriveIden)]
enum Follows {
    Table,
    Id,
    FollowerId,
    FollowedId,
    State,
    CreatedAt,
    ModifiedAt,
}

#[derive(DeriveIden)]
enum UserImages {
    Table,
    Id,
    UserId,
    FilePath,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Imports {
    Table,
    Id,
    UserId,
    AccountId,
    FileName,
    ImportedAt,
}

#[derive(DeriveIden)]
enum ImportRules {
    Table,
    Id,
    UserId,
    Name,
    Keyword,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Operations {
    Table,
    Id,
    UserId,
    AccountId,
    ImportId,
    Description,
    Amount,
    Date,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Budgets {
    Table,
    Id,
    UserId,
    CurrencyId,
    Name,
    LimitAmount,
    CreatedAt,
}

#[derive(DeriveIden)]
enum BudgetAccounts {
    Table,
    BudgetId,
    AccountId,
}

#[derive(DeriveIden)]
enum PeriodicBudgets {
    Table,
    Id,
    UserId,
    Name,
    Period,
    LimitAmount,
    CreatedAt,
}
