pub mod accounts;
pub mod auth;
pub mod budgets;
pub mod currencies;
pub mod file_storage;
pub mod follows;
pub mod users;
