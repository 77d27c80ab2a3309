pub mod accounts;
pub mod budgets;
pub mod currencies;
pub mod follows;
pub mod health;
pub mod images;
pub mod users;
