//! This file serves as the root for all SeaORM entity modules.
//! The user is the root of the ownership tree; currencies are shared
//! reference data that nothing owns.

pub mod account;
pub mod budget;
pub mod budget_account;
pub mod currency;
pub mod follow;
pub mod import;
pub mod import_rule;
pub mod operation;
pub mod periodic_budget;
pub mod user;
pub mod user_image;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::account::Entity as Account;
    pub use super::budget::Entity as Budget;
    pub use super::budget_account::Entity as BudgetAccount;
    pub use super::currency::Entity as Currency;
    pub use super::follow::Entity as Follow;
    pub use super::import::Entity as Import;
    pub use super::import_rule::Entity as ImportRule;
    pub use super::operation::Entity as Operation;
    pub use super::periodic_budget::Entity as PeriodicBudget;
    pub use super::user::Entity as User;
    pub use super::user_image::Entity as UserImage;
}
