//! Persistence access for every entity family.
//!
//! Each module is a set of free functions generic over
//! [`sea_orm::ConnectionTrait`], so the same call works on a plain
//! connection, a transaction or a savepoint. The caller owns transaction
//! boundaries.

pub mod account;
pub mod budget;
pub mod currency;
pub mod error;
pub mod follow;
pub mod import;
pub mod operation;
pub mod user;

pub use error::{Result, StoreError};

#[cfg(test)]
pub(crate) mod test_utils {
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectionTrait, Database, DatabaseConnection};

    use crate::user::{self, UserCreate, UserProfile};

    pub async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to test database");
        db.execute_unprepared("PRAGMA foreign_keys = ON;")
            .await
            .expect("Failed to enable foreign keys");
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
        db
    }

    /// Creates a USD user whose name is the local part of the email.
    pub async fn create_user(db: &DatabaseConnection, email: &str) -> UserProfile {
        let name = email.split('@').next().unwrap_or(email).to_string();
        user::create_one(
            db,
            UserCreate {
                name,
                email: email.to_string(),
                currency_iso_code: "USD".to_string(),
                password_hash: "hash".to_string(),
            },
        )
        .await
        .expect("Failed to create test user")
    }
}
