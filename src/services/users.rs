//! User lifecycle workflows: sign-up, sign-in, profile changes, deletion
//! and profile images.
//!
//! Each workflow owns its transaction. Store calls inside a workflow go
//! through the transaction handle only.

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use model::entities::{account::AccountType, user_image};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use store::{
    account::{AccountCreate, AccountDetails},
    user::{UserCreate, UserProfile, UserUpdate},
    StoreError,
};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::error::{ApiError, Result};
use crate::services::{auth::AuthService, file_storage::FileStorage};

/// Creates the account every new user starts with.
///
/// Runs inside the sign-up transaction, on a savepoint of its own.
#[async_trait]
pub trait AccountBootstrap: Send + Sync {
    async fn create_default_account(
        &self,
        txn: &DatabaseTransaction,
        owner: &UserProfile,
    ) -> store::Result<AccountDetails>;
}

/// A cash "Wallet" in the user's main currency.
pub struct WalletBootstrap;

#[async_trait]
impl AccountBootstrap for WalletBootstrap {
    async fn create_default_account(
        &self,
        txn: &DatabaseTransaction,
        owner: &UserProfile,
    ) -> store::Result<AccountDetails> {
        store::account::create_one(
            txn,
            owner.user.id,
            AccountCreate {
                name: "Wallet".to_string(),
                notes: Some(format!("Account in {}", owner.currency.name)),
                currency_id: owner.currency.id,
                account_type: AccountType::Cash,
            },
        )
        .await
    }
}

#[derive(Debug, Clone)]
pub struct SignUpData {
    pub name: String,
    pub email: String,
    pub password: String,
    pub currency_iso_code: String,
}

/// Outcome of a sign-up. The user exists either way; the default account
/// is best-effort.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub user: UserProfile,
    pub default_account_created: bool,
}

#[derive(Debug, Clone)]
pub struct SignIn {
    pub user: UserProfile,
    pub access_token: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// A single file taken from a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Bytes of a stored image and the content type to serve them with.
#[derive(Debug, Clone)]
pub struct ImageContent {
    pub content_type: String,
    pub data: Vec<u8>,
}

pub struct UserService {
    db: DatabaseConnection,
    auth: Arc<AuthService>,
    storage: Arc<FileStorage>,
    bootstrap: Arc<dyn AccountBootstrap>,
}

impl UserService {
    pub fn new(
        db: DatabaseConnection,
        auth: Arc<AuthService>,
        storage: Arc<FileStorage>,
        bootstrap: Arc<dyn AccountBootstrap>,
    ) -> Self {
        Self {
            db,
            auth,
            storage,
            bootstrap,
        }
    }

    /// Register a user and give them a default account.
    ///
    /// The unique email index decides duplicates, so concurrent sign-ups
    /// with one address cannot both succeed. Failing to create the default
    /// account rolls back only its savepoint.
    #[instrument(skip(self, data), fields(email = %data.email))]
    pub async fn sign_up(&self, data: SignUpData) -> Result<SignUp> {
        trace!("Entering sign_up");

        let password_hash = self.auth.hash_password(&data.password)?;
        let txn = self.db.begin().await?;

        let user = match store::user::create_one(
            &txn,
            UserCreate {
                name: data.name,
                email: data.email,
                currency_iso_code: data.currency_iso_code.clone(),
                password_hash,
            },
        )
        .await
        {
            Ok(user) => user,
            Err(StoreError::Duplicate(_)) => {
                warn!("Sign-up with an email that is already taken");
                txn.rollback().await?;
                return Err(ApiError::DuplicateEntity(
                    "Such email has already been taken".to_string(),
                ));
            }
            Err(StoreError::InvalidReference(_)) => {
                warn!("Sign-up with unknown currency {}", data.currency_iso_code);
                txn.rollback().await?;
                return Err(ApiError::InvalidData(format!(
                    "Unknown currency: {}",
                    data.currency_iso_code
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let default_account_created = self.bootstrap_account(&txn, &user).await;

        txn.commit().await?;
        info!(user_id = user.user.id, default_account_created, "User signed up");

        Ok(SignUp {
            user,
            default_account_created,
        })
    }

    async fn bootstrap_account(&self, txn: &DatabaseTransaction, user: &UserProfile) -> bool {
        let savepoint = match txn.begin().await {
            Ok(savepoint) => savepoint,
            Err(e) => {
                error!("Cannot open savepoint for default account: {}", e);
                return false;
            }
        };

        match self.bootstrap.create_default_account(&savepoint, user).await {
            Ok(details) => match savepoint.commit().await {
                Ok(()) => {
                    debug!(account_id = details.account.id, "Default account created");
                    true
                }
                Err(e) => {
                    error!("Cannot create default user account: {}", e);
                    false
                }
            },
            Err(e) => {
                error!("Cannot create default user account: {}", e);
                if let Err(e) = savepoint.rollback().await {
                    error!("Failed to roll back default account savepoint: {}", e);
                }
                false
            }
        }
    }

    /// Check credentials and issue an access token.
    ///
    /// Unknown email and wrong password fail the same way.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignIn> {
        trace!("Entering sign_in");
        let invalid = || ApiError::Authentication("Invalid email or password".to_string());

        let Some(user) = store::user::find_one_by_email(&self.db, email).await? else {
            self.auth.verify_against_dummy(password);
            warn!("Sign-in for unknown email");
            return Err(invalid());
        };

        if !self.auth.verify_password(password, &user.user.password_hash)? {
            warn!(user_id = user.user.id, "Sign-in with wrong password");
            return Err(invalid());
        }

        let access_token = self.auth.create_access_token(user.user.id)?;
        info!(user_id = user.user.id, "User signed in");
        Ok(SignIn { user, access_token })
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: i32) -> Result<UserProfile> {
        store::user::find_one(&self.db, user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("No such user was found".to_string()))
    }

    #[instrument(skip(self, update))]
    pub async fn update_user(&self, user_id: i32, update: ProfileUpdate) -> Result<UserProfile> {
        trace!("Entering update_user");

        let password_hash = match update.password {
            Some(password) => Some(self.auth.hash_password(&password)?),
            None => None,
        };

        let updated = store::user::update_one(
            &self.db,
            user_id,
            UserUpdate {
                name: update.name,
                password_hash,
            },
        )
        .await?;

        match updated {
            Some(user) => {
                info!("User updated");
                Ok(user)
            }
            None => {
                error!("Update returned no user entity");
                Err(ApiError::Internal("Cannot update user entity".to_string()))
            }
        }
    }

    /// Remove the user and everything they own in one transaction, then
    /// clean up their image files.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: i32) -> Result<()> {
        trace!("Entering delete_user");

        let images = store::user::find_images(&self.db, user_id).await?;

        let txn = self.db.begin().await?;
        store::user::delete_data(&txn, user_id).await?;
        if !store::user::delete_one(&txn, user_id).await? {
            txn.rollback().await?;
            return Err(ApiError::NotFound("No such user was found".to_string()));
        }
        txn.commit().await?;
        info!("User deleted");

        for image in images {
            if let Err(e) = self.storage.delete(&PathBuf::from(&image.file_path)).await {
                warn!("Failed to delete image file {}: {}", image.file_path, e);
            }
        }
        Ok(())
    }

    /// Store exactly one uploaded image for the user.
    #[instrument(skip(self, files), fields(files = files.len()))]
    pub async fn upload_image(
        &self,
        user_id: i32,
        mut files: Vec<UploadedFile>,
    ) -> Result<user_image::Model> {
        trace!("Entering upload_image");

        if files.len() != 1 {
            return Err(ApiError::InvalidData("Only 1 image is allowed".to_string()));
        }
        let file = files.remove(0);

        let path = self.storage.store(&file.file_name, &file.data).await?;
        let file_path = path.to_string_lossy();

        match store::user::create_image(&self.db, user_id, &file_path).await {
            Ok(image) => Ok(image),
            Err(e) => {
                // Leave no orphan behind when the row cannot be written
                if let Err(io) = self.storage.delete(&path).await {
                    warn!("Failed to remove orphan file {:?}: {}", path, io);
                }
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn list_images(&self, user_id: i32) -> Result<Vec<user_image::Model>> {
        Ok(store::user::find_images(&self.db, user_id).await?)
    }

    #[instrument(skip(self))]
    pub async fn download_image(&self, user_id: i32, image_id: i32) -> Result<ImageContent> {
        let image = self.find_image(user_id, image_id).await?;
        let path = PathBuf::from(&image.file_path);

        let data = self
            .storage
            .read(&path)
            .await?
            .ok_or_else(|| ApiError::NotFound("No such file was found".to_string()))?;

        let content_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .to_string();
        Ok(ImageContent { content_type, data })
    }

    /// The row is only removed once its file is gone.
    #[instrument(skip(self))]
    pub async fn delete_image(&self, user_id: i32, image_id: i32) -> Result<()> {
        trace!("Entering delete_image");
        let image = self.find_image(user_id, image_id).await?;

        if let Err(e) = self.storage.delete(&PathBuf::from(&image.file_path)).await {
            error!("Failed to delete image file {}: {}", image.file_path, e);
            return Err(e.into());
        }

        store::user::delete_image(&self.db, image.id).await?;
        info!("Image deleted");
        Ok(())
    }

    async fn find_image(&self, user_id: i32, image_id: i32) -> Result<user_image::Model> {
        store::user::find_image(&self.db, user_id, image_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("No such image was found".to_string()))
    }
}
