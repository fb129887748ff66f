//! Account Service - registration, sign-in, guest access and cancellation

use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::auth::{hash_password, verify_password};
use crate::domain::validation::{self, TAKEN, ValidationErrors};
use crate::domain::{DomainError, NewUser, ROLE_GUEST, ROLE_USER, User, UserRepository};
use crate::infrastructure::storage::DiskStorage;

pub const GUEST_EMAIL: &str = "guest@example.com";
pub const GUEST_NAME: &str = "guestuser";

/// Sign-up form
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

/// The guest account's name is never available to regular accounts
pub fn is_reserved_name(name: &str) -> bool {
    name == GUEST_NAME
}

fn hash(password: &str) -> Result<String, DomainError> {
    hash_password(password).map_err(DomainError::Internal)
}

/// Validate a sign-up form and create the account
pub async fn register(users: &dyn UserRepository, form: Registration) -> Result<User, DomainError> {
    let mut errors = ValidationErrors::default();

    validation::validate_name(&mut errors, &form.name);
    if errors.get("name").is_none()
        && (is_reserved_name(&form.name) || users.name_taken(&form.name, None).await?)
    {
        errors.add("name", TAKEN);
    }
    validation::validate_email(&mut errors, &form.email);
    if errors.get("email").is_none()
        && (form.email.eq_ignore_ascii_case(GUEST_EMAIL) || users.email_taken(&form.email).await?)
    {
        errors.add("email", TAKEN);
    }
    validation::validate_password(&mut errors, &form.password, &form.password_confirmation);

    errors.into_result().map_err(DomainError::Validation)?;

    let user = users
        .create(NewUser {
            name: form.name,
            email: form.email,
            password_hash: hash(&form.password)?,
            role: ROLE_USER.to_string(),
        })
        .await?;

    tracing::info!("Registered user {} ({})", user.id, user.name);
    Ok(user)
}

/// `Ok(None)` for an unknown email or a wrong password
pub async fn authenticate(
    users: &dyn UserRepository,
    email: &str,
    password: &str,
) -> Result<Option<User>, DomainError> {
    let Some(credentials) = users.find_credentials(email).await? else {
        return Ok(None);
    };

    match verify_password(password, &credentials.password_hash) {
        Ok(true) => Ok(Some(credentials.user)),
        Ok(false) => Ok(None),
        Err(e) => {
            tracing::error!("Stored hash for user {} is unreadable: {}", credentials.user.id, e);
            Ok(None)
        }
    }
}

/// Find or create the shared guest account
pub async fn guest_user(users: &dyn UserRepository) -> Result<User, DomainError> {
    if let Some(existing) = find_guest(users).await? {
        return Ok(existing);
    }

    let password: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect();

    let created = users
        .create(NewUser {
            name: GUEST_NAME.to_string(),
            email: GUEST_EMAIL.to_string(),
            password_hash: hash(&password)?,
            role: ROLE_GUEST.to_string(),
        })
        .await;

    match created {
        Ok(user) => {
            tracing::info!("Created guest account {}", user.id);
            Ok(user)
        }
        // Another request created it first
        Err(DomainError::Validation(_)) => find_guest(users)
            .await?
            .ok_or_else(|| DomainError::Internal("guest account name is taken".to_string())),
        Err(e) => Err(e),
    }
}

/// The guest row, only if it really carries the guest role
async fn find_guest(users: &dyn UserRepository) -> Result<Option<User>, DomainError> {
    match users.find_credentials(GUEST_EMAIL).await? {
        Some(credentials) if credentials.user.is_guest() => Ok(Some(credentials.user)),
        Some(credentials) => {
            tracing::error!(
                "Guest email is held by regular account {}",
                credentials.user.id
            );
            Err(DomainError::Internal(
                "guest account email is taken".to_string(),
            ))
        }
        None => Ok(None),
    }
}

/// Delete an account with everything it owns, then its profile image
pub async fn cancel_account(
    users: &dyn UserRepository,
    storage: &DiskStorage,
    user: &User,
) -> Result<(), DomainError> {
    users.delete(user.id).await?;

    if let Some(key) = &user.profile_image
        && let Err(e) = storage.delete(key).await
    {
        tracing::error!("Failed to delete profile image {}: {}", key, e);
    }

    tracing::info!("User {} cancelled their account", user.id);
    Ok(())
}
