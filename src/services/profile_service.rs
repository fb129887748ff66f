//! Profile Service - allow-listed profile updates
//!
//! Only `name`, `introduction` and `profile_image` can change through here.

use crate::domain::validation::{self, TAKEN, ValidationErrors};
use crate::domain::{DomainError, ProfileChanges, User, UserRepository};
use crate::infrastructure::storage::DiskStorage;
use crate::services::{account_service, image_service};

/// Submitted profile form. Absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub name: Option<String>,
    pub introduction: Option<String>,
    pub profile_image: Option<Vec<u8>>,
}

/// Validate and apply a profile form. On any validation failure nothing is
/// written, neither to the database nor to storage.
pub async fn update_profile(
    users: &dyn UserRepository,
    storage: &DiskStorage,
    user_id: i32,
    form: ProfileForm,
) -> Result<User, DomainError> {
    let existing = users
        .find_by_id(user_id)
        .await?
        .ok_or(DomainError::NotFound)?;

    let mut errors = ValidationErrors::default();

    if let Some(name) = &form.name {
        validation::validate_name(&mut errors, name);
        let reserved = !existing.is_guest() && account_service::is_reserved_name(name);
        if errors.get("name").is_none()
            && (reserved || users.name_taken(name, Some(user_id)).await?)
        {
            errors.add("name", TAKEN);
        }
    }
    validation::validate_introduction(&mut errors, form.introduction.as_deref());
    if let Some(bytes) = form.profile_image.as_deref().filter(|b| !b.is_empty()) {
        image_service::validate_upload(&mut errors, bytes);
    }

    if let Err(errors) = errors.into_result() {
        tracing::warn!("Profile update for user {} rejected: {}", user_id, errors);
        return Err(DomainError::Validation(errors));
    }

    let new_image = match form.profile_image.as_deref() {
        Some(bytes) if !bytes.is_empty() => Some(image_service::store_upload(storage, bytes).await?),
        _ => None,
    };

    let changes = ProfileChanges {
        name: form.name,
        introduction: form
            .introduction
            .map(|intro| Some(intro).filter(|i| !i.is_empty())),
        profile_image: new_image.clone().map(Some),
    };

    let updated = match users.update_profile(user_id, changes).await {
        Ok(user) => user,
        Err(e) => {
            if let Some(key) = &new_image
                && let Err(cleanup) = storage.delete(key).await
            {
                tracing::error!("Failed to delete unused profile image {}: {}", key, cleanup);
            }
            return Err(e);
        }
    };

    // The replaced blob is no longer referenced
    if new_image.is_some()
        && let Some(old_key) = &existing.profile_image
        && let Err(e) = storage.delete(old_key).await
    {
        tracing::error!("Failed to delete replaced profile image {}: {}", old_key, e);
    }

    tracing::info!("User {} updated their profile", user_id);
    Ok(updated)
}
