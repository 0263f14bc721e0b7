//! Business registry route handlers.
//!
//! Create/update accept `multipart/form-data` so a logo can ride along with
//! the text fields. Logo files are written before the row so a failed upload
//! never leaves a row pointing at nothing; if the row write fails instead,
//! the fresh file is removed.

use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use shopmate_core::BusinessId;

use crate::db::businesses::{BusinessRepository, CreateBusiness, UpdateBusiness};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, RequireSeller};
use crate::models::Business;
use crate::response::{ApiResponse, Created};
use crate::routes::forms::ParsedForm;
use crate::services::UploadKind;
use crate::state::AppState;

/// Minimum business name length after trimming.
const MIN_NAME_LENGTH: usize = 2;

/// Register a new business for the calling seller.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let form = ParsedForm::read(multipart, "logo").await?;

    let name = form.required_text("name")?;
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "Business name must be at least {MIN_NAME_LENGTH} characters"
        )));
    }

    let logo_url = match &form.file {
        Some(file) => Some(
            state
                .uploads()
                .save(UploadKind::BusinessLogo, file.file_name.as_deref(), &file.data)
                .await?,
        ),
        None => None,
    };

    let result = BusinessRepository::new(state.pool())
        .create(CreateBusiness {
            name,
            description: form.text("description"),
            address: form.text("address"),
            owner_contact: form.text("ownerContact"),
            owner_id: user.id,
            logo_url: logo_url.clone(),
        })
        .await;

    match result {
        Ok(business) => Ok(Created(ApiResponse::data(business))),
        Err(e) => {
            if let Some(url) = &logo_url {
                state.uploads().remove(url).await;
            }
            Err(e.into())
        }
    }
}

/// The calling seller's businesses with product and order counts.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
) -> Result<impl IntoResponse> {
    let businesses = BusinessRepository::new(state.pool())
        .list_by_owner(user.id)
        .await?;

    Ok(ApiResponse::data(businesses))
}

/// One business with its products and order count. Any authenticated user
/// may look.
#[instrument(skip_all, fields(business_id = %id))]
pub async fn get(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<BusinessId>,
) -> Result<impl IntoResponse> {
    let detail = BusinessRepository::new(state.pool())
        .get_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Business not found".to_owned()))?;

    Ok(ApiResponse::data(detail))
}

/// Update a business. Only provided fields change; a new logo replaces (and
/// deletes) the old file.
#[instrument(skip_all, fields(user_id = %user.id, business_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    Path(id): Path<BusinessId>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let repo = BusinessRepository::new(state.pool());
    let existing = owned_business(&repo, id, &user).await?;

    let form = ParsedForm::read(multipart, "logo").await?;
    if let Some(name) = form.text("name")
        && name.chars().count() < MIN_NAME_LENGTH
    {
        return Err(AppError::Validation(format!(
            "Business name must be at least {MIN_NAME_LENGTH} characters"
        )));
    }

    let new_logo_url = match &form.file {
        Some(file) => Some(
            state
                .uploads()
                .save(UploadKind::BusinessLogo, file.file_name.as_deref(), &file.data)
                .await?,
        ),
        None => None,
    };

    let result = repo
        .update(
            id,
            UpdateBusiness {
                name: form.text("name"),
                description: form.text("description"),
                address: form.text("address"),
                owner_contact: form.text("ownerContact"),
                logo_url: new_logo_url.clone(),
            },
        )
        .await;

    match result {
        Ok(business) => {
            if new_logo_url.is_some()
                && let Some(old) = &existing.logo_url
            {
                state.uploads().remove(old).await;
            }
            Ok(ApiResponse::data(business))
        }
        Err(e) => {
            if let Some(url) = &new_logo_url {
                state.uploads().remove(url).await;
            }
            Err(e.into())
        }
    }
}

/// Delete a business. Refused with 409 while products still reference it.
#[instrument(skip_all, fields(user_id = %user.id, business_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    Path(id): Path<BusinessId>,
) -> Result<impl IntoResponse> {
    let repo = BusinessRepository::new(state.pool());
    let existing = owned_business(&repo, id, &user).await?;

    if repo.product_count(id).await? > 0 {
        return Err(AppError::Conflict(
            "Business still has products; delete them first".to_owned(),
        ));
    }

    // The RESTRICT foreign keys back this check up against races.
    repo.delete(id).await.map_err(|e| match e {
        crate::db::RepositoryError::Conflict(_) => AppError::Conflict(
            "Business still has products; delete them first".to_owned(),
        ),
        other => other.into(),
    })?;

    if let Some(logo) = &existing.logo_url {
        state.uploads().remove(logo).await;
    }

    Ok(ApiResponse::message("business deleted"))
}

/// Fetch a business and verify the caller owns it.
async fn owned_business(
    repo: &BusinessRepository<'_>,
    id: BusinessId,
    user: &crate::models::User,
) -> Result<Business> {
    let business = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Business not found".to_owned()))?;

    if business.owner_id != user.id {
        return Err(AppError::Forbidden(
            "You do not own this business".to_owned(),
        ));
    }

    Ok(business)
}
