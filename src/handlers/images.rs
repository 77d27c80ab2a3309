use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use model::entities::user_image;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;

use crate::error::{ApiError, Result};
use crate::middleware::AuthenticatedUser;
use crate::schemas::{AppState, ErrorResponse};
use crate::services::users::UploadedFile;

/// Image response model
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImageResponse {
    pub id: i32,
    /// Stored file name
    pub file_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<user_image::Model> for ImageResponse {
    fn from(model: user_image::Model) -> Self {
        let file_name = std::path::Path::new(&model.file_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            id: model.id,
            file_name,
            created_at: model.created_at,
        }
    }
}

/// Collect every file part of a multipart body. Plain form fields are skipped.
pub async fn collect_files(mut multipart: Multipart) -> Result<Vec<UploadedFile>> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidData(format!("Malformed multipart body: {}", e)))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            trace!("Skipping non-file multipart field {:?}", field.name());
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidData(format!("Cannot read uploaded file: {}", e)))?;
        debug!("Received file part '{}' ({} bytes)", file_name, data.len());
        files.push(UploadedFile {
            file_name,
            data: data.to_vec(),
        });
    }
    Ok(files)
}

/// List the current user's images
#[utoipa::path(
    get,
    path = "/api/v1/users/me/images",
    tag = "images",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Images retrieved successfully", body = Vec<ImageResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_images(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ImageResponse>>> {
    let images = state.users.list_images(user.user_id()).await?;
    Ok(Json(images.into_iter().map(ImageResponse::from).collect()))
}

/// Upload a profile image
///
/// The multipart body must carry exactly one file part.
#[utoipa::path(
    post,
    path = "/api/v1/users/me/images",
    tag = "images",
    security(("bearer_auth" = [])),
    request_body(content = Vec<u8>, content_type = "multipart/form-data", description = "Exactly one image file"),
    responses(
        (status = 201, description = "Image uploaded", body = ImageResponse),
        (status = 400, description = "Zero or several files", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
#[instrument(skip(state, multipart))]
pub async fn upload_image(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ImageResponse>)> {
    trace!("Entering upload_image function");
    let files = collect_files(multipart).await?;
    let image = state.users.upload_image(user.user_id(), files).await?;
    info!("Image {} uploaded for user {}", image.id, user.user_id());
    Ok((StatusCode::CREATED, Json(image.into())))
}

/// Download an image
#[utoipa::path(
    get,
    path = "/api/v1/users/me/images/{image_id}",
    tag = "images",
    security(("bearer_auth" = [])),
    params(
        ("image_id" = i32, Path, description = "Image ID"),
    ),
    responses(
        (status = 200, description = "Image bytes", content_type = "application/octet-stream"),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn download_image(
    user: AuthenticatedUser,
    Path(image_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Response> {
    let content = state.users.download_image(user.user_id(), image_id).await?;
    Ok(([(header::CONTENT_TYPE, content.content_type)], content.data).into_response())
}

/// Delete an image
#[utoipa::path(
    delete,
    path = "/api/v1/users/me/images/{image_id}",
    tag = "images",
    security(("bearer_auth" = [])),
    params(
        ("image_id" = i32, Path, description = "Image ID"),
    ),
    responses(
        (status = 204, description = "Image deleted"),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_image(
    user: AuthenticatedUser,
    Path(image_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    match state.users.delete_image(user.user_id(), image_id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            warn!("Failed to delete image {}: {}", image_id, e);
            Err(e)
        }
    }
}
