use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    ai::{background_prompt, ContentGenerator, BACKGROUND_SYSTEM_PROMPT},
    assets::{AssetRef, AssetStore, StoreError},
    auth::AuthUser,
    error::{ApiError, ApiResult},
    imaging,
    projects::{
        dto::{
            externalize_opt, ContentGenerateRequest, CreateProjectRequest, DeleteResponse,
            GenerateBackgroundRequest, GeneratedContentResponse, ProcessedImageResponse,
            ProjectResponse, UpdateProjectRequest, UploadResponse,
        },
        repo::Project,
    },
    state::AppState,
};

const PROJECT_NOT_FOUND: &str = "Project not found";
// Transforms before any upload look exactly like a missing project.
const PROJECT_OR_IMAGE_NOT_FOUND: &str = "Project or image not found";

pub fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/projects", post(create_project).get(list_projects))
        .route("/projects/:id", get(get_project))
        .route("/projects/:id", put(update_project))
        .route("/projects/:id", delete(delete_project))
}

pub fn image_routes() -> Router<AppState> {
    Router::new()
        .route("/image/upload/:project_id", post(upload_image))
        .route("/image/remove-background/:project_id", post(remove_background))
        .route("/image/generate-background", post(generate_background))
        .route("/image/enhance/:project_id", post(enhance_image))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

pub fn content_routes() -> Router<AppState> {
    Router::new().route("/content/generate", post(generate_content))
}

// --- project CRUD ---

#[instrument(skip(state, payload))]
pub async fn create_project(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateProjectRequest>,
) -> ApiResult<Json<ProjectResponse>> {
    let project = Project::create(&state.db, user_id, &payload.name).await?;
    info!(project_id = %project.id, "project created");
    Ok(Json(ProjectResponse::from_project(
        project,
        state.assets.as_ref(),
    )))
}

#[instrument(skip(state))]
pub async fn list_projects(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<ProjectResponse>>> {
    let projects = Project::list_by_user(&state.db, user_id).await?;
    let items = projects
        .into_iter()
        .map(|p| ProjectResponse::from_project(p, state.assets.as_ref()))
        .collect();
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn get_project(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectResponse>> {
    let project = Project::get_owned(&state.db, id, user_id)
        .await?
        .ok_or(ApiError::NotFound(PROJECT_NOT_FOUND))?;
    Ok(Json(ProjectResponse::from_project(
        project,
        state.assets.as_ref(),
    )))
}

#[instrument(skip(state, payload))]
pub async fn update_project(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectResponse>> {
    let project = Project::update_fields(
        &state.db,
        id,
        user_id,
        payload.name_update(),
        payload.ai_title.as_deref(),
        payload.ai_description.as_deref(),
    )
    .await?
    .ok_or(ApiError::NotFound(PROJECT_NOT_FOUND))?;
    Ok(Json(ProjectResponse::from_project(
        project,
        state.assets.as_ref(),
    )))
}

#[instrument(skip(state))]
pub async fn delete_project(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    let (original, processed) = Project::delete_owned(&state.db, id, user_id)
        .await?
        .ok_or(ApiError::NotFound(PROJECT_NOT_FOUND))?;

    // Best-effort cascade; the store logs and swallows missing files.
    for path in [original, processed].into_iter().flatten() {
        state.assets.delete(&AssetRef::new(path)).await;
    }

    info!(project_id = %id, "project deleted");
    Ok(Json(DeleteResponse { success: true }))
}

// --- image pipeline ---

#[instrument(skip(state, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(project_id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    // Ownership first: a foreign project must 404 before any body parsing
    // complaint could leak its existence.
    Project::get_owned(&state.db, project_id, user_id)
        .await?
        .ok_or(ApiError::NotFound(PROJECT_NOT_FOUND))?;

    let (data, mime) = read_file_field(multipart).await?;

    let asset = state.assets.write(data, &mime, user_id, "original").await?;
    let project = Project::attach_upload(&state.db, project_id, user_id, asset.as_str())
        .await?
        .ok_or(ApiError::NotFound(PROJECT_NOT_FOUND))?;

    info!(project_id = %project_id, asset = asset.as_str(), "image uploaded");
    Ok(Json(UploadResponse {
        original_image_url: externalize_opt(state.assets.as_ref(), &project.original_image_path),
        processed_image_url: externalize_opt(state.assets.as_ref(), &project.processed_image_path),
    }))
}

#[instrument(skip(state))]
pub async fn remove_background(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProcessedImageResponse>> {
    let url = transform_current(&state, project_id, user_id, "nobg", |input| {
        imaging::strip_background(input).context("background removal")
    })
    .await?;
    Ok(Json(ProcessedImageResponse {
        processed_image_url: url,
    }))
}

#[instrument(skip(state))]
pub async fn enhance_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProcessedImageResponse>> {
    let url = transform_current(&state, project_id, user_id, "enhanced", |input| {
        imaging::upscale_2x(input).context("enhancement")
    })
    .await?;
    Ok(Json(ProcessedImageResponse {
        processed_image_url: url,
    }))
}

#[instrument(skip(state, payload))]
pub async fn generate_background(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<GenerateBackgroundRequest>,
) -> ApiResult<Json<ProcessedImageResponse>> {
    let ai = state.ai.clone().ok_or(ApiError::AiUnavailable)?;

    let current = current_asset(&state, payload.project_id, user_id).await?;
    let (reference, reference_mime) = read_current(state.assets.as_ref(), &current).await?;

    let images = ai
        .image
        .generate(
            BACKGROUND_SYSTEM_PROMPT,
            &background_prompt(&payload.prompt),
            Some((reference, reference_mime)),
        )
        .await?;
    let generated = images.into_iter().next().ok_or(ApiError::GenerationEmpty)?;

    let asset = state
        .assets
        .write(generated.bytes, &generated.mime, user_id, "aibg")
        .await?;
    let project = Project::set_processed(&state.db, payload.project_id, user_id, asset.as_str())
        .await?
        .ok_or(ApiError::NotFound(PROJECT_OR_IMAGE_NOT_FOUND))?;

    info!(project_id = %payload.project_id, "background generated");
    let url = externalize_opt(state.assets.as_ref(), &project.processed_image_path)
        .unwrap_or_else(|| state.assets.externalize(&asset));
    Ok(Json(ProcessedImageResponse {
        processed_image_url: url,
    }))
}

// --- content generation ---

#[instrument(skip(state, payload))]
pub async fn generate_content(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ContentGenerateRequest>,
) -> ApiResult<Json<GeneratedContentResponse>> {
    let ai = state.ai.as_ref().ok_or(ApiError::AiUnavailable)?;

    let generator = ContentGenerator::new(ai.text.clone());
    let (title, description) = generator
        .generate(&payload.product_type, payload.key_features.as_deref())
        .await?;

    info!(%user_id, product_type = %payload.product_type, "content generated");
    Ok(Json(GeneratedContentResponse { title, description }))
}

// --- shared transform plumbing ---

/// Pull the single "file" field out of an upload body. A body that fails to
/// decode reports its parse error instead of masquerading as a missing field.
async fn read_file_field(mut multipart: Multipart) -> ApiResult<(Bytes, String)> {
    let mut file: Option<(Bytes, String)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let mime = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(e.to_string()))?;
            file = Some((data, mime));
        }
    }
    file.ok_or_else(|| ApiError::Validation("file is required".into()))
}

/// Resolve the current asset's bytes. A ref whose backing blob has vanished
/// is a missing precondition, not a server fault, so it maps to NotFound.
async fn read_current(
    assets: &dyn AssetStore,
    current: &AssetRef,
) -> ApiResult<(Bytes, String)> {
    match assets.read(current).await {
        Ok(pair) => Ok(pair),
        Err(StoreError::NotFound) => Err(ApiError::NotFound(PROJECT_OR_IMAGE_NOT_FOUND)),
        Err(e) => Err(e.into()),
    }
}

/// The project's current asset ref; missing project, foreign owner and
/// missing upload all collapse into the same NotFound.
async fn current_asset(state: &AppState, project_id: Uuid, user_id: Uuid) -> ApiResult<AssetRef> {
    let project = Project::get_owned(&state.db, project_id, user_id)
        .await?
        .ok_or(ApiError::NotFound(PROJECT_OR_IMAGE_NOT_FOUND))?;
    project
        .processed_image_path
        .map(AssetRef::new)
        .ok_or(ApiError::NotFound(PROJECT_OR_IMAGE_NOT_FOUND))
}

/// Read the current asset, run a pure transform over it, store the result
/// and move the current pointer. Returns the new external URL.
async fn transform_current<F>(
    state: &AppState,
    project_id: Uuid,
    user_id: Uuid,
    purpose: &str,
    transform: F,
) -> ApiResult<String>
where
    F: FnOnce(&[u8]) -> anyhow::Result<Vec<u8>>,
{
    let current = current_asset(state, project_id, user_id).await?;
    let (input, _mime) = read_current(state.assets.as_ref(), &current).await?;

    let output = transform(&input[..])?;

    // Transforms always re-encode as PNG (background removal needs alpha).
    let asset = state
        .assets
        .write(Bytes::from(output), "image/png", user_id, purpose)
        .await?;
    Project::set_processed(&state.db, project_id, user_id, asset.as_str())
        .await?
        .ok_or(ApiError::NotFound(PROJECT_OR_IMAGE_NOT_FOUND))?;

    Ok(state.assets.externalize(&asset))
}
