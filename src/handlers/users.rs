use crate::error::ApiError;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use model::{repository, UserCategory, UserCity, UserRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating or replacing a user
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UserRequest {
    /// Username, stored lowercase
    #[validate(required)]
    pub username: Option<String>,
    /// Favorite cities in order; duplicates are kept
    #[serde(default)]
    pub favorite_cities: Vec<UserCity>,
    /// Categories; entries with an already listed name are dropped
    #[serde(default)]
    pub categories: Vec<UserCategory>,
}

impl UserRequest {
    /// Handlers extract this type through `Valid`, which already answers a
    /// missing username with 400. This covers bodies built without that
    /// extractor.
    fn username(&self) -> Result<&str, ApiError> {
        self.username
            .as_deref()
            .ok_or_else(|| ApiError::InvalidRequest("username is required".to_string()))
    }

    /// Overwrites every field of `record` with the request content.
    fn apply_to(self, record: &mut UserRecord) -> Result<(), ApiError> {
        record.set_username(self.username()?);
        record.set_favorite_cities(self.favorite_cities);
        record.set_categories(self.categories.into_iter().collect());
        Ok(())
    }
}

/// Request body for partially updating a user
///
/// Absent fields are left untouched. A given collection replaces the stored
/// one, with the usual lifecycle rules applied.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub favorite_cities: Option<Vec<UserCity>>,
    pub categories: Option<Vec<UserCategory>>,
}

impl UpdateUserRequest {
    fn apply_to(self, record: &mut UserRecord) -> Vec<&'static str> {
        let mut updated_fields = Vec::new();
        if let Some(username) = self.username {
            record.set_username(username);
            updated_fields.push("username");
        }
        if let Some(cities) = self.favorite_cities {
            record.set_favorite_cities(cities);
            updated_fields.push("favorite_cities");
        }
        if let Some(categories) = self.categories {
            record.set_categories(categories.into_iter().collect());
            updated_fields.push("categories");
        }
        updated_fields
    }
}

async fn load_user(state: &AppState, user_id: i32) -> Result<UserRecord, ApiError> {
    repository::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::UserNotFound(user_id))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = UserRequest,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<UserRecord>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn create_user(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UserRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<UserRecord>>), ApiError> {
    trace!("Entering create_user function");

    let mut record = UserRecord::new(request.username()?);
    request.apply_to(&mut record)?;
    debug!("Creating user: {:?}", record);

    let stored = repository::create(&state.db, record).await?;
    info!(
        "User created successfully with ID: {:?}, username: {}",
        stored.id(),
        stored.username()
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(stored, "User created successfully")),
    ))
}

/// Get all users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<Vec<UserRecord>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_users(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<UserRecord>>>, ApiError> {
    trace!("Entering get_users function");

    let users = repository::find_all(&state.db).await?;
    info!("Successfully retrieved {} users", users.len());

    Ok(Json(ApiResponse::ok(users, "Users retrieved successfully")))
}

/// Get a specific user by ID
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserRecord>),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_user(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UserRecord>>, ApiError> {
    trace!("Entering get_user function for user_id: {}", user_id);

    let user = load_user(&state, user_id).await?;
    debug!("Retrieved user: {:?}", user);

    Ok(Json(ApiResponse::ok(user, "User retrieved successfully")))
}

/// Find users by username
///
/// The lookup is case-insensitive because usernames are stored lowercase.
/// Usernames are not unique, so the result is a list.
#[utoipa::path(
    get,
    path = "/api/v1/users/name/{username}",
    tag = "users",
    params(
        ("username" = String, Path, description = "Username, any casing"),
    ),
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<Vec<UserRecord>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_users_by_username(
    Path(username): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<UserRecord>>>, ApiError> {
    trace!("Entering get_users_by_username function for: {}", username);

    let users = repository::find_by_username(&state.db, &username).await?;
    debug!("Found {} users named {}", users.len(), username);

    Ok(Json(ApiResponse::ok(users, "Users retrieved successfully")))
}

/// Replace a user
///
/// Every field is overwritten. Categories missing from the body are deleted;
/// favorite cities missing from the body keep their rows.
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = UserRequest,
    responses(
        (status = 200, description = "User replaced successfully", body = ApiResponse<UserRecord>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn replace_user(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UserRequest>>,
) -> Result<Json<ApiResponse<UserRecord>>, ApiError> {
    trace!("Entering replace_user function for user_id: {}", user_id);

    let mut record = load_user(&state, user_id).await?;
    request.apply_to(&mut record)?;

    let saved = repository::save(&state.db, record).await?;
    info!("User with ID {} replaced successfully", user_id);

    Ok(Json(ApiResponse::ok(saved, "User replaced successfully")))
}

/// Partially update a user
#[utoipa::path(
    patch,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = ApiResponse<UserRecord>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn update_user(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserRecord>>, ApiError> {
    trace!("Entering update_user function for user_id: {}", user_id);

    let mut record = load_user(&state, user_id).await?;
    let updated_fields = request.apply_to(&mut record);
    if updated_fields.is_empty() {
        debug!("No fields to update for user ID: {}", user_id);
    } else {
        debug!("Updating fields: {}", updated_fields.join(", "));
    }

    let saved = repository::save(&state.db, record).await?;
    info!("User with ID {} updated successfully", user_id);

    Ok(Json(ApiResponse::ok(saved, "User updated successfully")))
}

/// Delete a user together with its favorite cities and categories
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn delete_user(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_user function for user_id: {}", user_id);

    if !repository::delete(&state.db, user_id).await? {
        return Err(ApiError::UserNotFound(user_id));
    }
    info!("User with ID {} deleted successfully", user_id);

    Ok(Json(ApiResponse::ok(
        format!("User {} deleted", user_id),
        "User deleted successfully",
    )))
}
