//! User HTTP handlers.

use crate::{error::HttpError, AppState};
use axum::{extract::State, http::StatusCode, Json};
use rostrum_core::models::user::{CreateUserRequest, User};
use rostrum_core::AppError;

/// Register a new user.
///
/// # Errors
/// Returns an error if the nickname is blank or persistence fails.
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), HttpError> {
    if req.nickname.trim().is_empty() {
        return Err(AppError::Validation("nickname must not be blank".to_string()).into());
    }
    let user = state.db.users.create(&req)?;
    Ok((StatusCode::CREATED, Json(user)))
}
