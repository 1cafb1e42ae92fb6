use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use domain::{Account, CommentId};
use serde::Deserialize;

use super::comments::is_secure;
use crate::http::error::ApiError;
use crate::http::views::{CommentView, PostView};
use crate::state::AppState;

/// Stand-in for the host permission system: moderation and container
/// management require the admin bearer token.
pub fn authorize(headers: &HeaderMap, admin_token: &str) -> Result<(), ApiError> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(ApiError::Unauthorized("Missing Authorization header"))?;
    let expected_token = format!("Bearer {}", admin_token);
    if auth_header != expected_token {
        return Err(ApiError::Forbidden("Invalid Admin Token"));
    }
    Ok(())
}

#[derive(Deserialize)]
pub struct PostRequest {
    pub title: Option<String>,
}

pub async fn put_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Json(payload): Json<PostRequest>,
) -> Result<Json<PostView>, ApiError> {
    authorize(&headers, &state.admin_token)?;
    let title = payload.title.unwrap_or_else(|| slug.clone());
    let post = state
        .db
        .ensure_post(&state.config.site_id, &slug, &title)
        .await?;
    Ok(Json(post.into()))
}

#[derive(Deserialize)]
pub struct AccountRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
}

pub async fn put_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<AccountRequest>,
) -> Result<Json<Account>, ApiError> {
    authorize(&headers, &state.admin_token)?;
    let account = Account {
        id,
        username: payload.username,
        email: payload.email,
        full_name: payload.full_name,
    };
    state.db.upsert_account(&account).await?;
    Ok(Json(account))
}

#[derive(Deserialize)]
pub struct VisibilityRequest {
    pub is_public: bool,
}

pub async fn put_visibility(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<VisibilityRequest>,
) -> Result<Json<CommentView>, ApiError> {
    authorize(&headers, &state.admin_token)?;
    let comment = state
        .db
        .set_public(&CommentId::new(id), payload.is_public)
        .await?;
    let secure = is_secure(&headers, state.config.gravatar.default_secure);
    Ok(Json(CommentView::new(&comment, None, secure, &state.config)))
}
