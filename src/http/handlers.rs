use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app::auth::{AuthService, SignupError};
use crate::app::dreams::{DeleteOutcome, DreamService};
use crate::app::engagement::EngagementService;
use crate::app::feed::FeedService;
use crate::app::relationship::{RelationshipError, RelationshipService, RelationshipStatus};
use crate::app::users::UserService;
use crate::domain::dream::{Dream, DreamCategory};
use crate::domain::engagement::{Comment, Like, UserComment};
use crate::domain::social_graph::FollowRequest;
use crate::domain::user::{PublicUser, User};
use crate::http::{AppError, AuthUser};
use crate::AppState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

#[derive(Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

#[derive(Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

fn parse_cursor(cursor: Option<String>) -> Result<Option<(OffsetDateTime, Uuid)>, AppError> {
    let Some(cursor) = cursor else {
        return Ok(None);
    };

    let mut parts = cursor.splitn(2, '/');
    let timestamp = parts
        .next()
        .ok_or_else(|| AppError::bad_request("invalid cursor"))?;
    let id = parts
        .next()
        .ok_or_else(|| AppError::bad_request("invalid cursor"))?;

    let timestamp = OffsetDateTime::parse(timestamp, &Rfc3339)
        .map_err(|_| AppError::bad_request("invalid cursor"))?;
    let id = Uuid::parse_str(id).map_err(|_| AppError::bad_request("invalid cursor"))?;

    Ok(Some((timestamp, id)))
}

fn encode_cursor(cursor: Option<(OffsetDateTime, Uuid)>) -> Option<String> {
    let (timestamp, id) = cursor?;
    let timestamp = timestamp.format(&Rfc3339).ok()?;
    Some(format!("{}/{}", timestamp, id))
}

/// Business rejections keep their reason; store faults are logged and
/// surfaced as an opaque 500.
fn relationship_error(err: RelationshipError, context: &'static str) -> AppError {
    match &err {
        RelationshipError::InvalidTarget => AppError::bad_request(err.to_string()),
        RelationshipError::Blocked => AppError::forbidden(err.to_string()),
        RelationshipError::AlreadyFollowing | RelationshipError::RequestPending => {
            AppError::conflict(err.to_string())
        }
        RelationshipError::NotFound => AppError::not_found(err.to_string()),
        RelationshipError::Store(store_err) => {
            tracing::error!(error = ?store_err, "{}", context);
            AppError::internal(context)
        }
    }
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.db.ping().await.is_ok() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse { status })
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    const MAX_PASSWORD_LEN: usize = 128;

    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_string();
    if username.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request(
            "username, email and password are required",
        ));
    }
    if username.len() > 32 {
        return Err(AppError::bad_request("username must be at most 32 characters"));
    }
    if !email.contains('@') {
        return Err(AppError::bad_request("invalid email address"));
    }
    if payload.password.len() < 8 {
        return Err(AppError::bad_request("password must be at least 8 characters"));
    }
    if payload.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::bad_request("password must be at most 128 characters"));
    }

    let service = AuthService::new(
        state.db.clone(),
        state.paseto_access_key,
        state.access_ttl_hours,
    );
    let user = service
        .signup(username, email, payload.password)
        .await
        .map_err(|err| match err {
            SignupError::UsernameTaken | SignupError::EmailTaken => {
                AppError::conflict(err.to_string())
            }
            SignupError::Store(err) => {
                tracing::error!(error = ?err, "failed to register user");
                AppError::internal("failed to register user")
            }
            SignupError::Other(err) => {
                tracing::error!(error = ?err, "failed to register user");
                AppError::internal("failed to register user")
            }
        })?;

    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    pub user: User,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("username and password are required"));
    }

    let service = AuthService::new(
        state.db.clone(),
        state.paseto_access_key,
        state.access_ttl_hours,
    );
    let outcome = service
        .login(payload.username.trim(), &payload.password)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "failed to login");
            AppError::internal("failed to login")
        })?;

    match outcome {
        Some((user, token)) => Ok(Json(LoginResponse {
            token: token.token,
            expires_at: token.expires_at,
            user,
        })),
        None => Err(AppError::unauthorized("invalid credentials")),
    }
}

pub async fn get_current_user(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<User>, AppError> {
    let service = AuthService::new(
        state.db.clone(),
        state.paseto_access_key,
        state.access_ttl_hours,
    );
    let user = service.get_current_user(auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %auth.user_id, "failed to fetch current user");
        AppError::internal("failed to fetch current user")
    })?;

    match user {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::not_found("user not found")),
    }
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

pub async fn change_password(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    if payload.new_password.len() < 8 {
        return Err(AppError::bad_request("password must be at least 8 characters"));
    }
    if payload.new_password.len() > 128 {
        return Err(AppError::bad_request("password must be at most 128 characters"));
    }

    let service = AuthService::new(
        state.db.clone(),
        state.paseto_access_key,
        state.access_ttl_hours,
    );
    let changed = service
        .change_password(auth.user_id, &payload.old_password, &payload.new_password)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %auth.user_id, "failed to change password");
            AppError::internal("failed to change password")
        })?;

    match changed {
        Some(true) => Ok(StatusCode::NO_CONTENT),
        Some(false) => Err(AppError::bad_request("old password is incorrect")),
        None => Err(AppError::not_found("user not found")),
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub async fn get_user(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<PublicUser>, AppError> {
    let service = UserService::new(state.db.clone());
    let user = service.get_user(id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %id, "failed to fetch user");
        AppError::internal("failed to fetch user")
    })?;

    match user {
        Some(user) => Ok(Json(user.into())),
        None => Err(AppError::not_found("user not found")),
    }
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

pub async fn update_profile(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<User>, AppError> {
    let service = UserService::new(state.db.clone());
    let user = service
        .update_profile(auth.user_id, payload.bio, payload.avatar_url)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %auth.user_id, "failed to update profile");
            AppError::internal("failed to update profile")
        })?;

    match user {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::not_found("user not found")),
    }
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

pub async fn search_users(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    let q = query.q.unwrap_or_default();
    let q = q.trim();
    if q.is_empty() {
        return Err(AppError::bad_request("query is required"));
    }

    let service = UserService::new(state.db.clone());
    let users = service.search(q, 50).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to search users");
        AppError::internal("failed to search users")
    })?;

    Ok(Json(users.into_iter().map(Into::into).collect()))
}

pub async fn list_users(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    let service = UserService::new(state.db.clone());
    let users = service.list_all(auth.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to list users");
        AppError::internal("failed to list users")
    })?;

    Ok(Json(users.into_iter().map(Into::into).collect()))
}

// ---------------------------------------------------------------------------
// Social graph
// ---------------------------------------------------------------------------

pub async fn request_follow(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<FollowRequest>), AppError> {
    let service = RelationshipService::new(state.db.clone());
    let request = service
        .request_follow(auth.user_id, id)
        .await
        .map_err(|err| relationship_error(err, "failed to create follow request"))?;

    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn accept_follow_request(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = RelationshipService::new(state.db.clone());
    service
        .accept_follow_request(id, auth.user_id)
        .await
        .map_err(|err| relationship_error(err, "failed to accept follow request"))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn reject_follow_request(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = RelationshipService::new(state.db.clone());
    service
        .reject_follow_request(id, auth.user_id)
        .await
        .map_err(|err| relationship_error(err, "failed to reject follow request"))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn unfollow_user(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    if auth.user_id == id {
        return Err(AppError::bad_request("cannot unfollow yourself"));
    }

    let service = RelationshipService::new(state.db.clone());
    service
        .unfollow(auth.user_id, id)
        .await
        .map_err(|err| relationship_error(err, "failed to unfollow user"))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn block_user(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    if auth.user_id == id {
        return Err(AppError::bad_request("cannot block yourself"));
    }

    let service = RelationshipService::new(state.db.clone());
    service
        .block(auth.user_id, id)
        .await
        .map_err(|err| relationship_error(err, "failed to block user"))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn unblock_user(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    if auth.user_id == id {
        return Err(AppError::bad_request("cannot unblock yourself"));
    }

    let service = RelationshipService::new(state.db.clone());
    service
        .unblock(auth.user_id, id)
        .await
        .map_err(|err| relationship_error(err, "failed to unblock user"))?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct SocialUserItem {
    pub user: PublicUser,
    #[serde(with = "time::serde::rfc3339")]
    pub since: OffsetDateTime,
}

pub async fn list_followers(
    Path(id): Path<Uuid>,
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ListResponse<SocialUserItem>>, AppError> {
    let limit = query.limit.unwrap_or(30);
    if !(1..=200).contains(&limit) {
        return Err(AppError::bad_request("limit must be between 1 and 200"));
    }
    let cursor = parse_cursor(query.cursor)?;

    let service = RelationshipService::new(state.db.clone());
    let mut followers = service
        .list_followers(id, cursor, limit + 1)
        .await
        .map_err(|err| relationship_error(err, "failed to list followers"))?;

    let next_cursor = if followers.len() > limit as usize {
        followers.pop().map(|last| (last.since, last.user.id))
    } else {
        None
    };

    let items = followers
        .into_iter()
        .map(|edge| SocialUserItem {
            user: edge.user.into(),
            since: edge.since,
        })
        .collect();

    Ok(Json(ListResponse {
        items,
        next_cursor: encode_cursor(next_cursor),
    }))
}

pub async fn list_following(
    Path(id): Path<Uuid>,
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ListResponse<SocialUserItem>>, AppError> {
    let limit = query.limit.unwrap_or(30);
    if !(1..=200).contains(&limit) {
        return Err(AppError::bad_request("limit must be between 1 and 200"));
    }
    let cursor = parse_cursor(query.cursor)?;

    let service = RelationshipService::new(state.db.clone());
    let mut following = service
        .list_following(id, cursor, limit + 1)
        .await
        .map_err(|err| relationship_error(err, "failed to list following"))?;

    let next_cursor = if following.len() > limit as usize {
        following.pop().map(|last| (last.since, last.user.id))
    } else {
        None
    };

    let items = following
        .into_iter()
        .map(|edge| SocialUserItem {
            user: edge.user.into(),
            since: edge.since,
        })
        .collect();

    Ok(Json(ListResponse {
        items,
        next_cursor: encode_cursor(next_cursor),
    }))
}

pub async fn list_blocked(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    let service = RelationshipService::new(state.db.clone());
    let blocked = service
        .list_blocked(auth.user_id)
        .await
        .map_err(|err| relationship_error(err, "failed to list blocked users"))?;

    Ok(Json(blocked.into_iter().map(|edge| edge.user.into()).collect()))
}

pub async fn list_blocked_by(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    let service = RelationshipService::new(state.db.clone());
    let blockers = service
        .list_blocked_by(auth.user_id)
        .await
        .map_err(|err| relationship_error(err, "failed to list blockers"))?;

    Ok(Json(blockers.into_iter().map(|edge| edge.user.into()).collect()))
}

#[derive(Serialize)]
pub struct PendingRequestItem {
    pub id: Uuid,
    pub requester: PublicUser,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub async fn list_pending_requests(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PendingRequestItem>>, AppError> {
    let service = RelationshipService::new(state.db.clone());
    let pending = service
        .list_pending(auth.user_id)
        .await
        .map_err(|err| relationship_error(err, "failed to list follow requests"))?;

    let items = pending
        .into_iter()
        .map(|request| PendingRequestItem {
            id: request.id,
            requester: request.requester.into(),
            created_at: request.created_at,
        })
        .collect();

    Ok(Json(items))
}

pub async fn relationship_status(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<RelationshipStatus>, AppError> {
    let service = RelationshipService::new(state.db.clone());
    let status = service
        .relationship_status(auth.user_id, id)
        .await
        .map_err(|err| relationship_error(err, "failed to fetch relationship status"))?;

    Ok(Json(status))
}

// ---------------------------------------------------------------------------
// Dreams
// ---------------------------------------------------------------------------

pub async fn dream_feed(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ListResponse<Dream>>, AppError> {
    let limit = query.limit.unwrap_or(30);
    if !(1..=200).contains(&limit) {
        return Err(AppError::bad_request("limit must be between 1 and 200"));
    }
    let cursor = parse_cursor(query.cursor)?;

    let service = FeedService::new(state.db.clone());
    let mut dreams = service
        .visible_dreams(auth.user_id, auth.role, cursor, limit + 1)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, viewer_id = %auth.user_id, "failed to load dream feed");
            AppError::internal("failed to load dream feed")
        })?;

    let next_cursor = if dreams.len() > limit as usize {
        dreams.pop().map(|last| (last.created_at, last.id))
    } else {
        None
    };

    Ok(Json(ListResponse {
        items: dreams,
        next_cursor: encode_cursor(next_cursor),
    }))
}

#[derive(Deserialize)]
pub struct CreateDreamRequest {
    pub title: String,
    pub content: String,
    pub category: DreamCategory,
    #[serde(default)]
    pub is_public: bool,
}

pub async fn create_dream(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateDreamRequest>,
) -> Result<(StatusCode, Json<Dream>), AppError> {
    let title = payload.title.trim().to_string();
    if title.is_empty() || payload.content.trim().is_empty() {
        return Err(AppError::bad_request("title and content are required"));
    }
    if title.len() > 200 {
        return Err(AppError::bad_request("title must be at most 200 characters"));
    }
    if payload.content.len() > 10_000 {
        return Err(AppError::bad_request("content must be at most 10000 characters"));
    }

    let service = DreamService::new(state.db.clone());
    let dream = service
        .create_dream(
            auth.user_id,
            title,
            payload.content,
            payload.category,
            payload.is_public,
        )
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, owner_id = %auth.user_id, "failed to create dream");
            AppError::internal("failed to create dream")
        })?;

    Ok((StatusCode::CREATED, Json(dream)))
}

pub async fn get_dream(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Dream>, AppError> {
    let service = DreamService::new(state.db.clone());
    let dream = service
        .get_dream(id, auth.user_id, auth.role)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, dream_id = %id, "failed to fetch dream");
            AppError::internal("failed to fetch dream")
        })?;

    match dream {
        Some(dream) => Ok(Json(dream)),
        None => Err(AppError::not_found("dream not found")),
    }
}

pub async fn delete_dream(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = DreamService::new(state.db.clone());
    let outcome = service
        .delete_dream(id, auth.user_id, auth.role)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, dream_id = %id, "failed to delete dream");
            AppError::internal("failed to delete dream")
        })?;

    match outcome {
        DeleteOutcome::Deleted => Ok(StatusCode::NO_CONTENT),
        DeleteOutcome::Forbidden => Err(AppError::forbidden("you cannot delete this dream")),
        DeleteOutcome::NotFound => Err(AppError::not_found("dream not found")),
    }
}

#[derive(Deserialize)]
pub struct ListLimitQuery {
    pub limit: Option<i64>,
}

pub async fn list_user_dreams(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListLimitQuery>,
) -> Result<Json<Vec<Dream>>, AppError> {
    let limit = query.limit.unwrap_or(50);
    if !(1..=200).contains(&limit) {
        return Err(AppError::bad_request("limit must be between 1 and 200"));
    }

    let service = DreamService::new(state.db.clone());
    let dreams = service
        .list_by_user(id, auth.user_id, auth.role, limit)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %id, "failed to list user dreams");
            AppError::internal("failed to list user dreams")
        })?;

    Ok(Json(dreams))
}

// ---------------------------------------------------------------------------
// Likes & comments
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub like_count: i64,
}

pub async fn toggle_like(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<LikeResponse>, AppError> {
    let service = EngagementService::new(state.db.clone());
    let outcome = service.toggle_like(auth.user_id, id).await.map_err(|err| {
        tracing::error!(error = ?err, dream_id = %id, "failed to toggle like");
        AppError::internal("failed to toggle like")
    })?;

    match outcome {
        Some((liked, like_count)) => Ok(Json(LikeResponse { liked, like_count })),
        None => Err(AppError::not_found("dream not found")),
    }
}

pub async fn list_dream_likes(
    Path(id): Path<Uuid>,
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Like>>, AppError> {
    let service = EngagementService::new(state.db.clone());
    let likes = service.list_likes(id).await.map_err(|err| {
        tracing::error!(error = ?err, dream_id = %id, "failed to list likes");
        AppError::internal("failed to list likes")
    })?;

    Ok(Json(likes))
}

#[derive(Deserialize)]
pub struct CommentRequest {
    pub body: String,
}

pub async fn comment_dream(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let body = payload.body.trim().to_string();
    if body.is_empty() {
        return Err(AppError::bad_request("comment body is required"));
    }
    if body.len() > 2000 {
        return Err(AppError::bad_request("comment must be at most 2000 characters"));
    }

    let service = EngagementService::new(state.db.clone());
    let comment = service
        .add_comment(auth.user_id, id, body)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, dream_id = %id, "failed to create comment");
            AppError::internal("failed to create comment")
        })?;

    match comment {
        Some(comment) => Ok((StatusCode::CREATED, Json(comment))),
        None => Err(AppError::not_found("dream not found")),
    }
}

pub async fn list_dream_comments(
    Path(id): Path<Uuid>,
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let service = EngagementService::new(state.db.clone());
    let comments = service.list_comments(id).await.map_err(|err| {
        tracing::error!(error = ?err, dream_id = %id, "failed to list comments");
        AppError::internal("failed to list comments")
    })?;

    Ok(Json(comments))
}

pub async fn list_user_comments(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListLimitQuery>,
) -> Result<Json<Vec<UserComment>>, AppError> {
    let limit = query.limit.unwrap_or(50);
    if !(1..=200).contains(&limit) {
        return Err(AppError::bad_request("limit must be between 1 and 200"));
    }

    let service = EngagementService::new(state.db.clone());
    let comments = service
        .list_by_user(id, auth.user_id, auth.role, limit)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %id, "failed to list user comments");
            AppError::internal("failed to list user comments")
        })?;

    Ok(Json(comments))
}

pub async fn delete_comment(
    Path(id): Path<Uuid>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let service = EngagementService::new(state.db.clone());
    let outcome = service
        .delete_comment(id, auth.user_id, auth.role)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, comment_id = %id, "failed to delete comment");
            AppError::internal("failed to delete comment")
        })?;

    match outcome {
        DeleteOutcome::Deleted => Ok(StatusCode::NO_CONTENT),
        DeleteOutcome::Forbidden => Err(AppError::forbidden("you cannot delete this comment")),
        DeleteOutcome::NotFound => Err(AppError::not_found("comment not found")),
    }
}
