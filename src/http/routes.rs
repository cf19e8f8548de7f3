use axum::{routing::delete, routing::get, routing::patch, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn auth() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/me", get(handlers::get_current_user))
        .route("/auth/change-password", post(handlers::change_password))
}

pub fn users() -> Router<AppState> {
    Router::new()
        .route("/users", get(handlers::list_users))
        .route("/users/search", get(handlers::search_users))
        .route("/users/me", patch(handlers::update_profile))
        .route("/users/:id", get(handlers::get_user))
        .route("/users/:id/dreams", get(handlers::list_user_dreams))
        .route("/users/:id/comments", get(handlers::list_user_comments))
}

pub fn social() -> Router<AppState> {
    Router::new()
        .route("/users/:id/follow-request", post(handlers::request_follow))
        .route("/users/:id/unfollow", post(handlers::unfollow_user))
        .route("/users/:id/block", post(handlers::block_user))
        .route("/users/:id/unblock", post(handlers::unblock_user))
        .route("/users/:id/followers", get(handlers::list_followers))
        .route("/users/:id/following", get(handlers::list_following))
        .route("/users/:id/relationship", get(handlers::relationship_status))
        .route(
            "/follow-requests/:id/accept",
            post(handlers::accept_follow_request),
        )
        .route(
            "/follow-requests/:id/reject",
            post(handlers::reject_follow_request),
        )
        .route("/me/follow-requests", get(handlers::list_pending_requests))
        .route("/me/blocked", get(handlers::list_blocked))
        .route("/me/blocked-by", get(handlers::list_blocked_by))
}

pub fn dreams() -> Router<AppState> {
    Router::new()
        .route("/dreams", get(handlers::dream_feed))
        .route("/dreams", post(handlers::create_dream))
        .route("/dreams/:id", get(handlers::get_dream))
        .route("/dreams/:id", delete(handlers::delete_dream))
        .route("/dreams/:id/like", post(handlers::toggle_like))
        .route("/dreams/:id/likes", get(handlers::list_dream_likes))
        .route("/dreams/:id/comments", get(handlers::list_dream_comments))
        .route("/dreams/:id/comments", post(handlers::comment_dream))
        .route("/comments/:id", delete(handlers::delete_comment))
}
