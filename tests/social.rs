//! Social Graph Tests
//!
//! Covers the follow-request lifecycle, blocks and their side effects, and
//! the relationship status endpoint.

mod common;

use axum::http::StatusCode;
use common::app;
use serde_json::Value;
use uuid::Uuid;

async fn relationship(app: &common::TestApp, token: &str, other: Uuid) -> Value {
    let resp = app
        .get(&format!("/users/{}/relationship", other), Some(token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    resp.json()
}

// ===========================================================================
// Follow requests
// ===========================================================================

#[tokio_shared_rt::test(shared)]
async fn follow_request_creates_pending() {
    let app = app().await;
    let alice = app.create_user("soc_req_a").await;
    let bob = app.create_user("soc_req_b").await;

    let resp = app
        .post_empty(
            &format!("/users/{}/follow-request", bob.id),
            Some(&alice.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::CREATED);
    let body = resp.json();
    assert_eq!(body["status"].as_str().unwrap(), "pending");
    assert_eq!(body["requester_id"].as_str().unwrap(), alice.id.to_string());
    assert_eq!(body["target_id"].as_str().unwrap(), bob.id.to_string());

    // no follow edge yet, only a pending request
    let status = relationship(app, &alice.access_token, bob.id).await;
    assert!(!status["is_following"].as_bool().unwrap());
    assert!(status["has_pending_request"].as_bool().unwrap());
}

#[tokio_shared_rt::test(shared)]
async fn follow_request_self() {
    let app = app().await;
    let user = app.create_user("soc_req_self").await;

    let resp = app
        .post_empty(
            &format!("/users/{}/follow-request", user.id),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "invalid follow target");
}

#[tokio_shared_rt::test(shared)]
async fn follow_request_unknown_target() {
    let app = app().await;
    let user = app.create_user("soc_req_missing").await;

    let resp = app
        .post_empty(
            &format!("/users/{}/follow-request", Uuid::new_v4()),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "invalid follow target");
}

#[tokio_shared_rt::test(shared)]
async fn follow_request_admin_target() {
    let app = app().await;
    let user = app.create_user("soc_req_admin_u").await;
    let admin = app.create_admin("soc_req_admin_t").await;

    let resp = app
        .post_empty(
            &format!("/users/{}/follow-request", admin.id),
            Some(&user.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "invalid follow target");
}

#[tokio_shared_rt::test(shared)]
async fn follow_request_blocked_by_target() {
    let app = app().await;
    let alice = app.create_user("soc_req_blk_a").await;
    let bob = app.create_user("soc_req_blk_b").await;

    // bob blocks alice
    let resp = app
        .post_empty(
            &format!("/users/{}/block", alice.id),
            Some(&bob.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app
        .post_empty(
            &format!("/users/{}/follow-request", bob.id),
            Some(&alice.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.error_message(), "this user has blocked you");
}

#[tokio_shared_rt::test(shared)]
async fn follow_request_duplicate_pending() {
    let app = app().await;
    let alice = app.create_user("soc_req_dup_a").await;
    let bob = app.create_user("soc_req_dup_b").await;

    let resp = app
        .post_empty(
            &format!("/users/{}/follow-request", bob.id),
            Some(&alice.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);

    let resp = app
        .post_empty(
            &format!("/users/{}/follow-request", bob.id),
            Some(&alice.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.error_message(), "a follow request is already pending");
}

#[tokio_shared_rt::test(shared)]
async fn follow_request_already_following() {
    let app = app().await;
    let alice = app.create_user("soc_req_dupf_a").await;
    let bob = app.create_user("soc_req_dupf_b").await;
    app.create_follow(alice.id, bob.id).await;

    let resp = app
        .post_empty(
            &format!("/users/{}/follow-request", bob.id),
            Some(&alice.access_token),
        )
        .await;

    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.error_message(), "already following this user");
}

// ===========================================================================
// Accept / reject
// ===========================================================================

#[tokio_shared_rt::test(shared)]
async fn accept_follow_request() {
    let app = app().await;
    let alice = app.create_user("soc_acc_a").await;
    let bob = app.create_user("soc_acc_b").await;

    let resp = app
        .post_empty(
            &format!("/users/{}/follow-request", bob.id),
            Some(&alice.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let request_id = resp.json()["id"].as_str().unwrap().to_string();

    // bob sees the pending request with the requester's profile
    let resp = app.get("/me/follow-requests", Some(&bob.access_token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let pending = resp.json();
    let entry = pending
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["id"].as_str().unwrap() == request_id)
        .expect("pending request not listed");
    assert_eq!(
        entry["requester"]["username"].as_str().unwrap(),
        alice.username
    );

    let resp = app
        .post_empty(
            &format!("/follow-requests/{}/accept", request_id),
            Some(&bob.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let status = relationship(app, &alice.access_token, bob.id).await;
    assert!(status["is_following"].as_bool().unwrap());
    assert!(!status["has_pending_request"].as_bool().unwrap());

    // a decided request cannot be accepted again
    let resp = app
        .post_empty(
            &format!("/follow-requests/{}/accept", request_id),
            Some(&bob.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio_shared_rt::test(shared)]
async fn accept_requires_being_the_target() {
    let app = app().await;
    let alice = app.create_user("soc_acc_own_a").await;
    let bob = app.create_user("soc_acc_own_b").await;
    let mallory = app.create_user("soc_acc_own_m").await;

    let resp = app
        .post_empty(
            &format!("/users/{}/follow-request", bob.id),
            Some(&alice.access_token),
        )
        .await;
    let request_id = resp.json()["id"].as_str().unwrap().to_string();

    let resp = app
        .post_empty(
            &format!("/follow-requests/{}/accept", request_id),
            Some(&mallory.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    // still pending for bob
    let status = relationship(app, &alice.access_token, bob.id).await;
    assert!(status["has_pending_request"].as_bool().unwrap());
}

#[tokio_shared_rt::test(shared)]
async fn accept_refuses_request_with_block_between_pair() {
    let app = app().await;
    let alice = app.create_user("soc_acc_blk_a").await;
    let bob = app.create_user("soc_acc_blk_b").await;

    // alice asks to follow bob, then blocks him while the request is pending
    let resp = app
        .post_empty(
            &format!("/users/{}/follow-request", bob.id),
            Some(&alice.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let request_id = resp.json()["id"].as_str().unwrap().to_string();

    let resp = app
        .post_empty(
            &format!("/users/{}/block", bob.id),
            Some(&alice.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    // bob cannot turn the stale request into a follow edge next to the block
    let resp = app
        .post_empty(
            &format!("/follow-requests/{}/accept", request_id),
            Some(&bob.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let status = relationship(app, &alice.access_token, bob.id).await;
    assert!(!status["is_following"].as_bool().unwrap());
    assert!(status["is_blocking"].as_bool().unwrap());
}

#[tokio_shared_rt::test(shared)]
async fn reject_follow_request() {
    let app = app().await;
    let alice = app.create_user("soc_rej_a").await;
    let bob = app.create_user("soc_rej_b").await;

    let resp = app
        .post_empty(
            &format!("/users/{}/follow-request", bob.id),
            Some(&alice.access_token),
        )
        .await;
    let request_id = resp.json()["id"].as_str().unwrap().to_string();

    let resp = app
        .post_empty(
            &format!("/follow-requests/{}/reject", request_id),
            Some(&bob.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let status = relationship(app, &alice.access_token, bob.id).await;
    assert!(!status["is_following"].as_bool().unwrap());
    assert!(!status["has_pending_request"].as_bool().unwrap());

    // rejection does not burn the requester: a fresh request is allowed
    let resp = app
        .post_empty(
            &format!("/users/{}/follow-request", bob.id),
            Some(&alice.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
}

// ===========================================================================
// Unfollow
// ===========================================================================

#[tokio_shared_rt::test(shared)]
async fn unfollow_user() {
    let app = app().await;
    let alice = app.create_user("soc_unf_a").await;
    let bob = app.create_user("soc_unf_b").await;
    app.create_follow(alice.id, bob.id).await;

    let resp = app
        .post_empty(
            &format!("/users/{}/unfollow", bob.id),
            Some(&alice.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let status = relationship(app, &alice.access_token, bob.id).await;
    assert!(!status["is_following"].as_bool().unwrap());

    // not idempotent: a second unfollow has nothing to remove
    let resp = app
        .post_empty(
            &format!("/users/{}/unfollow", bob.id),
            Some(&alice.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

// ===========================================================================
// Blocks
// ===========================================================================

#[tokio_shared_rt::test(shared)]
async fn block_removes_follows_both_directions() {
    let app = app().await;
    let alice = app.create_user("soc_blk_f_a").await;
    let bob = app.create_user("soc_blk_f_b").await;
    app.create_follow(alice.id, bob.id).await;
    app.create_follow(bob.id, alice.id).await;

    let resp = app
        .post_empty(
            &format!("/users/{}/block", bob.id),
            Some(&alice.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let status = relationship(app, &alice.access_token, bob.id).await;
    assert!(!status["is_following"].as_bool().unwrap());
    assert!(!status["is_followed_by"].as_bool().unwrap());
    assert!(status["is_blocking"].as_bool().unwrap());

    let status = relationship(app, &bob.access_token, alice.id).await;
    assert!(status["is_blocked_by"].as_bool().unwrap());
}

#[tokio_shared_rt::test(shared)]
async fn block_cancels_pending_request_from_blocked() {
    let app = app().await;
    let alice = app.create_user("soc_blk_p_a").await;
    let bob = app.create_user("soc_blk_p_b").await;

    // bob asked to follow alice
    let resp = app
        .post_empty(
            &format!("/users/{}/follow-request", alice.id),
            Some(&bob.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let request_id = resp.json()["id"].as_str().unwrap().to_string();

    // alice blocks bob
    let resp = app
        .post_empty(
            &format!("/users/{}/block", bob.id),
            Some(&alice.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    // the pending request is gone from alice's inbox
    let resp = app.get("/me/follow-requests", Some(&alice.access_token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let still_listed = resp
        .json()
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["id"].as_str().unwrap() == request_id);
    assert!(!still_listed);
}

#[tokio_shared_rt::test(shared)]
async fn block_is_idempotent() {
    let app = app().await;
    let alice = app.create_user("soc_blk_i_a").await;
    let bob = app.create_user("soc_blk_i_b").await;

    for _ in 0..2 {
        let resp = app
            .post_empty(
                &format!("/users/{}/block", bob.id),
                Some(&alice.access_token),
            )
            .await;
        assert_eq!(resp.status, StatusCode::NO_CONTENT);
    }
}

#[tokio_shared_rt::test(shared)]
async fn block_self() {
    let app = app().await;
    let user = app.create_user("soc_blk_self").await;

    let resp = app
        .post_empty(
            &format!("/users/{}/block", user.id),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "cannot block yourself");
}

#[tokio_shared_rt::test(shared)]
async fn block_unknown_user() {
    let app = app().await;
    let user = app.create_user("soc_blk_missing").await;

    let resp = app
        .post_empty(
            &format!("/users/{}/block", Uuid::new_v4()),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio_shared_rt::test(shared)]
async fn unblock_user() {
    let app = app().await;
    let alice = app.create_user("soc_unb_a").await;
    let bob = app.create_user("soc_unb_b").await;

    let resp = app
        .post_empty(
            &format!("/users/{}/block", bob.id),
            Some(&alice.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app
        .post_empty(
            &format!("/users/{}/unblock", bob.id),
            Some(&alice.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    // unblock does not restore any follow relationship
    let status = relationship(app, &alice.access_token, bob.id).await;
    assert!(!status["is_blocking"].as_bool().unwrap());
    assert!(!status["is_following"].as_bool().unwrap());

    // not idempotent
    let resp = app
        .post_empty(
            &format!("/users/{}/unblock", bob.id),
            Some(&alice.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio_shared_rt::test(shared)]
async fn blocked_lists() {
    let app = app().await;
    let alice = app.create_user("soc_blkl_a").await;
    let bob = app.create_user("soc_blkl_b").await;

    app.post_empty(
        &format!("/users/{}/block", bob.id),
        Some(&alice.access_token),
    )
    .await;

    let resp = app.get("/me/blocked", Some(&alice.access_token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    let blocked: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert!(blocked.contains(&bob.username.as_str()));

    let resp = app.get("/me/blocked-by", Some(&bob.access_token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    let blockers: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert!(blockers.contains(&alice.username.as_str()));
}

// ===========================================================================
// Follower listings
// ===========================================================================

#[tokio_shared_rt::test(shared)]
async fn followers_pagination() {
    let app = app().await;
    let target = app.create_user("soc_fol_target").await;
    let mut follower_ids = Vec::new();
    for i in 0..3 {
        let follower = app.create_user(&format!("soc_fol_{}", i)).await;
        app.create_follow(follower.id, target.id).await;
        follower_ids.push(follower.id.to_string());
    }

    let resp = app
        .get(
            &format!("/users/{}/followers?limit=2", target.id),
            Some(&target.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    let cursor = body["next_cursor"].as_str().unwrap().to_string();

    let resp = app
        .get(
            &format!("/users/{}/followers?limit=2&cursor={}", target.id, cursor),
            Some(&target.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert!(body["next_cursor"].is_null());

    // both pages together cover all three followers exactly once
    let resp = app
        .get(
            &format!("/users/{}/followers?limit=200", target.id),
            Some(&target.access_token),
        )
        .await;
    let listed: Vec<String> = resp.json()["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["user"]["id"].as_str().unwrap().to_string())
        .collect();
    for id in &follower_ids {
        assert!(listed.contains(id));
    }
}

#[tokio_shared_rt::test(shared)]
async fn following_listing() {
    let app = app().await;
    let alice = app.create_user("soc_fwg_a").await;
    let bob = app.create_user("soc_fwg_b").await;
    app.create_follow(alice.id, bob.id).await;

    let resp = app
        .get(
            &format!("/users/{}/following", alice.id),
            Some(&alice.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    let listed: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["user"]["username"].as_str().unwrap())
        .collect();
    assert!(listed.contains(&bob.username.as_str()));
}

// ===========================================================================
// End to end
// ===========================================================================

#[tokio_shared_rt::test(shared)]
async fn request_accept_block_scenario() {
    let app = app().await;
    let alice = app.create_user("soc_e2e_alice").await;
    let bob = app.create_user("soc_e2e_bob").await;

    // alice asks to follow bob, bob accepts
    let resp = app
        .post_empty(
            &format!("/users/{}/follow-request", bob.id),
            Some(&alice.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let request_id = resp.json()["id"].as_str().unwrap().to_string();

    let resp = app
        .post_empty(
            &format!("/follow-requests/{}/accept", request_id),
            Some(&bob.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let status = relationship(app, &alice.access_token, bob.id).await;
    assert!(status["is_following"].as_bool().unwrap());

    // bob blocks alice: the follow edge is gone and she cannot re-request
    let resp = app
        .post_empty(
            &format!("/users/{}/block", alice.id),
            Some(&bob.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let status = relationship(app, &alice.access_token, bob.id).await;
    assert!(!status["is_following"].as_bool().unwrap());
    assert!(status["is_blocked_by"].as_bool().unwrap());

    let resp = app
        .post_empty(
            &format!("/users/{}/follow-request", bob.id),
            Some(&alice.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    // bob relents; the pair is back to no relationship, so a fresh request works
    let resp = app
        .post_empty(
            &format!("/users/{}/unblock", alice.id),
            Some(&bob.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app
        .post_empty(
            &format!("/users/{}/follow-request", bob.id),
            Some(&alice.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
}

#[tokio_shared_rt::test(shared)]
async fn social_endpoints_require_auth() {
    let app = app().await;
    let id = Uuid::new_v4();

    let resp = app
        .post_empty(&format!("/users/{}/follow-request", id), None)
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = app.get("/me/follow-requests", None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}
