use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::Row;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::social_graph::{FollowRequest, RequestStatus};
use crate::domain::user::{User, UserRole};
use crate::infra::db::Db;

/// Business-rule rejections of the follow/block state machine. These map to
/// 4xx responses; `Store` is the opaque infrastructure case and maps to 500.
#[derive(Debug, Error)]
pub enum RelationshipError {
    #[error("invalid follow target")]
    InvalidTarget,
    #[error("this user has blocked you")]
    Blocked,
    #[error("already following this user")]
    AlreadyFollowing,
    #[error("a follow request is already pending")]
    RequestPending,
    #[error("relationship not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct RelationshipService {
    db: Db,
}

#[derive(Debug, Clone)]
pub struct SocialUserEdge {
    pub user: User,
    pub since: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub id: Uuid,
    pub requester: User,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationshipStatus {
    pub is_following: bool,
    pub is_followed_by: bool,
    pub is_blocking: bool,
    pub is_blocked_by: bool,
    pub has_pending_request: bool,
}

pub(crate) fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    let role: String = row.try_get("role")?;
    let role = UserRole::from_db(&role)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown user role: {}", role).into()))?;
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        role,
        bio: row.try_get("bio")?,
        avatar_url: row.try_get("avatar_url")?,
        created_at: row.try_get("created_at")?,
    })
}

const USER_COLUMNS: &str = "u.id, u.username, u.email, u.role, u.bio, u.avatar_url, u.created_at";

impl RelationshipService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Create a pending follow request from `requester_id` to `target_id`.
    ///
    /// The partial unique index on (requester_id, target_id) WHERE pending is
    /// the backstop for two racing requests: whichever insert loses the race
    /// surfaces as `RequestPending`, same as the pre-check.
    pub async fn request_follow(
        &self,
        requester_id: Uuid,
        target_id: Uuid,
    ) -> Result<FollowRequest, RelationshipError> {
        if requester_id == target_id {
            return Err(RelationshipError::InvalidTarget);
        }

        let mut tx = self.db.pool().begin().await?;

        let target_role: Option<String> =
            sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
                .bind(target_id)
                .fetch_optional(&mut *tx)
                .await?;
        let target_role = target_role
            .as_deref()
            .and_then(UserRole::from_db)
            .ok_or(RelationshipError::InvalidTarget)?;
        if target_role.is_exempt() {
            return Err(RelationshipError::InvalidTarget);
        }

        let blocked: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM blocks WHERE blocker_id = $1 AND blocked_id = $2)",
        )
        .bind(target_id)
        .bind(requester_id)
        .fetch_one(&mut *tx)
        .await?;
        if blocked {
            return Err(RelationshipError::Blocked);
        }

        let following: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM follows WHERE follower_id = $1 AND followed_id = $2)",
        )
        .bind(requester_id)
        .bind(target_id)
        .fetch_one(&mut *tx)
        .await?;
        if following {
            return Err(RelationshipError::AlreadyFollowing);
        }

        let pending: bool = sqlx::query_scalar(
            "SELECT EXISTS ( \
                SELECT 1 FROM follow_requests \
                WHERE requester_id = $1 AND target_id = $2 AND status = 'pending' \
             )",
        )
        .bind(requester_id)
        .bind(target_id)
        .fetch_one(&mut *tx)
        .await?;
        if pending {
            return Err(RelationshipError::RequestPending);
        }

        let row = sqlx::query(
            "INSERT INTO follow_requests (requester_id, target_id) \
             VALUES ($1, $2) \
             RETURNING id, requester_id, target_id, created_at",
        )
        .bind(requester_id)
        .bind(target_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RelationshipError::RequestPending
            }
            _ => RelationshipError::Store(err),
        })?;

        tx.commit().await?;

        Ok(FollowRequest {
            id: row.get("id"),
            requester_id: row.get("requester_id"),
            target_id: row.get("target_id"),
            status: RequestStatus::Pending,
            created_at: row.get("created_at"),
        })
    }

    /// Accept a pending request targeting `target_id` and create the follow
    /// edge in the same transaction. A request that is missing, already
    /// decided, or addressed to someone else is `NotFound`. So is a request
    /// with a block in either direction between the pair: a block after the
    /// request would otherwise let the stale request mint a follow edge next
    /// to the block edge.
    pub async fn accept_follow_request(
        &self,
        request_id: Uuid,
        target_id: Uuid,
    ) -> Result<(), RelationshipError> {
        let mut tx = self.db.pool().begin().await?;

        let row = sqlx::query(
            "UPDATE follow_requests fr \
             SET status = 'accepted', decided_at = now() \
             WHERE fr.id = $1 AND fr.target_id = $2 AND fr.status = 'pending' \
               AND NOT EXISTS ( \
                   SELECT 1 FROM blocks b \
                   WHERE (b.blocker_id = fr.requester_id AND b.blocked_id = fr.target_id) \
                      OR (b.blocker_id = fr.target_id AND b.blocked_id = fr.requester_id) \
               ) \
             RETURNING requester_id, target_id",
        )
        .bind(request_id)
        .bind(target_id)
        .fetch_optional(&mut *tx)
        .await?;
        let row = row.ok_or(RelationshipError::NotFound)?;

        let requester_id: Uuid = row.get("requester_id");
        let followed_id: Uuid = row.get("target_id");
        sqlx::query(
            "INSERT INTO follows (follower_id, followed_id) \
             VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(requester_id)
        .bind(followed_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn reject_follow_request(
        &self,
        request_id: Uuid,
        target_id: Uuid,
    ) -> Result<(), RelationshipError> {
        let result = sqlx::query(
            "UPDATE follow_requests \
             SET status = 'rejected', decided_at = now() \
             WHERE id = $1 AND target_id = $2 AND status = 'pending'",
        )
        .bind(request_id)
        .bind(target_id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RelationshipError::NotFound);
        }
        Ok(())
    }

    /// Remove an active follow edge. Not idempotent: a second unfollow is
    /// `NotFound`, so callers can tell "nothing to undo" from success.
    pub async fn unfollow(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> Result<(), RelationshipError> {
        let result = sqlx::query(
            "DELETE FROM follows WHERE follower_id = $1 AND followed_id = $2",
        )
        .bind(follower_id)
        .bind(followed_id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RelationshipError::NotFound);
        }
        Ok(())
    }

    /// Idempotent upsert of the block edge. Side effects in one transaction:
    /// follow edges in both directions are removed (the blocker's own follow
    /// is superseded by the block, the blocked party's follow is cancelled),
    /// and pending requests from the blocked party are withdrawn.
    pub async fn block(
        &self,
        blocker_id: Uuid,
        blocked_id: Uuid,
    ) -> Result<(), RelationshipError> {
        if blocker_id == blocked_id {
            return Err(RelationshipError::InvalidTarget);
        }

        let mut tx = self.db.pool().begin().await?;

        sqlx::query(
            "INSERT INTO blocks (blocker_id, blocked_id) \
             VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(blocker_id)
        .bind(blocked_id)
        .execute(&mut *tx)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                RelationshipError::InvalidTarget
            }
            _ => RelationshipError::Store(err),
        })?;

        sqlx::query(
            "DELETE FROM follows \
             WHERE (follower_id = $1 AND followed_id = $2) \
                OR (follower_id = $2 AND followed_id = $1)",
        )
        .bind(blocker_id)
        .bind(blocked_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM follow_requests \
             WHERE requester_id = $1 AND target_id = $2 AND status = 'pending'",
        )
        .bind(blocked_id)
        .bind(blocker_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Remove a block edge. The pair returns to no relationship; a follow
    /// that existed before the block is not restored.
    pub async fn unblock(
        &self,
        blocker_id: Uuid,
        blocked_id: Uuid,
    ) -> Result<(), RelationshipError> {
        let result = sqlx::query(
            "DELETE FROM blocks WHERE blocker_id = $1 AND blocked_id = $2",
        )
        .bind(blocker_id)
        .bind(blocked_id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RelationshipError::NotFound);
        }
        Ok(())
    }

    pub async fn list_followers(
        &self,
        user_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<SocialUserEdge>, RelationshipError> {
        let rows = match cursor {
            Some((created_at, follower_id)) => {
                sqlx::query(&format!(
                    "SELECT {USER_COLUMNS}, f.created_at AS since \
                     FROM follows f \
                     JOIN users u ON u.id = f.follower_id \
                     WHERE f.followed_id = $1 \
                       AND (f.created_at < $2 OR (f.created_at = $2 AND f.follower_id < $3)) \
                     ORDER BY f.created_at DESC, f.follower_id DESC \
                     LIMIT $4",
                ))
                .bind(user_id)
                .bind(created_at)
                .bind(follower_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {USER_COLUMNS}, f.created_at AS since \
                     FROM follows f \
                     JOIN users u ON u.id = f.follower_id \
                     WHERE f.followed_id = $1 \
                     ORDER BY f.created_at DESC, f.follower_id DESC \
                     LIMIT $2",
                ))
                .bind(user_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(SocialUserEdge {
                user: user_from_row(&row)?,
                since: row.get("since"),
            });
        }
        Ok(items)
    }

    pub async fn list_following(
        &self,
        user_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<SocialUserEdge>, RelationshipError> {
        let rows = match cursor {
            Some((created_at, followed_id)) => {
                sqlx::query(&format!(
                    "SELECT {USER_COLUMNS}, f.created_at AS since \
                     FROM follows f \
                     JOIN users u ON u.id = f.followed_id \
                     WHERE f.follower_id = $1 \
                       AND (f.created_at < $2 OR (f.created_at = $2 AND f.followed_id < $3)) \
                     ORDER BY f.created_at DESC, f.followed_id DESC \
                     LIMIT $4",
                ))
                .bind(user_id)
                .bind(created_at)
                .bind(followed_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {USER_COLUMNS}, f.created_at AS since \
                     FROM follows f \
                     JOIN users u ON u.id = f.followed_id \
                     WHERE f.follower_id = $1 \
                     ORDER BY f.created_at DESC, f.followed_id DESC \
                     LIMIT $2",
                ))
                .bind(user_id)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(SocialUserEdge {
                user: user_from_row(&row)?,
                since: row.get("since"),
            });
        }
        Ok(items)
    }

    /// Users that `user_id` has blocked.
    pub async fn list_blocked(&self, user_id: Uuid) -> Result<Vec<SocialUserEdge>, RelationshipError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS}, b.created_at AS since \
             FROM blocks b \
             JOIN users u ON u.id = b.blocked_id \
             WHERE b.blocker_id = $1 \
             ORDER BY b.created_at DESC, b.blocked_id DESC",
        ))
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(SocialUserEdge {
                user: user_from_row(&row)?,
                since: row.get("since"),
            });
        }
        Ok(items)
    }

    /// Users that have blocked `user_id`.
    pub async fn list_blocked_by(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<SocialUserEdge>, RelationshipError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS}, b.created_at AS since \
             FROM blocks b \
             JOIN users u ON u.id = b.blocker_id \
             WHERE b.blocked_id = $1 \
             ORDER BY b.created_at DESC, b.blocker_id DESC",
        ))
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(SocialUserEdge {
                user: user_from_row(&row)?,
                since: row.get("since"),
            });
        }
        Ok(items)
    }

    /// Pending follow requests addressed to `user_id`, newest first.
    pub async fn list_pending(&self, user_id: Uuid) -> Result<Vec<PendingRequest>, RelationshipError> {
        let rows = sqlx::query(&format!(
            "SELECT fr.id AS request_id, fr.created_at AS requested_at, {USER_COLUMNS} \
             FROM follow_requests fr \
             JOIN users u ON u.id = fr.requester_id \
             WHERE fr.target_id = $1 AND fr.status = 'pending' \
             ORDER BY fr.created_at DESC, fr.id DESC",
        ))
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(PendingRequest {
                id: row.get("request_id"),
                requester: user_from_row(&row)?,
                created_at: row.get("requested_at"),
            });
        }
        Ok(items)
    }

    pub async fn relationship_status(
        &self,
        viewer_id: Uuid,
        other_id: Uuid,
    ) -> Result<RelationshipStatus, RelationshipError> {
        let row = sqlx::query(
            "SELECT \
                EXISTS (SELECT 1 FROM follows WHERE follower_id = $1 AND followed_id = $2) AS is_following, \
                EXISTS (SELECT 1 FROM follows WHERE follower_id = $2 AND followed_id = $1) AS is_followed_by, \
                EXISTS (SELECT 1 FROM blocks WHERE blocker_id = $1 AND blocked_id = $2) AS is_blocking, \
                EXISTS (SELECT 1 FROM blocks WHERE blocker_id = $2 AND blocked_id = $1) AS is_blocked_by, \
                EXISTS (SELECT 1 FROM follow_requests \
                        WHERE requester_id = $1 AND target_id = $2 AND status = 'pending') AS has_pending_request",
        )
        .bind(viewer_id)
        .bind(other_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(RelationshipStatus {
            is_following: row.get("is_following"),
            is_followed_by: row.get("is_followed_by"),
            is_blocking: row.get("is_blocking"),
            is_blocked_by: row.get("is_blocked_by"),
            has_pending_request: row.get("has_pending_request"),
        })
    }
}
