use anyhow::Result;
use sqlx::Row;
use uuid::Uuid;

use crate::app::dreams::DeleteOutcome;
use crate::domain::engagement::{Comment, Like, UserComment};
use crate::domain::user::UserRole;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct EngagementService {
    db: Db,
}

impl EngagementService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Flip the viewer's like on a dream. Returns `None` when the dream does
    /// not exist, otherwise the new liked state and the resulting like count.
    pub async fn toggle_like(
        &self,
        user_id: Uuid,
        dream_id: Uuid,
    ) -> Result<Option<(bool, i64)>> {
        let mut tx = self.db.pool().begin().await?;

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM dreams WHERE id = $1)")
                .bind(dream_id)
                .fetch_one(&mut *tx)
                .await?;
        if !exists {
            return Ok(None);
        }

        let removed = sqlx::query(
            "DELETE FROM likes WHERE dream_id = $1 AND user_id = $2",
        )
        .bind(dream_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let liked = if removed.rows_affected() == 0 {
            sqlx::query(
                "INSERT INTO likes (dream_id, user_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(dream_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
            true
        } else {
            false
        };

        let like_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE dream_id = $1")
                .bind(dream_id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(Some((liked, like_count)))
    }

    pub async fn list_likes(&self, dream_id: Uuid) -> Result<Vec<Like>> {
        let rows = sqlx::query(
            "SELECT l.id, l.dream_id, l.user_id, u.username, l.created_at \
             FROM likes l \
             JOIN users u ON u.id = l.user_id \
             WHERE l.dream_id = $1 \
             ORDER BY l.created_at DESC, l.id DESC",
        )
        .bind(dream_id)
        .fetch_all(self.db.pool())
        .await?;

        let mut likes = Vec::with_capacity(rows.len());
        for row in rows {
            likes.push(Like {
                id: row.get("id"),
                dream_id: row.get("dream_id"),
                user_id: row.get("user_id"),
                username: Some(row.get("username")),
                created_at: row.get("created_at"),
            });
        }
        Ok(likes)
    }

    /// Returns `None` when the dream does not exist.
    pub async fn add_comment(
        &self,
        user_id: Uuid,
        dream_id: Uuid,
        body: String,
    ) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "WITH inserted_comment AS ( \
                INSERT INTO comments (dream_id, user_id, body) \
                SELECT $1, $2, $3 \
                WHERE EXISTS (SELECT 1 FROM dreams WHERE id = $1) \
                RETURNING id, dream_id, user_id, body, created_at \
             ) \
             SELECT c.*, u.username \
             FROM inserted_comment c \
             JOIN users u ON u.id = c.user_id",
        )
        .bind(dream_id)
        .bind(user_id)
        .bind(body)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| Comment {
            id: row.get("id"),
            dream_id: row.get("dream_id"),
            user_id: row.get("user_id"),
            username: Some(row.get("username")),
            body: row.get("body"),
            created_at: row.get("created_at"),
        }))
    }

    /// Comments on a dream, oldest first (thread order).
    pub async fn list_comments(&self, dream_id: Uuid) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            "SELECT c.id, c.dream_id, c.user_id, u.username, c.body, c.created_at \
             FROM comments c \
             JOIN users u ON u.id = c.user_id \
             WHERE c.dream_id = $1 \
             ORDER BY c.created_at ASC, c.id ASC",
        )
        .bind(dream_id)
        .fetch_all(self.db.pool())
        .await?;

        let mut comments = Vec::with_capacity(rows.len());
        for row in rows {
            comments.push(Comment {
                id: row.get("id"),
                dream_id: row.get("dream_id"),
                user_id: row.get("user_id"),
                username: Some(row.get("username")),
                body: row.get("body"),
                created_at: row.get("created_at"),
            });
        }
        Ok(comments)
    }

    /// One user's comments across dreams, newest first, for the profile
    /// page. Comments on dreams the viewer cannot see are filtered out with
    /// the same predicate that guards the dreams themselves.
    pub async fn list_by_user(
        &self,
        author_id: Uuid,
        viewer_id: Uuid,
        viewer_role: UserRole,
        limit: i64,
    ) -> Result<Vec<UserComment>> {
        let rows = if viewer_role.is_exempt() {
            sqlx::query(
                "SELECT c.id, c.dream_id, d.title AS dream_title, c.body, c.created_at \
                 FROM comments c \
                 JOIN dreams d ON d.id = c.dream_id \
                 WHERE c.user_id = $1 \
                 ORDER BY c.created_at DESC, c.id DESC \
                 LIMIT $2",
            )
            .bind(author_id)
            .bind(limit)
            .fetch_all(self.db.pool())
            .await?
        } else {
            sqlx::query(
                "SELECT c.id, c.dream_id, d.title AS dream_title, c.body, c.created_at \
                 FROM comments c \
                 JOIN dreams d ON d.id = c.dream_id \
                 WHERE c.user_id = $1 \
                   AND (d.is_public \
                        OR d.owner_id = $2 \
                        OR d.owner_id IN ( \
                            SELECT followed_id FROM follows WHERE follower_id = $2 \
                        )) \
                   AND NOT EXISTS ( \
                       SELECT 1 FROM blocks \
                       WHERE blocker_id = d.owner_id AND blocked_id = $2 \
                   ) \
                 ORDER BY c.created_at DESC, c.id DESC \
                 LIMIT $3",
            )
            .bind(author_id)
            .bind(viewer_id)
            .bind(limit)
            .fetch_all(self.db.pool())
            .await?
        };

        let mut comments = Vec::with_capacity(rows.len());
        for row in rows {
            comments.push(UserComment {
                id: row.get("id"),
                dream_id: row.get("dream_id"),
                dream_title: row.get("dream_title"),
                body: row.get("body"),
                created_at: row.get("created_at"),
            });
        }
        Ok(comments)
    }

    /// Authors delete their own comments; admins delete anyone's.
    pub async fn delete_comment(
        &self,
        comment_id: Uuid,
        requester_id: Uuid,
        requester_role: UserRole,
    ) -> Result<DeleteOutcome> {
        let author_id: Option<Uuid> =
            sqlx::query_scalar("SELECT user_id FROM comments WHERE id = $1")
                .bind(comment_id)
                .fetch_optional(self.db.pool())
                .await?;

        let Some(author_id) = author_id else {
            return Ok(DeleteOutcome::NotFound);
        };
        if author_id != requester_id && !requester_role.is_exempt() {
            return Ok(DeleteOutcome::Forbidden);
        }

        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(self.db.pool())
            .await?;

        Ok(DeleteOutcome::Deleted)
    }
}
