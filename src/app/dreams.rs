use anyhow::Result;
use uuid::Uuid;

use crate::app::feed::dream_from_row;
use crate::domain::dream::{Dream, DreamCategory};
use crate::domain::user::UserRole;
use crate::infra::db::Db;

/// Outcome of an ownership-gated delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Forbidden,
    NotFound,
}

#[derive(Clone)]
pub struct DreamService {
    db: Db,
}

impl DreamService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create_dream(
        &self,
        owner_id: Uuid,
        title: String,
        content: String,
        category: DreamCategory,
        is_public: bool,
    ) -> Result<Dream> {
        let row = sqlx::query(
            "WITH inserted_dream AS ( \
                INSERT INTO dreams (owner_id, title, content, category, is_public) \
                VALUES ($1, $2, $3, $4, $5) \
                RETURNING id, owner_id, title, content, category, is_public, created_at \
             ) \
             SELECT d.*, u.username AS owner_username \
             FROM inserted_dream d \
             JOIN users u ON u.id = d.owner_id",
        )
        .bind(owner_id)
        .bind(title)
        .bind(content)
        .bind(category.as_db())
        .bind(is_public)
        .fetch_one(self.db.pool())
        .await?;

        dream_from_row(&row)
    }

    /// Fetch a single dream, applying the same visibility rule as the feed:
    /// exempt viewers see any dream, others only public dreams, their own,
    /// or followed users' dreams, and never a dream whose owner blocked them.
    pub async fn get_dream(
        &self,
        dream_id: Uuid,
        viewer_id: Uuid,
        viewer_role: UserRole,
    ) -> Result<Option<Dream>> {
        let row = if viewer_role.is_exempt() {
            sqlx::query(
                "SELECT d.id, d.owner_id, u.username AS owner_username, \
                        d.title, d.content, d.category, d.is_public, d.created_at \
                 FROM dreams d \
                 JOIN users u ON u.id = d.owner_id \
                 WHERE d.id = $1",
            )
            .bind(dream_id)
            .fetch_optional(self.db.pool())
            .await?
        } else {
            sqlx::query(
                "SELECT d.id, d.owner_id, u.username AS owner_username, \
                        d.title, d.content, d.category, d.is_public, d.created_at \
                 FROM dreams d \
                 JOIN users u ON u.id = d.owner_id \
                 WHERE d.id = $1 \
                   AND (d.is_public \
                        OR d.owner_id = $2 \
                        OR d.owner_id IN ( \
                            SELECT followed_id FROM follows WHERE follower_id = $2 \
                        )) \
                   AND NOT EXISTS ( \
                       SELECT 1 FROM blocks \
                       WHERE blocker_id = d.owner_id AND blocked_id = $2 \
                   )",
            )
            .bind(dream_id)
            .bind(viewer_id)
            .fetch_optional(self.db.pool())
            .await?
        };

        row.map(|row| dream_from_row(&row)).transpose()
    }

    /// Owners delete their own dreams; admins delete anyone's.
    pub async fn delete_dream(
        &self,
        dream_id: Uuid,
        requester_id: Uuid,
        requester_role: UserRole,
    ) -> Result<DeleteOutcome> {
        let owner_id: Option<Uuid> =
            sqlx::query_scalar("SELECT owner_id FROM dreams WHERE id = $1")
                .bind(dream_id)
                .fetch_optional(self.db.pool())
                .await?;

        let Some(owner_id) = owner_id else {
            return Ok(DeleteOutcome::NotFound);
        };
        if owner_id != requester_id && !requester_role.is_exempt() {
            return Ok(DeleteOutcome::Forbidden);
        }

        sqlx::query("DELETE FROM dreams WHERE id = $1")
            .bind(dream_id)
            .execute(self.db.pool())
            .await?;

        Ok(DeleteOutcome::Deleted)
    }

    /// Dreams owned by one user, visibility-filtered for the viewer. The
    /// owner and exempt viewers see the full list, private dreams included.
    pub async fn list_by_user(
        &self,
        owner_id: Uuid,
        viewer_id: Uuid,
        viewer_role: UserRole,
        limit: i64,
    ) -> Result<Vec<Dream>> {
        let rows = if viewer_id == owner_id || viewer_role.is_exempt() {
            sqlx::query(
                "SELECT d.id, d.owner_id, u.username AS owner_username, \
                        d.title, d.content, d.category, d.is_public, d.created_at \
                 FROM dreams d \
                 JOIN users u ON u.id = d.owner_id \
                 WHERE d.owner_id = $1 \
                 ORDER BY d.created_at DESC, d.id DESC \
                 LIMIT $2",
            )
            .bind(owner_id)
            .bind(limit)
            .fetch_all(self.db.pool())
            .await?
        } else {
            sqlx::query(
                "SELECT d.id, d.owner_id, u.username AS owner_username, \
                        d.title, d.content, d.category, d.is_public, d.created_at \
                 FROM dreams d \
                 JOIN users u ON u.id = d.owner_id \
                 WHERE d.owner_id = $1 \
                   AND (d.is_public OR d.owner_id IN ( \
                        SELECT followed_id FROM follows WHERE follower_id = $2 \
                   )) \
                   AND NOT EXISTS ( \
                       SELECT 1 FROM blocks \
                       WHERE blocker_id = d.owner_id AND blocked_id = $2 \
                   ) \
                 ORDER BY d.created_at DESC, d.id DESC \
                 LIMIT $3",
            )
            .bind(owner_id)
            .bind(viewer_id)
            .bind(limit)
            .fetch_all(self.db.pool())
            .await?
        };

        let mut dreams = Vec::with_capacity(rows.len());
        for row in rows {
            dreams.push(dream_from_row(&row)?);
        }
        Ok(dreams)
    }
}
