use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::dream::{Dream, DreamCategory};
use crate::domain::user::UserRole;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct FeedService {
    db: Db,
}

pub(crate) fn dream_from_row(row: &PgRow) -> Result<Dream> {
    let category: String = row.try_get("category")?;
    let category = DreamCategory::from_db(&category)
        .ok_or_else(|| anyhow::anyhow!("unknown dream category: {}", category))?;
    Ok(Dream {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        owner_username: Some(row.try_get("owner_username")?),
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        category,
        is_public: row.try_get("is_public")?,
        created_at: row.try_get("created_at")?,
    })
}

impl FeedService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Dreams visible to the viewer, newest first. Recomputed from the
    /// current edge state on every call; nothing is cached or materialized.
    ///
    /// Exempt (admin) viewers see everything. Everyone else sees dreams that
    /// are public, their own, or from accounts they follow, minus anything
    /// owned by a user who has blocked them.
    pub async fn visible_dreams(
        &self,
        viewer_id: Uuid,
        viewer_role: UserRole,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Dream>> {
        let rows = if viewer_role.is_exempt() {
            match cursor {
                Some((created_at, dream_id)) => {
                    sqlx::query(
                        "SELECT d.id, d.owner_id, u.username AS owner_username, \
                                d.title, d.content, d.category, d.is_public, d.created_at \
                         FROM dreams d \
                         JOIN users u ON u.id = d.owner_id \
                         WHERE d.created_at < $1 OR (d.created_at = $1 AND d.id < $2) \
                         ORDER BY d.created_at DESC, d.id DESC \
                         LIMIT $3",
                    )
                    .bind(created_at)
                    .bind(dream_id)
                    .bind(limit)
                    .fetch_all(self.db.pool())
                    .await?
                }
                None => {
                    sqlx::query(
                        "SELECT d.id, d.owner_id, u.username AS owner_username, \
                                d.title, d.content, d.category, d.is_public, d.created_at \
                         FROM dreams d \
                         JOIN users u ON u.id = d.owner_id \
                         ORDER BY d.created_at DESC, d.id DESC \
                         LIMIT $1",
                    )
                    .bind(limit)
                    .fetch_all(self.db.pool())
                    .await?
                }
            }
        } else {
            match cursor {
                Some((created_at, dream_id)) => {
                    sqlx::query(
                        "SELECT d.id, d.owner_id, u.username AS owner_username, \
                                d.title, d.content, d.category, d.is_public, d.created_at \
                         FROM dreams d \
                         JOIN users u ON u.id = d.owner_id \
                         WHERE (d.is_public \
                                OR d.owner_id = $1 \
                                OR d.owner_id IN ( \
                                    SELECT followed_id FROM follows WHERE follower_id = $1 \
                                )) \
                           AND NOT EXISTS ( \
                               SELECT 1 FROM blocks \
                               WHERE blocker_id = d.owner_id AND blocked_id = $1 \
                           ) \
                           AND (d.created_at < $2 OR (d.created_at = $2 AND d.id < $3)) \
                         ORDER BY d.created_at DESC, d.id DESC \
                         LIMIT $4",
                    )
                    .bind(viewer_id)
                    .bind(created_at)
                    .bind(dream_id)
                    .bind(limit)
                    .fetch_all(self.db.pool())
                    .await?
                }
                None => {
                    sqlx::query(
                        "SELECT d.id, d.owner_id, u.username AS owner_username, \
                                d.title, d.content, d.category, d.is_public, d.created_at \
                         FROM dreams d \
                         JOIN users u ON u.id = d.owner_id \
                         WHERE (d.is_public \
                                OR d.owner_id = $1 \
                                OR d.owner_id IN ( \
                                    SELECT followed_id FROM follows WHERE follower_id = $1 \
                                )) \
                           AND NOT EXISTS ( \
                               SELECT 1 FROM blocks \
                               WHERE blocker_id = d.owner_id AND blocked_id = $1 \
                           ) \
                         ORDER BY d.created_at DESC, d.id DESC \
                         LIMIT $2",
                    )
                    .bind(viewer_id)
                    .bind(limit)
                    .fetch_all(self.db.pool())
                    .await?
                }
            }
        };

        let mut dreams = Vec::with_capacity(rows.len());
        for row in rows {
            dreams.push(dream_from_row(&row)?);
        }
        Ok(dreams)
    }
}
