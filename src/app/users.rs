use anyhow::Result;
use uuid::Uuid;

use crate::app::relationship::user_from_row;
use crate::domain::user::User;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct UserService {
    db: Db,
}

impl UserService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, email, role, bio, avatar_url, created_at \
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(|row| user_from_row(&row))
            .transpose()
            .map_err(Into::into)
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        bio: Option<String>,
        avatar_url: Option<String>,
    ) -> Result<Option<User>> {
        let row = sqlx::query(
            "UPDATE users \
             SET bio = COALESCE($2, bio), \
                 avatar_url = COALESCE($3, avatar_url) \
             WHERE id = $1 \
             RETURNING id, username, email, role, bio, avatar_url, created_at",
        )
        .bind(user_id)
        .bind(bio)
        .bind(avatar_url)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(|row| user_from_row(&row))
            .transpose()
            .map_err(Into::into)
    }

    pub async fn search(&self, query: &str, limit: i64) -> Result<Vec<User>> {
        let pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));
        let rows = sqlx::query(
            "SELECT id, username, email, role, bio, avatar_url, created_at \
             FROM users \
             WHERE username ILIKE $1 OR email ILIKE $1 \
             ORDER BY username ASC \
             LIMIT $2",
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            users.push(user_from_row(&row)?);
        }
        Ok(users)
    }

    /// Every user except the viewer, for the follow-discovery page.
    pub async fn list_all(&self, excluding: Uuid) -> Result<Vec<User>> {
        let rows = sqlx::query(
            "SELECT id, username, email, role, bio, avatar_url, created_at \
             FROM users \
             WHERE id <> $1 \
             ORDER BY username ASC",
        )
        .bind(excluding)
        .fetch_all(self.db.pool())
        .await?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            users.push(user_from_row(&row)?);
        }
        Ok(users)
    }
}
