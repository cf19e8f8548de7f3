use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub dream_id: Uuid,
    pub user_id: Uuid,
    pub username: Option<String>,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A user's comment as shown on their profile, carrying the dream title
/// instead of the author fields.
#[derive(Debug, Clone, Serialize)]
pub struct UserComment {
    pub id: Uuid,
    pub dream_id: Uuid,
    pub dream_title: String,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: Uuid,
    pub dream_id: Uuid,
    pub user_id: Uuid,
    pub username: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
