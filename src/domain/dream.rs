use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dream {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_username: Option<String>,
    pub title: String,
    pub content: String,
    pub category: DreamCategory,
    pub is_public: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DreamCategory {
    Scary,
    Funny,
    Adventure,
    Fantasy,
    Other,
}

impl DreamCategory {
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "scary" => Some(Self::Scary),
            "funny" => Some(Self::Funny),
            "adventure" => Some(Self::Adventure),
            "fantasy" => Some(Self::Fantasy),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Scary => "scary",
            Self::Funny => "funny",
            Self::Adventure => "adventure",
            Self::Fantasy => "fantasy",
            Self::Other => "other",
        }
    }
}
