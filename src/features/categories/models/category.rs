use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Flat category row as loaded from storage.
///
/// `post_count` is not a column; it is aggregated from `blog_post_categories`
/// by every query that loads categories.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub post_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
