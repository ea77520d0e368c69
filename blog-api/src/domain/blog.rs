use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Blog {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub author: String,
    pub published_date: DateTime<Utc>,
    /// Path relative to the media root, e.g. `blog_images/<uuid>_cover.png`.
    pub image: String,
    pub category_id: i64,
    pub is_published: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBlog {
    pub title: String,
    pub description: String,
    pub author: String,
    pub image: String,
    pub category_id: i64,
    pub is_published: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BlogChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub image: Option<String>,
    pub category_id: Option<i64>,
    pub is_published: Option<bool>,
}
