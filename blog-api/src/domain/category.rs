use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Validated input for inserting a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
}

/// Column-wise change set; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
}
