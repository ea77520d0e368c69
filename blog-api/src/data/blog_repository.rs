use crate::domain::blog::{Blog, BlogChanges, NewBlog};
use crate::domain::error::DomainError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{error, info};

const BLOG_COLUMNS: &str =
    "id, title, description, author, published_date, image, category_id, is_published, updated_at";

const CATEGORY_FOREIGN_KEY: &str = "blogs_category_id_fkey";

#[async_trait]
pub trait BlogRepository: Send + Sync {
    async fn create(&self, blog: NewBlog) -> Result<Blog, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Blog>, DomainError>;
    async fn list(&self) -> Result<Vec<Blog>, DomainError>;
    async fn list_by_category(&self, category_id: i64) -> Result<Vec<Blog>, DomainError>;
    /// Applies `changes` and refreshes `updated_at`, even when the change set is empty.
    async fn update(&self, id: i64, changes: BlogChanges) -> Result<Option<Blog>, DomainError>;
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
}

#[derive(Clone)]
pub struct PostgresBlogRepository {
    pool: PgPool,
}

impl PostgresBlogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// A category removed between validation and the write trips the foreign key;
/// report it against the field rather than as a storage failure.
fn map_write_error(e: sqlx::Error, category_id: Option<i64>) -> DomainError {
    let violates_category = e
        .as_database_error()
        .and_then(|db| db.constraint())
        .map(|c| c == CATEGORY_FOREIGN_KEY)
        == Some(true);

    match (violates_category, category_id) {
        (true, Some(id)) => DomainError::field(
            "category",
            format!("Invalid pk \"{}\" - object does not exist.", id),
        ),
        _ => {
            error!("failed to write blog: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        }
    }
}

#[async_trait]
impl BlogRepository for PostgresBlogRepository {
    async fn create(&self, blog: NewBlog) -> Result<Blog, DomainError> {
        let now = Utc::now();
        let blog = sqlx::query_as::<_, Blog>(&format!(
            r#"
            INSERT INTO blogs
                (title, description, author, published_date, image, category_id, is_published, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $4)
            RETURNING {BLOG_COLUMNS}
            "#
        ))
        .bind(&blog.title)
        .bind(&blog.description)
        .bind(&blog.author)
        .bind(now)
        .bind(&blog.image)
        .bind(blog.category_id)
        .bind(blog.is_published)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, Some(blog.category_id)))?;

        info!(blog_id = blog.id, category_id = blog.category_id, "blog created");
        Ok(blog)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Blog>, DomainError> {
        sqlx::query_as::<_, Blog>(&format!("SELECT {BLOG_COLUMNS} FROM blogs WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("db error find_by_id {}: {}", id, e);
                DomainError::Internal(e.to_string())
            })
    }

    async fn list(&self) -> Result<Vec<Blog>, DomainError> {
        sqlx::query_as::<_, Blog>(&format!("SELECT {BLOG_COLUMNS} FROM blogs ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("db error while fetching blogs: {}", e);
                DomainError::Internal(e.to_string())
            })
    }

    async fn list_by_category(&self, category_id: i64) -> Result<Vec<Blog>, DomainError> {
        sqlx::query_as::<_, Blog>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blogs WHERE category_id = $1 ORDER BY id"
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while fetching blogs of category {}: {}", category_id, e);
            DomainError::Internal(e.to_string())
        })
    }

    async fn update(&self, id: i64, changes: BlogChanges) -> Result<Option<Blog>, DomainError> {
        let now = Utc::now();
        let category_id = changes.category_id;
        let blog = sqlx::query_as::<_, Blog>(&format!(
            r#"
            UPDATE blogs
            SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                author = COALESCE($3, author),
                image = COALESCE($4, image),
                category_id = COALESCE($5, category_id),
                is_published = COALESCE($6, is_published),
                updated_at = $7
            WHERE id = $8
            RETURNING {BLOG_COLUMNS}
            "#
        ))
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.author)
        .bind(changes.image)
        .bind(changes.category_id)
        .bind(changes.is_published)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, category_id))?;

        if blog.is_some() {
            info!(blog_id = id, "blog updated");
        }

        Ok(blog)
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let deleted = sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        if deleted.rows_affected() == 0 {
            return Err(DomainError::BlogNotFound(id));
        }

        info!(blog_id = id, "blog deleted");
        Ok(())
    }
}
