use crate::domain::category::{Category, CategoryChanges, NewCategory};
use crate::domain::error::DomainError;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, category: NewCategory) -> Result<Category, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, DomainError>;
    async fn list(&self) -> Result<Vec<Category>, DomainError>;
    async fn update(
        &self,
        id: i64,
        changes: CategoryChanges,
    ) -> Result<Option<Category>, DomainError>;
    /// Removes the category together with every blog filed under it.
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
}

#[derive(Clone)]
pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn create(&self, category: NewCategory) -> Result<Category, DomainError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name)
            VALUES ($1)
            RETURNING id, name, created_at
            "#,
        )
        .bind(&category.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create category: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })?;

        info!(category_id = category.id, "category created");
        Ok(category)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, DomainError> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, created_at
            FROM categories WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("db error find_by_id {}: {}", id, e);
            DomainError::Internal(e.to_string())
        })
    }

    async fn list(&self) -> Result<Vec<Category>, DomainError> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, created_at
            FROM categories
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while fetching categories: {}", e);
            DomainError::Internal(e.to_string())
        })
    }

    async fn update(
        &self,
        id: i64,
        changes: CategoryChanges,
    ) -> Result<Option<Category>, DomainError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = COALESCE($1, name)
            WHERE id = $2
            RETURNING id, name, created_at
            "#,
        )
        .bind(changes.name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to update category {}: {}", id, e);
            DomainError::Internal(e.to_string())
        })?;

        if category.is_some() {
            info!(category_id = id, "category updated");
        }

        Ok(category)
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        // blogs go with it through ON DELETE CASCADE
        let deleted = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("failed to delete category {}: {}", id, e);
                DomainError::Internal(e.to_string())
            })?;

        if deleted.rows_affected() == 0 {
            return Err(DomainError::CategoryNotFound(id));
        }

        info!(category_id = id, "category deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::blog_repository::{BlogRepository, PostgresBlogRepository};
    use crate::domain::blog::NewBlog;

    fn repo(pool: &PgPool) -> PostgresCategoryRepository {
        PostgresCategoryRepository::new(pool.clone())
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn list_follows_insertion_order(pool: PgPool) {
        let categories = repo(&pool);
        for name in ["Zeta", "Alpha"] {
            categories.create(NewCategory { name: name.into() }).await.unwrap();
        }

        let names: Vec<_> = categories
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["Zeta", "Alpha"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn empty_change_set_keeps_row(pool: PgPool) {
        let categories = repo(&pool);
        let created = categories
            .create(NewCategory { name: "Rust".into() })
            .await
            .unwrap();

        let kept = categories
            .update(created.id, CategoryChanges::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.name, "Rust");
        assert_eq!(kept.created_at, created.created_at);

        assert!(
            categories
                .update(created.id + 100, CategoryChanges { name: Some("x".into()) })
                .await
                .unwrap()
                .is_none()
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn delete_cascades_to_blogs(pool: PgPool) {
        let categories = repo(&pool);
        let blogs = PostgresBlogRepository::new(pool.clone());
        let doomed = categories
            .create(NewCategory { name: "Doomed".into() })
            .await
            .unwrap();
        let blog = blogs
            .create(NewBlog {
                title: "Gone".into(),
                description: "soon".into(),
                author: "ferris".into(),
                image: "blog_images/gone.png".into(),
                category_id: doomed.id,
                is_published: false,
            })
            .await
            .unwrap();

        categories.delete(doomed.id).await.unwrap();

        assert!(blogs.find_by_id(blog.id).await.unwrap().is_none());
        assert!(categories.find_by_id(doomed.id).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn deleting_missing_category_is_not_found(pool: PgPool) {
        let err = repo(&pool).delete(404).await.unwrap_err();
        assert!(matches!(err, DomainError::CategoryNotFound(404)));
    }
}
