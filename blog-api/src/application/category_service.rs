use std::sync::Arc;

use crate::data::blog_repository::BlogRepository;
use crate::data::category_repository::CategoryRepository;
use crate::domain::blog::Blog;
use crate::domain::category::Category;
use crate::domain::error::DomainError;
use crate::presentation::dto::CategoryPayload;
use tracing::instrument;

#[derive(Clone)]
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
    blogs: Arc<dyn BlogRepository>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>, blogs: Arc<dyn BlogRepository>) -> Self {
        Self { repo, blogs }
    }

    pub async fn get_category(&self, id: i64) -> Result<Category, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::CategoryNotFound(id))
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        self.repo.list().await
    }

    #[instrument(skip(self))]
    pub async fn create_category(&self, payload: CategoryPayload) -> Result<Category, DomainError> {
        self.repo.create(payload.into_new()?).await
    }

    /// PUT replaces every writable field; PATCH passes a partial payload and
    /// only touches what it carries.
    #[instrument(skip(self))]
    pub async fn update_category(
        &self,
        id: i64,
        payload: CategoryPayload,
    ) -> Result<Category, DomainError> {
        self.repo
            .update(id, payload.into_changes())
            .await?
            .ok_or(DomainError::CategoryNotFound(id))
    }

    /// Blogs that a deletion of `id` would take with it.
    pub async fn dependent_blogs(&self, id: i64) -> Result<Vec<Blog>, DomainError> {
        self.get_category(id).await?;
        self.blogs.list_by_category(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: i64) -> Result<(), DomainError> {
        self.repo.delete(id).await
    }
}
