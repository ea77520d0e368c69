use std::sync::Arc;

use crate::data::blog_repository::BlogRepository;
use crate::data::category_repository::CategoryRepository;
use crate::domain::blog::{Blog, NewBlog};
use crate::domain::error::DomainError;
use crate::infrastructure::media::{BLOG_IMAGE_DIR, MediaStorage};
use crate::presentation::dto::{BlogPayload, REQUIRED};
use tracing::instrument;

#[derive(Clone)]
pub struct BlogService {
    repo: Arc<dyn BlogRepository>,
    categories: Arc<dyn CategoryRepository>,
    media: MediaStorage,
}

impl BlogService {
    pub fn new(
        repo: Arc<dyn BlogRepository>,
        categories: Arc<dyn CategoryRepository>,
        media: MediaStorage,
    ) -> Self {
        Self {
            repo,
            categories,
            media,
        }
    }

    pub fn media(&self) -> &MediaStorage {
        &self.media
    }

    pub async fn get_blog(&self, id: i64) -> Result<Blog, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::BlogNotFound(id))
    }

    pub async fn list_blogs(&self) -> Result<Vec<Blog>, DomainError> {
        self.repo.list().await
    }

    async fn ensure_category(&self, category_id: i64) -> Result<(), DomainError> {
        match self.categories.find_by_id(category_id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::field(
                "category",
                format!("Invalid pk \"{}\" - object does not exist.", category_id),
            )),
        }
    }

    #[instrument(skip(self, payload))]
    pub async fn create_blog(&self, payload: BlogPayload) -> Result<Blog, DomainError> {
        let (changes, upload) = payload.into_parts();
        let category_id = changes
            .category_id
            .ok_or_else(|| DomainError::field("category", REQUIRED))?;
        self.ensure_category(category_id).await?;

        let upload = upload.ok_or_else(|| DomainError::field("image", REQUIRED))?;
        let title = changes.title.ok_or_else(|| DomainError::field("title", REQUIRED))?;
        let description = changes
            .description
            .ok_or_else(|| DomainError::field("description", REQUIRED))?;
        let author = changes.author.ok_or_else(|| DomainError::field("author", REQUIRED))?;
        let image = self.media.save(BLOG_IMAGE_DIR, &upload).await?;

        self.repo
            .create(NewBlog {
                title,
                description,
                author,
                image,
                category_id,
                is_published: changes.is_published.unwrap_or(false),
            })
            .await
    }

    /// Applies a full (PUT) or partial (PATCH) payload. A new image replaces the
    /// stored path; the previous file stays on disk.
    #[instrument(skip(self, payload))]
    pub async fn update_blog(&self, id: i64, payload: BlogPayload) -> Result<Blog, DomainError> {
        self.get_blog(id).await?;

        let (mut changes, upload) = payload.into_parts();
        if let Some(category_id) = changes.category_id {
            self.ensure_category(category_id).await?;
        }
        if let Some(upload) = upload {
            changes.image = Some(self.media.save(BLOG_IMAGE_DIR, &upload).await?);
        }

        self.repo
            .update(id, changes)
            .await?
            .ok_or(DomainError::BlogNotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn delete_blog(&self, id: i64) -> Result<(), DomainError> {
        self.repo.delete(id).await
    }
}
