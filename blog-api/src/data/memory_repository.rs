use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

use crate::data::blog_repository::BlogRepository;
use crate::data::category_repository::CategoryRepository;
use crate::domain::blog::{Blog, BlogChanges, NewBlog};
use crate::domain::category::{Category, CategoryChanges, NewCategory};
use crate::domain::error::DomainError;

#[derive(Default)]
struct State {
    categories: BTreeMap<i64, Category>,
    blogs: BTreeMap<i64, Blog>,
    next_category_id: i64,
    next_blog_id: i64,
}

impl State {
    fn check_category(&self, id: i64) -> Result<(), DomainError> {
        if self.categories.contains_key(&id) {
            Ok(())
        } else {
            Err(DomainError::field(
                "category",
                format!("Invalid pk \"{}\" - object does not exist.", id),
            ))
        }
    }
}

/// Process-local storage backing both repositories. Cloning shares the state,
/// so the category and blog sides see each other the way two tables would.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn create(&self, category: NewCategory) -> Result<Category, DomainError> {
        let mut state = self.state.write().await;
        state.next_category_id += 1;
        let category = Category {
            id: state.next_category_id,
            name: category.name,
            created_at: Utc::now(),
        };
        state.categories.insert(category.id, category.clone());

        info!(category_id = category.id, "category created");
        Ok(category)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, DomainError> {
        Ok(self.state.read().await.categories.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Category>, DomainError> {
        Ok(self.state.read().await.categories.values().cloned().collect())
    }

    async fn update(
        &self,
        id: i64,
        changes: CategoryChanges,
    ) -> Result<Option<Category>, DomainError> {
        let mut state = self.state.write().await;
        let Some(category) = state.categories.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            category.name = name;
        }

        info!(category_id = id, "category updated");
        Ok(Some(category.clone()))
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        if state.categories.remove(&id).is_none() {
            return Err(DomainError::CategoryNotFound(id));
        }
        let before = state.blogs.len();
        state.blogs.retain(|_, blog| blog.category_id != id);

        info!(
            category_id = id,
            cascaded = before - state.blogs.len(),
            "category deleted"
        );
        Ok(())
    }
}

#[async_trait]
impl BlogRepository for InMemoryStore {
    async fn create(&self, blog: NewBlog) -> Result<Blog, DomainError> {
        let mut state = self.state.write().await;
        state.check_category(blog.category_id)?;

        state.next_blog_id += 1;
        let now = Utc::now();
        let blog = Blog {
            id: state.next_blog_id,
            title: blog.title,
            description: blog.description,
            author: blog.author,
            published_date: now,
            image: blog.image,
            category_id: blog.category_id,
            is_published: blog.is_published,
            updated_at: now,
        };
        state.blogs.insert(blog.id, blog.clone());

        info!(blog_id = blog.id, category_id = blog.category_id, "blog created");
        Ok(blog)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Blog>, DomainError> {
        Ok(self.state.read().await.blogs.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Blog>, DomainError> {
        Ok(self.state.read().await.blogs.values().cloned().collect())
    }

    async fn list_by_category(&self, category_id: i64) -> Result<Vec<Blog>, DomainError> {
        Ok(self
            .state
            .read()
            .await
            .blogs
            .values()
            .filter(|blog| blog.category_id == category_id)
            .cloned()
            .collect())
    }

    async fn update(&self, id: i64, changes: BlogChanges) -> Result<Option<Blog>, DomainError> {
        let mut state = self.state.write().await;
        if let Some(category_id) = changes.category_id {
            if state.blogs.contains_key(&id) {
                state.check_category(category_id)?;
            }
        }
        let Some(blog) = state.blogs.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            blog.title = title;
        }
        if let Some(description) = changes.description {
            blog.description = description;
        }
        if let Some(author) = changes.author {
            blog.author = author;
        }
        if let Some(image) = changes.image {
            blog.image = image;
        }
        if let Some(category_id) = changes.category_id {
            blog.category_id = category_id;
        }
        if let Some(is_published) = changes.is_published {
            blog.is_published = is_published;
        }
        blog.updated_at = Utc::now();

        info!(blog_id = id, "blog updated");
        Ok(Some(blog.clone()))
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        if self.state.write().await.blogs.remove(&id).is_none() {
            return Err(DomainError::BlogNotFound(id));
        }

        info!(blog_id = id, "blog deleted");
        Ok(())
    }
}
