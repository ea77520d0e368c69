//! JSON record-management endpoints generated from the admin configuration.

use std::collections::{BTreeMap, HashMap};

use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::application::admin::{BLOG_ADMIN, CATEGORY_ADMIN, ModelAdmin, REGISTRY};
use crate::application::blog_service::BlogService;
use crate::application::category_service::CategoryService;
use crate::domain::error::DomainError;
use crate::presentation::dto::{BlogPayload, BlogResponse, CategoryPayload, Mode};
use crate::presentation::form::FormData;
use crate::presentation::utils::{media_base, request_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Model {
    Category,
    Blog,
}

impl Model {
    fn from_segment(segment: &str) -> Result<Self, DomainError> {
        [Model::Category, Model::Blog]
            .into_iter()
            .find(|model| model.admin().model == segment)
            .ok_or_else(|| DomainError::InvalidId(segment.to_string()))
    }

    fn admin(self) -> &'static ModelAdmin {
        match self {
            Model::Category => &CATEGORY_ADMIN,
            Model::Blog => &BLOG_ADMIN,
        }
    }
}

/// Services plus the request-derived media prefix, so each operation can
/// serialize records the same way the API does.
struct Site {
    categories: web::Data<CategoryService>,
    blogs: web::Data<BlogService>,
    media_base: String,
}

impl Site {
    fn new(
        req: &HttpRequest,
        categories: web::Data<CategoryService>,
        blogs: web::Data<BlogService>,
    ) -> Self {
        let media_base = media_base(req, blogs.media());
        Self {
            categories,
            blogs,
            media_base,
        }
    }

    async fn all(&self, model: Model) -> Result<Vec<Value>, DomainError> {
        match model {
            Model::Category => self
                .categories
                .list_categories()
                .await?
                .iter()
                .map(to_value)
                .collect(),
            Model::Blog => self
                .blogs
                .list_blogs()
                .await?
                .into_iter()
                .map(|blog| to_value(&BlogResponse::new(blog, &self.media_base)))
                .collect(),
        }
    }

    async fn one(&self, model: Model, id: i64) -> Result<Value, DomainError> {
        match model {
            Model::Category => to_value(&self.categories.get_category(id).await?),
            Model::Blog => to_value(&BlogResponse::new(
                self.blogs.get_blog(id).await?,
                &self.media_base,
            )),
        }
    }

    async fn add(&self, model: Model, form: FormData) -> Result<Value, DomainError> {
        match model {
            Model::Category => {
                let payload = CategoryPayload::from_form(form, Mode::Full)?;
                to_value(&self.categories.create_category(payload).await?)
            }
            Model::Blog => {
                let payload = BlogPayload::from_form(form, Mode::Full)?;
                let blog = self.blogs.create_blog(payload).await?;
                to_value(&BlogResponse::new(blog, &self.media_base))
            }
        }
    }

    /// Change forms resubmit only what was edited; a blank image input keeps the stored file.
    async fn change(&self, model: Model, id: i64, form: FormData) -> Result<Value, DomainError> {
        self.one(model, id).await?;
        match model {
            Model::Category => {
                let payload = CategoryPayload::from_form(form, Mode::Partial)?;
                to_value(&self.categories.update_category(id, payload).await?)
            }
            Model::Blog => {
                let payload = BlogPayload::from_form(form, Mode::Partial)?;
                let blog = self.blogs.update_blog(id, payload).await?;
                to_value(&BlogResponse::new(blog, &self.media_base))
            }
        }
    }

    async fn deletion_summary(&self, model: Model, id: i64) -> Result<DeleteSummary, DomainError> {
        let object = self.one(model, id).await?;
        let mut cascade = BTreeMap::new();
        if model == Model::Category {
            let blogs = self
                .categories
                .dependent_blogs(id)
                .await?
                .into_iter()
                .map(|blog| to_value(&BlogResponse::new(blog, &self.media_base)))
                .collect::<Result<Vec<_>, _>>()?;
            cascade.insert(BLOG_ADMIN.model, blogs);
        }
        Ok(DeleteSummary {
            model: model.admin().model,
            object,
            cascade,
            deleted: false,
        })
    }

    async fn delete(&self, model: Model, id: i64) -> Result<(), DomainError> {
        match model {
            Model::Category => self.categories.delete_category(id).await,
            Model::Blog => self.blogs.delete_blog(id).await,
        }
    }
}

fn to_value<T: Serialize>(record: &T) -> Result<Value, DomainError> {
    serde_json::to_value(record).map_err(|e| DomainError::Internal(e.to_string()))
}

#[derive(Debug, Serialize)]
struct IndexEntry {
    #[serde(flatten)]
    config: ModelAdmin,
    changelist_url: String,
    add_url: String,
}

#[derive(Debug, Serialize)]
struct DeleteSummary {
    model: &'static str,
    object: Value,
    /// Related records removed along with `object`, keyed by model.
    cascade: BTreeMap<&'static str, Vec<Value>>,
    deleted: bool,
}

pub async fn index() -> HttpResponse {
    let models: Vec<IndexEntry> = REGISTRY
        .iter()
        .map(|admin| IndexEntry {
            config: *admin,
            changelist_url: format!("/admin/{}/", admin.model),
            add_url: format!("/admin/{}/add/", admin.model),
        })
        .collect();
    HttpResponse::Ok().json(serde_json::json!({ "models": models }))
}

pub async fn changelist(
    req: HttpRequest,
    categories: web::Data<CategoryService>,
    blogs: web::Data<BlogService>,
    path: web::Path<String>,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, DomainError> {
    let model = Model::from_segment(&path)?;
    let site = Site::new(&req, categories, blogs);
    let records = site.all(model).await?;
    Ok(HttpResponse::Ok().json(model.admin().changelist(records, &query)))
}

pub async fn add(
    req: HttpRequest,
    categories: web::Data<CategoryService>,
    blogs: web::Data<BlogService>,
    path: web::Path<String>,
    form: FormData,
) -> Result<HttpResponse, DomainError> {
    let model = Model::from_segment(&path)?;
    let site = Site::new(&req, categories, blogs);
    let record = site.add(model, form).await?;

    info!(
        request_id = %request_id(&req),
        model = model.admin().model,
        id = %record["id"],
        "admin added record"
    );

    Ok(HttpResponse::Created().json(record))
}

pub async fn change_form(
    req: HttpRequest,
    categories: web::Data<CategoryService>,
    blogs: web::Data<BlogService>,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse, DomainError> {
    let (segment, id) = path.into_inner();
    let model = Model::from_segment(&segment)?;
    let site = Site::new(&req, categories, blogs);
    Ok(HttpResponse::Ok().json(site.one(model, id).await?))
}

pub async fn change(
    req: HttpRequest,
    categories: web::Data<CategoryService>,
    blogs: web::Data<BlogService>,
    path: web::Path<(String, i64)>,
    form: FormData,
) -> Result<HttpResponse, DomainError> {
    let (segment, id) = path.into_inner();
    let model = Model::from_segment(&segment)?;
    let site = Site::new(&req, categories, blogs);
    let record = site.change(model, id, form).await?;

    info!(
        request_id = %request_id(&req),
        model = model.admin().model,
        id,
        "admin changed record"
    );

    Ok(HttpResponse::Ok().json(record))
}

pub async fn delete_confirmation(
    req: HttpRequest,
    categories: web::Data<CategoryService>,
    blogs: web::Data<BlogService>,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse, DomainError> {
    let (segment, id) = path.into_inner();
    let model = Model::from_segment(&segment)?;
    let site = Site::new(&req, categories, blogs);
    Ok(HttpResponse::Ok().json(site.deletion_summary(model, id).await?))
}

pub async fn delete(
    req: HttpRequest,
    categories: web::Data<CategoryService>,
    blogs: web::Data<BlogService>,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse, DomainError> {
    let (segment, id) = path.into_inner();
    let model = Model::from_segment(&segment)?;
    let site = Site::new(&req, categories, blogs);

    let mut summary = site.deletion_summary(model, id).await?;
    site.delete(model, id).await?;
    summary.deleted = true;

    info!(
        request_id = %request_id(&req),
        model = model.admin().model,
        id,
        cascaded = summary.cascade.values().map(Vec::len).sum::<usize>(),
        "admin deleted record"
    );

    Ok(HttpResponse::Ok().json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_segments_resolve_to_models() {
        assert_eq!(Model::from_segment("categories").unwrap(), Model::Category);
        assert_eq!(Model::from_segment("blogs").unwrap(), Model::Blog);
        assert!(matches!(
            Model::from_segment("users"),
            Err(DomainError::InvalidId(_))
        ));
    }
}
