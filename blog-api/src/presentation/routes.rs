//! The routing table. The REST resources are mounted twice, under `/api` and at
//! the root, and behave identically in both places.

use std::sync::Arc;

use actix_files::Files;
use actix_web::web;

use crate::application::blog_service::BlogService;
use crate::application::category_service::CategoryService;
use crate::data::blog_repository::BlogRepository;
use crate::data::category_repository::CategoryRepository;
use crate::domain::error::DomainError;
use crate::infrastructure::media::MediaStorage;
use crate::presentation::form::UploadLimit;
use crate::presentation::handlers::{admin, blog, category, root};

/// Everything the handlers pull out of app data.
#[derive(Clone)]
pub struct AppState {
    pub categories: CategoryService,
    pub blogs: BlogService,
    pub upload_limit: UploadLimit,
}

impl AppState {
    pub fn new(
        categories: Arc<dyn CategoryRepository>,
        blogs: Arc<dyn BlogRepository>,
        media: MediaStorage,
        upload_limit: UploadLimit,
    ) -> Self {
        Self {
            categories: CategoryService::new(Arc::clone(&categories), Arc::clone(&blogs)),
            blogs: BlogService::new(blogs, categories, media),
            upload_limit,
        }
    }
}

pub fn configure(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let media = state.blogs.media().clone();

        cfg.app_data(web::Data::new(state.categories))
            .app_data(web::Data::new(state.blogs))
            .app_data(web::Data::new(state.upload_limit))
            .app_data(web::PayloadConfig::new(state.upload_limit.0))
            .app_data(path_config())
            .service(web::scope("/admin").configure(admin_routes))
            .service(web::scope("/api").configure(api_routes));

        // served only when uploads live under a local path on this host
        let mount = media.base_url().trim_end_matches('/');
        if mount.starts_with('/') {
            cfg.service(Files::new(mount, media.root()));
        }

        api_routes(cfg);
    }
}

/// Ids that do not parse can never name a record.
fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_, req| DomainError::InvalidId(req.path().to_string()).into())
}

fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(root::api_root))
        .service(
            web::resource("/categories/")
                .route(web::get().to(category::list_categories))
                .route(web::post().to(category::create_category)),
        )
        .service(
            web::resource("/categories/{id}/")
                .route(web::get().to(category::get_category))
                .route(web::put().to(category::update_category))
                .route(web::patch().to(category::partial_update_category))
                .route(web::delete().to(category::delete_category)),
        )
        .service(
            web::resource("/blogs/")
                .route(web::get().to(blog::list_blogs))
                .route(web::post().to(blog::create_blog)),
        )
        .service(
            web::resource("/blogs/{id}/")
                .route(web::get().to(blog::get_blog))
                .route(web::put().to(blog::update_blog))
                .route(web::patch().to(blog::partial_update_blog))
                .route(web::delete().to(blog::delete_blog)),
        );
}

fn admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(admin::index))
        .service(web::resource("/{model}/").route(web::get().to(admin::changelist)))
        .service(web::resource("/{model}/add/").route(web::post().to(admin::add)))
        .service(
            web::resource("/{model}/{id}/change/")
                .route(web::get().to(admin::change_form))
                .route(web::post().to(admin::change)),
        )
        .service(
            web::resource("/{model}/{id}/delete/")
                .route(web::get().to(admin::delete_confirmation))
                .route(web::post().to(admin::delete)),
        );
}
