use crate::application::blog_service::BlogService;
use crate::domain::error::DomainError;
use crate::presentation::dto::{BlogPayload, BlogResponse, Mode};
use crate::presentation::form::FormData;
use crate::presentation::utils::{media_base, request_id};
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::info;

pub async fn list_blogs(
    req: HttpRequest,
    service: web::Data<BlogService>,
) -> Result<HttpResponse, DomainError> {
    let base = media_base(&req, service.media());
    let blogs: Vec<BlogResponse> = service
        .list_blogs()
        .await?
        .into_iter()
        .map(|blog| BlogResponse::new(blog, &base))
        .collect();

    Ok(HttpResponse::Ok().json(blogs))
}

pub async fn get_blog(
    req: HttpRequest,
    service: web::Data<BlogService>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    let blog = service.get_blog(path.into_inner()).await?;
    let base = media_base(&req, service.media());
    Ok(HttpResponse::Ok().json(BlogResponse::new(blog, &base)))
}

pub async fn create_blog(
    req: HttpRequest,
    service: web::Data<BlogService>,
    form: FormData,
) -> Result<HttpResponse, DomainError> {
    let payload = BlogPayload::from_form(form, Mode::Full)?;
    let blog = service.create_blog(payload).await?;

    info!(
        request_id = %request_id(&req),
        blog_id = blog.id,
        category_id = blog.category_id,
        "blog created"
    );

    let base = media_base(&req, service.media());
    Ok(HttpResponse::Created().json(BlogResponse::new(blog, &base)))
}

pub async fn update_blog(
    req: HttpRequest,
    service: web::Data<BlogService>,
    path: web::Path<i64>,
    form: FormData,
) -> Result<HttpResponse, DomainError> {
    replace_or_patch(req, service, path.into_inner(), form, Mode::Full).await
}

pub async fn partial_update_blog(
    req: HttpRequest,
    service: web::Data<BlogService>,
    path: web::Path<i64>,
    form: FormData,
) -> Result<HttpResponse, DomainError> {
    replace_or_patch(req, service, path.into_inner(), form, Mode::Partial).await
}

async fn replace_or_patch(
    req: HttpRequest,
    service: web::Data<BlogService>,
    blog_id: i64,
    form: FormData,
    mode: Mode,
) -> Result<HttpResponse, DomainError> {
    service.get_blog(blog_id).await?;
    let payload = BlogPayload::from_form(form, mode)?;
    let blog = service.update_blog(blog_id, payload).await?;

    info!(
        request_id = %request_id(&req),
        blog_id,
        is_published = blog.is_published,
        "blog updated"
    );

    let base = media_base(&req, service.media());
    Ok(HttpResponse::Ok().json(BlogResponse::new(blog, &base)))
}

pub async fn delete_blog(
    req: HttpRequest,
    service: web::Data<BlogService>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    let blog_id = path.into_inner();
    service.delete_blog(blog_id).await?;

    info!(
        request_id = %request_id(&req),
        blog_id,
        "blog deleted"
    );

    Ok(HttpResponse::NoContent().finish())
}
