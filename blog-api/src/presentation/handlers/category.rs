use crate::application::category_service::CategoryService;
use crate::domain::error::DomainError;
use crate::presentation::dto::{CategoryPayload, Mode};
use crate::presentation::form::FormData;
use crate::presentation::utils::request_id;
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::info;

pub async fn list_categories(
    service: web::Data<CategoryService>,
) -> Result<HttpResponse, DomainError> {
    let categories = service.list_categories().await?;
    Ok(HttpResponse::Ok().json(categories))
}

pub async fn get_category(
    service: web::Data<CategoryService>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    let category = service.get_category(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(category))
}

pub async fn create_category(
    req: HttpRequest,
    service: web::Data<CategoryService>,
    form: FormData,
) -> Result<HttpResponse, DomainError> {
    let payload = CategoryPayload::from_form(form, Mode::Full)?;
    let category = service.create_category(payload).await?;

    info!(
        request_id = %request_id(&req),
        category_id = category.id,
        "category created"
    );

    Ok(HttpResponse::Created().json(category))
}

pub async fn update_category(
    req: HttpRequest,
    service: web::Data<CategoryService>,
    path: web::Path<i64>,
    form: FormData,
) -> Result<HttpResponse, DomainError> {
    replace_or_patch(req, service, path.into_inner(), form, Mode::Full).await
}

pub async fn partial_update_category(
    req: HttpRequest,
    service: web::Data<CategoryService>,
    path: web::Path<i64>,
    form: FormData,
) -> Result<HttpResponse, DomainError> {
    replace_or_patch(req, service, path.into_inner(), form, Mode::Partial).await
}

async fn replace_or_patch(
    req: HttpRequest,
    service: web::Data<CategoryService>,
    category_id: i64,
    form: FormData,
    mode: Mode,
) -> Result<HttpResponse, DomainError> {
    // unknown ids answer 404 before the body is judged
    service.get_category(category_id).await?;
    let payload = CategoryPayload::from_form(form, mode)?;
    let category = service.update_category(category_id, payload).await?;

    info!(
        request_id = %request_id(&req),
        category_id,
        "category updated"
    );

    Ok(HttpResponse::Ok().json(category))
}

pub async fn delete_category(
    req: HttpRequest,
    service: web::Data<CategoryService>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    let category_id = path.into_inner();
    service.delete_category(category_id).await?;

    info!(
        request_id = %request_id(&req),
        category_id,
        "category deleted"
    );

    Ok(HttpResponse::NoContent().finish())
}
