use actix_web::{HttpRequest, HttpResponse};

use crate::presentation::dto::ApiRootResponse;
use crate::presentation::utils::origin;

/// Lists the collection endpoints relative to wherever this route set is mounted.
pub async fn api_root(req: HttpRequest) -> HttpResponse {
    let base = format!("{}{}", origin(&req), req.path());
    HttpResponse::Ok().json(ApiRootResponse {
        categories: format!("{}categories/", base),
        blogs: format!("{}blogs/", base),
    })
}
