use actix_web::{HttpMessage, HttpRequest};

use crate::infrastructure::media::MediaStorage;
use crate::presentation::middleware::RequestId;

pub fn request_id(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|rid| rid.0.clone())
        .unwrap_or_else(|| "unknown".into())
}

/// Scheme and host the client used, e.g. `http://localhost:8080`.
pub fn origin(req: &HttpRequest) -> String {
    let info = req.connection_info();
    format!("{}://{}", info.scheme(), info.host())
}

/// Absolute prefix stored image paths are resolved against.
pub fn media_base(req: &HttpRequest, media: &MediaStorage) -> String {
    let base = media.base_url();
    if base.starts_with("http://") || base.starts_with("https://") {
        base.to_string()
    } else {
        format!("{}{}", origin(req), base)
    }
}
