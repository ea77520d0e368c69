//! Request-body extraction shared by every write endpoint.
//!
//! Bodies arrive either as a JSON object or as `multipart/form-data`; both are
//! reduced to a [`FormData`] of loosely typed values plus uploaded files, which
//! the payload types in [`crate::presentation::dto`] then coerce field by field.

use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::dev::Payload;
use actix_web::error::PayloadError;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::LocalBoxFuture;
use futures_util::TryStreamExt;
use serde_json::{Map, Value};

use crate::domain::error::DomainError;
use crate::infrastructure::media::UploadedFile;

/// Upper bound for request bodies, registered as app data.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimit(pub usize);

impl Default for UploadLimit {
    fn default() -> Self {
        UploadLimit(10 * 1024 * 1024)
    }
}

#[derive(Debug, Default)]
pub struct FormData {
    pub fields: Map<String, Value>,
    pub files: HashMap<String, UploadedFile>,
}

impl FromRequest for FormData {
    type Error = DomainError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let limit = req
            .app_data::<web::Data<UploadLimit>>()
            .map(|l| l.0)
            .unwrap_or_else(|| UploadLimit::default().0);
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase());

        match content_type.as_deref() {
            Some(ct) if ct.starts_with("multipart/form-data") => {
                let multipart = Multipart::new(req.headers(), payload.take());
                Box::pin(read_multipart(multipart, limit))
            }
            None => json_body(req, payload, limit),
            Some(ct) if ct.starts_with("application/json") => json_body(req, payload, limit),
            Some(ct) => {
                let err = DomainError::UnsupportedMediaType(ct.to_string());
                Box::pin(async move { Err(err) })
            }
        }
    }
}

/// Collects the body through actix's `Bytes` extractor, bounded by the
/// `PayloadConfig` registered next to [`UploadLimit`].
fn json_body(
    req: &HttpRequest,
    payload: &mut Payload,
    limit: usize,
) -> LocalBoxFuture<'static, Result<FormData, DomainError>> {
    let body = web::Bytes::from_request(req, payload);
    Box::pin(async move {
        let body = body.await.map_err(|e| match e.as_error::<PayloadError>() {
            Some(PayloadError::Overflow) => DomainError::PayloadTooLarge(limit),
            _ => DomainError::BadRequest(e.to_string()),
        })?;
        read_json(&body)
    })
}

fn read_json(body: &[u8]) -> Result<FormData, DomainError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(FormData::default());
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| DomainError::BadRequest(format!("JSON parse error - {}", e)))?;

    match value {
        Value::Object(fields) => Ok(FormData {
            fields,
            files: HashMap::new(),
        }),
        other => Err(DomainError::BadRequest(format!(
            "invalid data, expected a dictionary but got {}",
            json_type_name(&other)
        ))),
    }
}

async fn read_multipart(mut multipart: Multipart, limit: usize) -> Result<FormData, DomainError> {
    let mut form = FormData::default();
    let mut total = 0usize;

    while let Some(mut field) = multipart
        .try_next()
        .await
        .map_err(|e| DomainError::BadRequest(format!("multipart parse error - {}", e)))?
    {
        let disposition = field.content_disposition();
        let Some(name) = disposition.and_then(|d| d.get_name()).map(str::to_owned) else {
            continue;
        };
        let filename = disposition.and_then(|d| d.get_filename()).map(str::to_owned);

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| DomainError::BadRequest(format!("multipart parse error - {}", e)))?
        {
            total += chunk.len();
            if total > limit {
                return Err(DomainError::PayloadTooLarge(limit));
            }
            bytes.extend_from_slice(&chunk);
        }

        match filename {
            // an untouched file input: same as not sending the field
            Some(filename) if filename.is_empty() && bytes.is_empty() => {}
            Some(filename) => {
                form.files.insert(name, UploadedFile { filename, bytes });
            }
            None => {
                let text = String::from_utf8(bytes).map_err(|_| {
                    DomainError::BadRequest(format!("field {} is not valid UTF-8", name))
                })?;
                form.fields.insert(name, Value::String(text));
            }
        }
    }

    Ok(form)
}

pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn blank_json_body_is_an_empty_form() {
        let form = read_json(b"  \n").unwrap();
        assert!(form.fields.is_empty());
    }

    #[test]
    fn json_must_be_an_object() {
        let err = read_json(b"[1, 2]").unwrap_err();
        assert!(matches!(err, DomainError::BadRequest(msg) if msg.contains("list")));
    }

    #[test]
    fn malformed_json_is_a_bad_request() {
        assert!(matches!(
            read_json(b"{\"name\": "),
            Err(DomainError::BadRequest(_))
        ));
    }

    #[actix_web::test]
    async fn extracts_json_object() {
        let (req, mut payload) = TestRequest::post()
            .insert_header((CONTENT_TYPE, "application/json"))
            .set_payload(r#"{"name": "rust", "extra": 1}"#)
            .to_http_parts();

        let form = FormData::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(form.fields["name"], "rust");
        assert!(form.files.is_empty());
    }

    #[actix_web::test]
    async fn rejects_unsupported_content_type() {
        let (req, mut payload) = TestRequest::post()
            .insert_header((CONTENT_TYPE, "text/plain"))
            .set_payload("name=rust")
            .to_http_parts();

        let err = FormData::from_request(&req, &mut payload).await.unwrap_err();
        assert!(matches!(err, DomainError::UnsupportedMediaType(_)));
    }

    #[actix_web::test]
    async fn enforces_upload_limit() {
        let (req, mut payload) = TestRequest::post()
            .insert_header((CONTENT_TYPE, "application/json"))
            .app_data(web::Data::new(UploadLimit(8)))
            .app_data(web::PayloadConfig::new(8))
            .set_payload(r#"{"name": "far too long"}"#)
            .to_http_parts();

        let err = FormData::from_request(&req, &mut payload).await.unwrap_err();
        assert!(matches!(err, DomainError::PayloadTooLarge(8)));
    }

    #[actix_web::test]
    async fn splits_multipart_text_and_file_parts() {
        let boundary = "XyZboundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nHello\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"a.png\"\r\n\
             Content-Type: image/png\r\n\r\nPNGDATA\r\n--{b}--\r\n",
            b = boundary
        );
        let (req, mut payload) = TestRequest::post()
            .insert_header((
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            ))
            .set_payload(body)
            .to_http_parts();

        let form = FormData::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(form.fields["title"], "Hello");
        let image = &form.files["image"];
        assert_eq!(image.filename, "a.png");
        assert_eq!(image.bytes, b"PNGDATA");
    }

    #[actix_web::test]
    async fn untouched_file_input_is_dropped() {
        let boundary = "XyZboundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"is_published\"\r\n\r\non\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\r\n--{b}--\r\n",
            b = boundary
        );
        let (req, mut payload) = TestRequest::post()
            .insert_header((
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            ))
            .set_payload(body)
            .to_http_parts();

        let form = FormData::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(form.fields["is_published"], "on");
        assert!(form.files.is_empty());
        assert!(!form.fields.contains_key("image"));
    }
}
