use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::blog::{Blog, BlogChanges};
use crate::domain::category::{CategoryChanges, NewCategory};
use crate::domain::error::{DomainError, FieldErrors};
use crate::infrastructure::media::ImageUpload;
use crate::presentation::form::{FormData, json_type_name};

pub const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const NOT_A_STRING: &str = "Not a valid string.";
const NOT_A_BOOLEAN: &str = "Must be a valid boolean.";
const NOT_A_FILE: &str =
    "The submitted data was not a file. Check the encoding type on the form.";
const EMPTY_FILE: &str = "The submitted file is empty.";
const NOT_AN_IMAGE: &str = "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// How strictly a payload is read: `Full` for create and PUT, `Partial` for PATCH.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Full,
    Partial,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank")
            .with_message(Cow::Borrowed("This field may not be blank.")));
    }
    Ok(())
}

/// Pulls typed values out of a [`FormData`], collecting one error per field
/// instead of stopping at the first bad one.
struct FieldReader {
    form: FormData,
    mode: Mode,
    errors: FieldErrors,
}

impl FieldReader {
    fn new(form: FormData, mode: Mode) -> Self {
        Self {
            form,
            mode,
            errors: FieldErrors::new(),
        }
    }

    fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    fn take(&mut self, field: &str, required: bool) -> Option<Value> {
        match self.form.fields.remove(field) {
            Some(Value::Null) => {
                self.reject(field, NOT_NULL);
                None
            }
            Some(value) => Some(value),
            None => {
                if required && self.mode == Mode::Full {
                    self.reject(field, REQUIRED);
                }
                None
            }
        }
    }

    fn text(&mut self, field: &str) -> Option<String> {
        match self.take(field, true)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => {
                self.reject(field, NOT_A_STRING);
                None
            }
        }
    }

    fn boolean(&mut self, field: &str) -> Option<bool> {
        let parsed = match self.take(field, false)? {
            Value::Bool(b) => Some(b),
            Value::Number(n) => match n.as_i64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Some(true),
                "false" | "0" | "no" | "off" => Some(false),
                _ => None,
            },
            _ => None,
        };
        if parsed.is_none() {
            self.reject(field, NOT_A_BOOLEAN);
        }
        parsed
    }

    fn primary_key(&mut self, field: &str) -> Option<i64> {
        let value = self.take(field, true)?;
        let parsed = match &value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        if parsed.is_none() {
            let message = match &value {
                // a whole number past the id range can never name a row
                Value::Number(n) if n.is_u64() => {
                    format!("Invalid pk \"{}\" - object does not exist.", n)
                }
                Value::Number(n) if n.is_f64() => {
                    "Incorrect type. Expected pk value, received float.".to_string()
                }
                other => format!(
                    "Incorrect type. Expected pk value, received {}.",
                    json_type_name(other)
                ),
            };
            self.reject(field, message);
        }
        parsed
    }

    fn image(&mut self, field: &str) -> Option<ImageUpload> {
        let Some(file) = self.form.files.remove(field) else {
            if self.take(field, true).is_some() {
                self.reject(field, NOT_A_FILE);
            }
            return None;
        };
        if file.bytes.is_empty() {
            self.reject(field, EMPTY_FILE);
            return None;
        }
        let image = ImageUpload::new(file);
        if image.is_none() {
            self.reject(field, NOT_AN_IMAGE);
        }
        image
    }

    fn finish(mut self, validated: Result<(), ValidationErrors>) -> Result<(), DomainError> {
        if let Err(errors) = validated {
            for (field, failures) in errors.field_errors() {
                for failure in failures {
                    let message = failure
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| failure.code.to_string());
                    self.reject(&field, message);
                }
            }
        }
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self.errors))
        }
    }
}

#[derive(Debug, Default, Validate)]
pub struct CategoryPayload {
    #[validate(
        custom(function = "not_blank"),
        length(max = 255, message = "Ensure this field has no more than 255 characters.")
    )]
    pub name: Option<String>,
}

impl CategoryPayload {
    pub fn from_form(form: FormData, mode: Mode) -> Result<Self, DomainError> {
        let mut reader = FieldReader::new(form, mode);
        let payload = Self {
            name: reader.text("name"),
        };
        reader.finish(payload.validate())?;
        Ok(payload)
    }

    pub fn into_new(self) -> Result<NewCategory, DomainError> {
        let name = self.name.ok_or_else(|| DomainError::field("name", REQUIRED))?;
        Ok(NewCategory { name })
    }

    pub fn into_changes(self) -> CategoryChanges {
        CategoryChanges { name: self.name }
    }
}

#[derive(Debug, Default, Validate)]
pub struct BlogPayload {
    #[validate(
        custom(function = "not_blank"),
        length(max = 200, message = "Ensure this field has no more than 200 characters.")
    )]
    pub title: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub description: Option<String>,
    #[validate(
        custom(function = "not_blank"),
        length(max = 100, message = "Ensure this field has no more than 100 characters.")
    )]
    pub author: Option<String>,
    pub category: Option<i64>,
    pub is_published: Option<bool>,
    pub image: Option<ImageUpload>,
}

impl BlogPayload {
    pub fn from_form(form: FormData, mode: Mode) -> Result<Self, DomainError> {
        let mut reader = FieldReader::new(form, mode);
        let payload = Self {
            title: reader.text("title"),
            description: reader.text("description"),
            author: reader.text("author"),
            category: reader.primary_key("category"),
            is_published: reader.boolean("is_published"),
            image: reader.image("image"),
        };
        reader.finish(payload.validate())?;
        Ok(payload)
    }

    /// Splits off the upload; the rest becomes a change set once the stored
    /// image path is known.
    pub fn into_parts(self) -> (BlogChanges, Option<ImageUpload>) {
        let changes = BlogChanges {
            title: self.title,
            description: self.description,
            author: self.author,
            image: None,
            category_id: self.category,
            is_published: self.is_published,
        };
        (changes, self.image)
    }
}

#[derive(Debug, Serialize)]
pub struct BlogResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub author: String,
    pub published_date: DateTime<Utc>,
    pub image: String,
    pub category: i64,
    pub is_published: bool,
    pub updated_at: DateTime<Utc>,
}

impl BlogResponse {
    /// `media_base` is the absolute URL prefix stored image paths resolve against.
    pub fn new(blog: Blog, media_base: &str) -> Self {
        Self {
            id: blog.id,
            title: blog.title,
            description: blog.description,
            author: blog.author,
            published_date: blog.published_date,
            image: format!("{}{}", media_base, blog.image),
            category: blog.category_id,
            is_published: blog.is_published,
            updated_at: blog.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiRootResponse {
    pub categories: String,
    pub blogs: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    use crate::infrastructure::media::{TINY_PNG as PNG, UploadedFile};

    fn form(value: Value) -> FormData {
        match value {
            Value::Object(fields) => FormData {
                fields,
                ..Default::default()
            },
            _ => panic!("test payload must be an object"),
        }
    }

    fn with_image(mut form: FormData, bytes: &[u8]) -> FormData {
        form.files.insert(
            "image".into(),
            UploadedFile {
                filename: "cover.png".into(),
                bytes: bytes.to_vec(),
            },
        );
        form
    }

    fn field_errors(err: DomainError) -> FieldErrors {
        match err {
            DomainError::Validation(fields) => fields,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    fn valid_blog() -> Value {
        json!({
            "title": "Ownership",
            "description": "Borrowing explained",
            "author": "ferris",
            "category": 1,
        })
    }

    #[test]
    fn full_blog_payload_is_accepted() {
        let payload =
            BlogPayload::from_form(with_image(form(valid_blog()), PNG), Mode::Full).unwrap();
        assert_eq!(payload.title.as_deref(), Some("Ownership"));
        assert_eq!(payload.category, Some(1));
        assert_eq!(payload.is_published, None);
        assert!(payload.image.is_some());
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let errors = field_errors(BlogPayload::from_form(form(json!({})), Mode::Full).unwrap_err());
        for field in ["title", "description", "author", "category", "image"] {
            assert_eq!(errors[field], [REQUIRED], "field {field}");
        }
        assert!(!errors.contains_key("is_published"));
    }

    #[test]
    fn partial_mode_only_checks_supplied_fields() {
        let payload =
            BlogPayload::from_form(form(json!({ "is_published": true })), Mode::Partial).unwrap();
        assert_eq!(payload.is_published, Some(true));
        assert!(payload.title.is_none());
    }

    #[rstest]
    #[case("title", json!("x".repeat(201)), "Ensure this field has no more than 200 characters.")]
    #[case("author", json!("y".repeat(101)), "Ensure this field has no more than 100 characters.")]
    #[case("title", json!("   "), "This field may not be blank.")]
    #[case("description", json!(""), "This field may not be blank.")]
    #[case("title", json!(null), "This field may not be null.")]
    #[case("author", json!(["a"]), "Not a valid string.")]
    #[case("is_published", json!("maybe"), "Must be a valid boolean.")]
    #[case("category", json!("abc"), "Incorrect type. Expected pk value, received str.")]
    #[case("category", json!(true), "Incorrect type. Expected pk value, received bool.")]
    #[case("category", json!(1.5), "Incorrect type. Expected pk value, received float.")]
    #[case("category", json!(18446744073709551615u64), "Invalid pk \"18446744073709551615\" - object does not exist.")]
    #[case("image", json!("cover.png"), "The submitted data was not a file. Check the encoding type on the form.")]
    fn invalid_field_is_flagged(
        #[case] field: &str,
        #[case] value: Value,
        #[case] message: &str,
    ) {
        let mut body = valid_blog();
        body[field] = value;
        let mut payload = form(body);
        if field != "image" {
            payload = with_image(payload, PNG);
        }

        let errors = field_errors(BlogPayload::from_form(payload, Mode::Full).unwrap_err());
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert_eq!(errors[field], [message]);
    }

    #[rstest]
    #[case(json!("on"), true)]
    #[case(json!("False"), false)]
    #[case(json!(1), true)]
    #[case(json!("0"), false)]
    fn form_encoded_booleans_are_coerced(#[case] value: Value, #[case] expected: bool) {
        let payload =
            BlogPayload::from_form(form(json!({ "is_published": value })), Mode::Partial).unwrap();
        assert_eq!(payload.is_published, Some(expected));
    }

    #[test]
    fn category_pk_accepts_numeric_strings() {
        let payload =
            BlogPayload::from_form(form(json!({ "category": " 12 " })), Mode::Partial).unwrap();
        assert_eq!(payload.category, Some(12));
    }

    #[rstest]
    #[case(&b""[..], "The submitted file is empty.")]
    #[case(&b"plain text"[..], "Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    #[case(&b"BMW quarterly sales report, plain text"[..], "Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    #[case(&b"\x89PNG\r\n\x1a\n"[..], "Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    #[case(&PNG[..45], "Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    fn bad_uploads_are_flagged(#[case] bytes: &[u8], #[case] message: &str) {
        let payload = with_image(form(valid_blog()), bytes);
        let errors = field_errors(BlogPayload::from_form(payload, Mode::Full).unwrap_err());
        assert_eq!(errors["image"], [message]);
    }

    #[test]
    fn category_name_is_trimmed_and_bounded() {
        let payload =
            CategoryPayload::from_form(form(json!({ "name": "  Rust  " })), Mode::Full).unwrap();
        assert_eq!(payload.into_new().unwrap().name, "Rust");

        let errors = field_errors(
            CategoryPayload::from_form(form(json!({ "name": "n".repeat(256) })), Mode::Full)
                .unwrap_err(),
        );
        assert_eq!(
            errors["name"],
            ["Ensure this field has no more than 255 characters."]
        );
    }

    #[test]
    fn read_only_and_unknown_keys_are_ignored() {
        let payload = CategoryPayload::from_form(
            form(json!({ "name": "News", "id": 99, "created_at": "yesterday", "colour": "red" })),
            Mode::Full,
        )
        .unwrap();
        assert_eq!(payload.name.as_deref(), Some("News"));
    }
}
