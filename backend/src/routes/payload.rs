//! Request extractors that report failures in the API error envelope

use crate::error::ApiError;
use crate::services::storage::ImageUpload;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use blog_shared::PostRequest;
use serde_json::{Map, Value};

/// `Json` with rejections mapped to [`ApiError`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` with rejections mapped to [`ApiError`]
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `Path` with rejections mapped to [`ApiError`]
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Multipart field carrying the preview image
pub const PREVIEW_IMAGE_FIELD: &str = "previewImage";

/// Post create/update body, sent as JSON or as `multipart/form-data` with an
/// optional preview image
#[derive(Debug, Default)]
pub struct PostPayload {
    pub request: PostRequest,
    pub image: Option<ImageUpload>,
}

#[async_trait]
impl<S> FromRequest<S> for PostPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("multipart/form-data"));

        if !is_multipart {
            let ApiJson(request) = ApiJson::<PostRequest>::from_request(req, state).await?;
            return Ok(Self { request, image: None });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        let mut fields = Map::new();
        let mut image = None;

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            if name == PREVIEW_IMAGE_FIELD {
                let file_name = field.file_name().unwrap_or("preview").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    image = Some(ImageUpload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                continue;
            }

            let text = field.text().await?;
            if let Some(value) = form_value(&name, text) {
                fields.insert(name, value);
            }
        }

        let request = serde_json::from_value(Value::Object(fields))
            .map_err(|e| ApiError::BadRequest(format!("Invalid form field: {}", e)))?;
        Ok(Self { request, image })
    }
}

/// Convert a text form field into the JSON value the request type expects.
/// Blank fields are treated as absent.
fn form_value(name: &str, text: String) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    match name {
        "order" => trimmed.parse::<i64>().ok().map(Value::from),
        // A JSON array, or a comma-separated list
        "tags" => Some(match serde_json::from_str::<Vec<String>>(trimmed) {
            Ok(tags) => Value::from(tags),
            Err(_) => Value::from(
                trimmed
                    .split(',')
                    .map(|t| t.trim().to_string())
                    .collect::<Vec<_>>(),
            ),
        }),
        _ => Some(Value::String(text)),
    }
}
