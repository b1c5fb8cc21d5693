//! Request body decoding into [`FormData`]
//!
//! One extractor for every write method. Supported bodies:
//! - `multipart/form-data` (text fields and file parts)
//! - `application/x-www-form-urlencoded`
//! - `application/json` objects (scalars are stringified, `null` skipped)
//!
//! A request without a content type decodes to an empty form.

use axum::extract::{Form, FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{Map, Value};

use super::error::ApiError;
use crate::models::{FormData, Upload, ValidationError};

enum BodyKind {
    Multipart,
    UrlEncoded,
    Json,
    Missing,
    Other(String),
}

fn body_kind(req: &Request) -> BodyKind {
    let Some(value) = req.headers().get(CONTENT_TYPE) else {
        return BodyKind::Missing;
    };
    let Ok(value) = value.to_str() else {
        return BodyKind::Other("<non-ascii>".to_string());
    };

    let essence = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "multipart/form-data" => BodyKind::Multipart,
        "application/x-www-form-urlencoded" => BodyKind::UrlEncoded,
        "application/json" => BodyKind::Json,
        "" => BodyKind::Missing,
        _ => BodyKind::Other(essence),
    }
}

/// Map an axum rejection or multipart error onto our error type.
///
/// Body limit violations keep their 413; everything else is a malformed body.
fn rejected(status: StatusCode, text: String) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { message: text }
    } else {
        ApiError::Validation(ValidationError::MalformedBody { reason: text })
    }
}

impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let form = match body_kind(&req) {
            BodyKind::Multipart => {
                let multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|e| rejected(e.status(), e.body_text()))?;
                read_multipart(multipart).await?
            }
            BodyKind::UrlEncoded => {
                let Form(pairs): Form<Vec<(String, String)>> = Form::from_request(req, state)
                    .await
                    .map_err(|e| rejected(e.status(), e.body_text()))?;

                let mut form = FormData::new();
                for (name, value) in pairs {
                    form.insert_text(name, &value);
                }
                form
            }
            BodyKind::Json => {
                let Json(object): Json<Map<String, Value>> = Json::from_request(req, state)
                    .await
                    .map_err(|e| rejected(e.status(), e.body_text()))?;
                from_json(object)?
            }
            BodyKind::Missing => FormData::new(),
            BodyKind::Other(found) => {
                return Err(ApiError::Validation(ValidationError::MalformedBody {
                    reason: format!("unsupported content type '{}'", found),
                }))
            }
        };

        tracing::debug!(fields = ?form.names().collect::<Vec<_>>(), "decoded request body");
        Ok(form)
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<FormData, ApiError> {
    let mut form = FormData::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| rejected(e.status(), e.body_text()))?
    {
        let Some(name) = field.name().filter(|n| !n.is_empty()).map(str::to_owned) else {
            continue;
        };

        match field.file_name().map(str::to_owned) {
            // "No file chosen" in a browser form
            Some(filename) if filename.is_empty() => continue,
            Some(filename) => {
                let content_type = field.content_type().map(str::to_owned);
                let content = field
                    .bytes()
                    .await
                    .map_err(|e| rejected(e.status(), e.body_text()))?;

                form.insert_file(
                    name,
                    Upload {
                        filename,
                        content_type,
                        content,
                    },
                );
            }
            None => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| rejected(e.status(), e.body_text()))?;
                form.insert_text(name, &value);
            }
        }
    }

    Ok(form)
}

fn from_json(object: Map<String, Value>) -> Result<FormData, ApiError> {
    let mut form = FormData::new();

    for (name, value) in object {
        match value {
            Value::Null => {}
            Value::String(s) => form.insert_text(name, &s),
            Value::Number(n) => form.insert_text(name, &n.to_string()),
            Value::Bool(b) => form.insert_text(name, &b.to_string()),
            Value::Array(_) | Value::Object(_) => {
                return Err(ApiError::Validation(ValidationError::MalformedBody {
                    reason: format!("field '{}' must be a string, number or boolean", name),
                }));
            }
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FormValue;
    use axum::body::Body;
    use proptest::prelude::*;

    const BOUNDARY: &str = "X-TOURNEY-BOUNDARY";

    fn multipart_request(body: Vec<u8>) -> Request {
        Request::builder()
            .method("PUT")
            .uri("/matches?id=1")
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn text_part(name: &str, value: &str) -> String {
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            BOUNDARY, name, value
        )
    }

    fn file_part(name: &str, filename: &str, content_type: &str, content: &[u8]) -> Vec<u8> {
        let mut part = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            BOUNDARY, name, filename, content_type
        )
        .into_bytes();
        part.extend_from_slice(content);
        part.extend_from_slice(b"\r\n");
        part
    }

    fn closing() -> String {
        format!("--{}--\r\n", BOUNDARY)
    }

    async fn decode(req: Request) -> Result<FormData, ApiError> {
        FormData::from_request(req, &()).await
    }

    #[tokio::test]
    async fn multipart_text_and_file() {
        let mut body = text_part("name", "  Cup2024 \n").into_bytes();
        body.extend(file_part("image", "logo.PNG", "image/png", b"\x89PNG\r\n\x1a\nrest"));
        body.extend(closing().into_bytes());

        let form = decode(multipart_request(body)).await.unwrap();
        assert_eq!(form.text("name"), Some("Cup2024"));

        let upload = form.file("image").unwrap();
        assert_eq!(upload.filename, "logo.PNG");
        assert_eq!(upload.content_type.as_deref(), Some("image/png"));
        assert_eq!(&upload.content[..], b"\x89PNG\r\n\x1a\nrest");
    }

    #[tokio::test]
    async fn empty_filename_is_absent() {
        let mut body = text_part("name", "Cup2024").into_bytes();
        body.extend(file_part("image", "", "application/octet-stream", b""));
        body.extend(closing().into_bytes());

        let form = decode(multipart_request(body)).await.unwrap();
        assert!(form.get("image").is_none());
        assert_eq!(form.len(), 1);
    }

    #[tokio::test]
    async fn repeated_name_keeps_last_value() {
        let body = format!(
            "{}{}{}",
            text_part("shortname", "A"),
            text_part("shortname", "B"),
            closing()
        );

        let form = decode(multipart_request(body.into_bytes())).await.unwrap();
        assert_eq!(form.text("shortname"), Some("B"));
    }

    #[tokio::test]
    async fn missing_boundary_is_malformed() {
        let req = Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "multipart/form-data")
            .body(Body::from("--x\r\n"))
            .unwrap();

        let err = decode(req).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation(ValidationError::MalformedBody { .. })
        ));
    }

    #[tokio::test]
    async fn urlencoded_body() {
        let req = Request::builder()
            .method("DELETE")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("id=42&team_name=+Lions+"))
            .unwrap();

        let form = decode(req).await.unwrap();
        assert_eq!(form.text("id"), Some("42"));
        assert_eq!(form.text("team_name"), Some("Lions"));
    }

    #[tokio::test]
    async fn json_scalars_are_stringified() {
        let req = Request::builder()
            .method("PATCH")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"id": 7, "name": "Cup", "active": true, "image": null}"#))
            .unwrap();

        let form = decode(req).await.unwrap();
        assert_eq!(form.text("id"), Some("7"));
        assert_eq!(form.text("name"), Some("Cup"));
        assert_eq!(form.text("active"), Some("true"));
        assert!(form.get("image").is_none());
    }

    #[tokio::test]
    async fn no_content_type_is_empty() {
        let req = Request::builder()
            .method("DELETE")
            .body(Body::empty())
            .unwrap();
        assert!(decode(req).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_content_type_is_rejected() {
        let req = Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "text/plain")
            .body(Body::from("name=Cup"))
            .unwrap();

        let err = decode(req).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Every named field in a well-formed body comes back under its name.
        #[test]
        fn recovers_every_named_field(
            fields in proptest::collection::btree_map("[A-Za-z_][A-Za-z0-9_]{0,15}", "[A-Za-z0-9 .,-]{0,40}", 1..8)
        ) {
            let mut body = String::new();
            for (name, value) in &fields {
                body.push_str(&text_part(name, value));
            }
            body.push_str(&closing());

            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let form = rt.block_on(decode(multipart_request(body.into_bytes()))).unwrap();

            prop_assert_eq!(form.len(), fields.len());
            for (name, value) in &fields {
                prop_assert_eq!(
                    form.get(name),
                    Some(&FormValue::Text(value.trim().to_string()))
                );
            }
        }
    }
}
