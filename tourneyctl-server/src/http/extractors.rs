//! Custom Axum extractors

use std::collections::HashMap;

use axum::extract::{FromRequestParts, Path, Query};
use axum::http::request::Parts;

use super::error::ApiError;
use crate::models::ValidationError;

/// Record id from the `/{id}` path segment or the `?id=` query parameter.
///
/// `None` when neither is present (or `?id=` is blank); a value that is
/// not a positive integer is rejected with 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordId(pub Option<i64>);

impl RecordId {
    /// The id, or a 400 naming the missing `id` field.
    pub fn required(self) -> Result<i64, ApiError> {
        self.0
            .ok_or_else(|| ApiError::Validation(ValidationError::Missing { fields: vec!["id"] }))
    }
}

/// Parse a client-supplied id; blank means absent.
pub fn parse_id(raw: &str) -> Result<Option<i64>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(Some(id)),
        _ => Err(ValidationError::InvalidFormat {
            field: "id",
            reason: "must be a positive integer",
        }),
    }
}

impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Ok(Path(id)) = Path::<String>::from_request_parts(parts, state).await {
            return Ok(Self(parse_id(&id)?));
        }

        let Query(query): Query<HashMap<String, String>> =
            Query::try_from_uri(&parts.uri).unwrap_or_else(|_| Query(HashMap::new()));

        match query.get("id") {
            Some(id) => Ok(Self(parse_id(id)?)),
            None => Ok(Self(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(uri: &str) -> Result<RecordId, ApiError> {
        let (mut parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        RecordId::from_request_parts(&mut parts, &()).await
    }

    #[test]
    fn parses_positive_ids() {
        assert_eq!(parse_id("42").unwrap(), Some(42));
        assert_eq!(parse_id(" 7 ").unwrap(), Some(7));
        assert_eq!(parse_id("").unwrap(), None);
    }

    #[test]
    fn rejects_non_positive_and_garbage() {
        for raw in ["0", "-3", "abc", "1.5", "99999999999999999999"] {
            assert!(parse_id(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[tokio::test]
    async fn reads_query_parameter() {
        assert_eq!(extract("/matches?id=5").await.unwrap(), RecordId(Some(5)));
        assert_eq!(extract("/matches?id=").await.unwrap(), RecordId(None));
        assert_eq!(extract("/matches").await.unwrap(), RecordId(None));
    }

    #[tokio::test]
    async fn bad_query_id_is_400() {
        let err = extract("/matches?id=nope").await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation(ValidationError::InvalidFormat { field: "id", .. })
        ));
    }

    #[test]
    fn required_reports_missing_id() {
        let err = RecordId(None).required().unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation(ValidationError::Missing { .. })
        ));
        assert_eq!(RecordId(Some(3)).required().unwrap(), 3);
    }
}
