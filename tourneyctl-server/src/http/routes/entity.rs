//! Generic CRUD handlers shared by matches, manager teams and players
//!
//! Each entity path answers:
//! - `GET`              list (plural key) or, with an id, one record (singular key)
//! - `POST`             create, 201
//! - `PUT` / `PATCH`    update by id, returns the updated record
//! - `DELETE`           delete by id (path, query or form field `id`)
//! - `OPTIONS`          empty 200
//!
//! and `405` for anything else. Ids come from `/{id}` or `?id=`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::db::{ReferenceCheck, Repository, Store};
use crate::http::error::ApiError;
use crate::http::extractors::{parse_id, RecordId};
use crate::http::server::AppState;
use crate::models::{Entity, FormData, Upload, ValidationError};
use crate::uploads::{validate_image, ImageKind, ImageStore};

/// Routes for one entity at `path` and `path/{id}`
pub fn router<E>(path: &str) -> Router<Arc<AppState>>
where
    E: Entity,
    dyn Store: Repository<E>,
{
    let methods = get(read::<E>)
        .post(create::<E>)
        .put(update::<E>)
        .patch(update::<E>)
        .delete(remove::<E>)
        .options(preflight)
        .fallback(method_not_allowed);

    Router::new()
        .route(path, methods.clone())
        .route(&format!("{}/{{id}}", path), methods)
}

/// GET /x, /x?id=N, /x/{id}
async fn read<E>(
    State(state): State<Arc<AppState>>,
    id: RecordId,
) -> Result<Json<Value>, ApiError>
where
    E: Entity,
    dyn Store: Repository<E>,
{
    match id.0 {
        Some(id) => {
            let record = Repository::<E>::get(&*state.store, id).await?;
            keyed(E::ONE, present::<E>(&state.images, record))
        }
        None => {
            let records: Vec<E::Record> = Repository::<E>::list(&*state.store)
                .await?
                .into_iter()
                .map(|record| present::<E>(&state.images, record))
                .collect();
            keyed(E::MANY, records)
        }
    }
}

/// POST /x
async fn create<E>(
    State(state): State<Arc<AppState>>,
    mut form: FormData,
) -> Result<(StatusCode, Json<Value>), ApiError>
where
    E: Entity,
    dyn Store: Repository<E>,
{
    let upload = form.take_file(E::IMAGE_COLUMN);
    let image_missing = E::IMAGE_REQUIRED && upload.is_none();

    let fields = match E::parse_fields(&form) {
        Ok(_) if image_missing => {
            return Err(ValidationError::Missing {
                fields: vec![E::IMAGE_COLUMN],
            }
            .into())
        }
        Ok(fields) => fields,
        Err(e) if image_missing => return Err(e.with_missing(&[E::IMAGE_COLUMN]).into()),
        Err(e) => return Err(e.into()),
    };

    let image = validate_upload::<E>(&state, upload)?;
    check_reference::<E>(&state, &fields).await?;
    let stored = store_upload(&state, image).await?;

    let inserted = Repository::<E>::insert(&*state.store, &fields, stored.as_deref()).await;
    let id = match inserted {
        Ok(id) => id,
        Err(e) => {
            discard(&state.images, stored).await;
            return Err(e.into());
        }
    };

    tracing::info!(entity = E::LABEL, id, "created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "id": id,
            "message": format!("{} created successfully", E::TITLE),
        })),
    ))
}

/// PUT|PATCH /x?id=N, /x/{id}
async fn update<E>(
    State(state): State<Arc<AppState>>,
    id: RecordId,
    mut form: FormData,
) -> Result<Json<Value>, ApiError>
where
    E: Entity,
    dyn Store: Repository<E>,
{
    let id = id.required()?;
    let upload = form.take_file(E::IMAGE_COLUMN);
    let fields = E::parse_fields(&form)?;

    let image = validate_upload::<E>(&state, upload)?;
    check_reference::<E>(&state, &fields).await?;
    let stored = store_upload(&state, image).await?;

    let result = Repository::<E>::update(&*state.store, id, &fields, stored.as_deref()).await;
    let updated = match result {
        Ok(updated) => updated,
        Err(e) => {
            discard(&state.images, stored).await;
            return Err(e.into());
        }
    };

    if let Some(previous) = updated.replaced_image.as_deref() {
        if !previous.is_empty() && Some(previous) != stored.as_deref() {
            state.images.remove(previous).await;
        }
    }

    tracing::info!(
        entity = E::LABEL,
        id = E::id(&updated.record),
        new_image = stored.is_some(),
        "updated"
    );

    Ok(Json(json!({
        "success": true,
        "data": present::<E>(&state.images, updated.record),
    })))
}

/// DELETE /x?id=N, /x/{id}, or `id` in the body
async fn remove<E>(
    State(state): State<Arc<AppState>>,
    id: RecordId,
    form: FormData,
) -> Result<Json<Value>, ApiError>
where
    E: Entity,
    dyn Store: Repository<E>,
{
    let id = match id.0 {
        Some(id) => id,
        None => RecordId(form.text("id").map(parse_id).transpose()?.flatten()).required()?,
    };

    let image = Repository::<E>::delete(&*state.store, id).await?;
    if let Some(name) = image.as_deref().filter(|name| !name.is_empty()) {
        state.images.remove(name).await;
    }

    tracing::info!(entity = E::LABEL, id, "deleted");

    Ok(Json(json!({
        "success": true,
        "message": format!("{} deleted successfully", E::TITLE),
    })))
}

/// OPTIONS on any entity path
async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed {
        method: method.to_string(),
    }
}

fn validate_upload<E: Entity>(
    state: &AppState,
    upload: Option<Upload>,
) -> Result<Option<(Upload, ImageKind)>, ApiError> {
    let Some(upload) = upload else {
        return Ok(None);
    };

    let kind = validate_image(E::IMAGE_COLUMN, &upload, E::image_limit(&state.limits))?;
    Ok(Some((upload, kind)))
}

async fn check_reference<E: Entity>(state: &AppState, fields: &E::Fields) -> Result<(), ApiError> {
    let Some(reference) = E::reference(fields) else {
        return Ok(());
    };

    if state.store.reference_exists(&reference).await? {
        return Ok(());
    }

    let (resource, id) = reference.describe();
    Err(ApiError::NotFound { resource, id })
}

async fn store_upload(
    state: &AppState,
    image: Option<(Upload, ImageKind)>,
) -> Result<Option<String>, ApiError> {
    match image {
        Some((upload, kind)) => Ok(Some(state.images.save(&upload, kind).await?)),
        None => Ok(None),
    }
}

/// Remove an image stored for a write that did not happen.
async fn discard(images: &ImageStore, stored: Option<String>) {
    if let Some(name) = stored {
        tracing::warn!(file = %name, "removing image stored for a failed write");
        images.remove(&name).await;
    }
}

/// Record with its image file name turned into a public URL.
fn present<E: Entity>(images: &ImageStore, mut record: E::Record) -> E::Record {
    let url = E::image(&record)
        .filter(|name| !name.is_empty())
        .map(|name| images.public_url(name));
    E::set_image(&mut record, url);
    record
}

/// `{ key: value }`
fn keyed(key: &str, value: impl Serialize) -> Result<Json<Value>, ApiError> {
    let value = serde_json::to_value(value).map_err(|e| ApiError::Internal {
        message: format!("failed to serialize {}: {}", key, e),
    })?;

    let mut body = Map::new();
    body.insert(key.to_owned(), value);
    Ok(Json(Value::Object(body)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Match, Player};

    #[test]
    fn present_prefixes_image_names() {
        let images = ImageStore::new("uploads", "/api/uploads/");
        let record = Match {
            id: 1,
            name: "Cup2024".into(),
            shortname: "C24".into(),
            image: Some("abc.png".into()),
        };

        let shown = present::<Match>(&images, record);
        assert_eq!(shown.image.as_deref(), Some("/api/uploads/abc.png"));
    }

    #[test]
    fn present_turns_blank_image_into_null() {
        let images = ImageStore::new("uploads", "/api/uploads/");
        let record = Player {
            id: 2,
            team_name: "Lions".into(),
            match_name: "Cup2024".into(),
            player_name: "Jane".into(),
            player_shortname: "JD".into(),
            player_image: Some(String::new()),
        };

        let shown = present::<Player>(&images, record);
        assert_eq!(shown.player_image, None);
    }

    #[test]
    fn keyed_wraps_value() {
        let Json(body) = keyed("matches", Vec::<Match>::new()).unwrap();
        assert_eq!(body, json!({ "matches": [] }));
    }

    #[tokio::test]
    async fn unsupported_method_is_405() {
        let response = axum::response::IntoResponse::into_response(
            method_not_allowed(Method::TRACE).await,
        );
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
