//! Match: the top of the hierarchy, referenced by manager teams by name

use serde::Serialize;
use sqlx::FromRow;

use super::{Entity, FormData, Reference, ValidationError};
use crate::config::UploadLimits;

/// Match record from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Match {
    pub id: i64,
    pub name: String,
    pub shortname: String,
    pub image: Option<String>,
}

/// Validated match input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchFields {
    pub name: String,
    pub shortname: String,
}

impl Entity for Match {
    type Fields = MatchFields;
    type Record = Match;

    const LABEL: &'static str = "match";
    const TITLE: &'static str = "Match";
    const ONE: &'static str = "match";
    const MANY: &'static str = "matches";

    const TABLE: &'static str = "matches";
    const COLUMNS: &'static [&'static str] = &["name", "shortname"];
    const IMAGE_COLUMN: &'static str = "image";
    const IMAGE_REQUIRED: bool = true;

    fn parse_fields(form: &FormData) -> Result<MatchFields, ValidationError> {
        let mut values = form.require_text(Self::COLUMNS)?.into_iter();
        Ok(MatchFields {
            name: values.next().unwrap_or_default(),
            shortname: values.next().unwrap_or_default(),
        })
    }

    fn values(fields: &MatchFields) -> Vec<&str> {
        vec![fields.name.as_str(), fields.shortname.as_str()]
    }

    fn reference(_: &MatchFields) -> Option<Reference<'_>> {
        None
    }

    fn assemble(id: i64, fields: MatchFields, image: Option<String>) -> Match {
        Match {
            id,
            name: fields.name,
            shortname: fields.shortname,
            image,
        }
    }

    fn id(record: &Match) -> i64 {
        record.id
    }

    fn image(record: &Match) -> Option<&str> {
        record.image.as_deref()
    }

    fn set_image(record: &mut Match, image: Option<String>) {
        record.image = image;
    }

    fn image_limit(limits: &UploadLimits) -> u64 {
        limits.match_max_bytes
    }
}
