//! Manager team: belongs to a match by name

use serde::Serialize;
use sqlx::FromRow;

use super::{Entity, FormData, Reference, ValidationError};
use crate::config::UploadLimits;

/// Manager team record from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ManagerTeam {
    pub id: i64,
    pub match_name: String,
    pub team_name: String,
    pub shortname: String,
    pub image: Option<String>,
}

/// Validated manager team input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamFields {
    pub match_name: String,
    pub team_name: String,
    pub shortname: String,
}

impl Entity for ManagerTeam {
    type Fields = TeamFields;
    type Record = ManagerTeam;

    const LABEL: &'static str = "manager team";
    const TITLE: &'static str = "Manager team";
    const ONE: &'static str = "team";
    const MANY: &'static str = "teams";

    const TABLE: &'static str = "manageteam";
    const COLUMNS: &'static [&'static str] = &["match_name", "team_name", "shortname"];
    const IMAGE_COLUMN: &'static str = "image";
    const IMAGE_REQUIRED: bool = false;

    fn parse_fields(form: &FormData) -> Result<TeamFields, ValidationError> {
        let mut values = form.require_text(Self::COLUMNS)?.into_iter();
        Ok(TeamFields {
            match_name: values.next().unwrap_or_default(),
            team_name: values.next().unwrap_or_default(),
            shortname: values.next().unwrap_or_default(),
        })
    }

    fn values(fields: &TeamFields) -> Vec<&str> {
        vec![fields.match_name.as_str(), fields.team_name.as_str(), fields.shortname.as_str()]
    }

    fn reference(fields: &TeamFields) -> Option<Reference<'_>> {
        Some(Reference::Match {
            name: &fields.match_name,
        })
    }

    fn assemble(id: i64, fields: TeamFields, image: Option<String>) -> ManagerTeam {
        ManagerTeam {
            id,
            match_name: fields.match_name,
            team_name: fields.team_name,
            shortname: fields.shortname,
            image,
        }
    }

    fn id(record: &ManagerTeam) -> i64 {
        record.id
    }

    fn image(record: &ManagerTeam) -> Option<&str> {
        record.image.as_deref()
    }

    fn set_image(record: &mut ManagerTeam, image: Option<String>) {
        record.image = image;
    }

    fn image_limit(limits: &UploadLimits) -> u64 {
        limits.team_max_bytes
    }
}
