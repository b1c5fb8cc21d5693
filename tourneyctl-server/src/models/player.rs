//! Player: belongs to a manager team, identified by team and match name

use serde::Serialize;
use sqlx::FromRow;

use super::{Entity, FormData, Reference, ValidationError};
use crate::config::UploadLimits;

/// Player record from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Player {
    pub id: i64,
    pub team_name: String,
    pub match_name: String,
    pub player_name: String,
    pub player_shortname: String,
    pub player_image: Option<String>,
}

/// Validated player input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerFields {
    pub team_name: String,
    pub match_name: String,
    pub player_name: String,
    pub player_shortname: String,
}

impl Entity for Player {
    type Fields = PlayerFields;
    type Record = Player;

    const LABEL: &'static str = "player";
    const TITLE: &'static str = "Player";
    const ONE: &'static str = "player";
    const MANY: &'static str = "players";

    const TABLE: &'static str = "players";
    const COLUMNS: &'static [&'static str] =
        &["team_name", "match_name", "player_name", "player_shortname"];
    const IMAGE_COLUMN: &'static str = "player_image";
    const IMAGE_REQUIRED: bool = true;

    fn parse_fields(form: &FormData) -> Result<PlayerFields, ValidationError> {
        let mut values = form.require_text(Self::COLUMNS)?.into_iter();
        Ok(PlayerFields {
            team_name: values.next().unwrap_or_default(),
            match_name: values.next().unwrap_or_default(),
            player_name: values.next().unwrap_or_default(),
            player_shortname: values.next().unwrap_or_default(),
        })
    }

    fn values(fields: &PlayerFields) -> Vec<&str> {
        vec![
            fields.team_name.as_str(),
            fields.match_name.as_str(),
            fields.player_name.as_str(),
            fields.player_shortname.as_str(),
        ]
    }

    fn reference(fields: &PlayerFields) -> Option<Reference<'_>> {
        Some(Reference::Team {
            team_name: &fields.team_name,
            match_name: &fields.match_name,
        })
    }

    fn assemble(id: i64, fields: PlayerFields, image: Option<String>) -> Player {
        Player {
            id,
            team_name: fields.team_name,
            match_name: fields.match_name,
            player_name: fields.player_name,
            player_shortname: fields.player_shortname,
            player_image: image,
        }
    }

    fn id(record: &Player) -> i64 {
        record.id
    }

    fn image(record: &Player) -> Option<&str> {
        record.player_image.as_deref()
    }

    fn set_image(record: &mut Player, image: Option<String>) {
        record.player_image = image;
    }

    fn image_limit(limits: &UploadLimits) -> u64 {
        limits.player_max_bytes
    }
}
