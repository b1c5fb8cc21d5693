//! The contract shared by every administered resource
//!
//! Match, ManagerTeam and Player differ only in their columns, their
//! referential check and their image rules. Handlers and repositories are
//! written once against this trait.

use serde::Serialize;

use super::{FormData, ValidationError};
use crate::config::UploadLimits;

/// A row another entity must exist alongside, checked by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
    /// A match with this `name`
    Match { name: &'a str },
    /// A manager team with this (`team_name`, `match_name`) pair
    Team {
        team_name: &'a str,
        match_name: &'a str,
    },
}

impl Reference<'_> {
    /// Resource label and identifier used in not-found errors.
    pub fn describe(&self) -> (&'static str, String) {
        match self {
            Self::Match { name } => ("match", (*name).to_owned()),
            Self::Team {
                team_name,
                match_name,
            } => ("manager team", format!("{}/{}", team_name, match_name)),
        }
    }
}

pub trait Entity: Send + Sync + 'static {
    /// Validated text fields, in `COLUMNS` order
    type Fields: Clone + Send + Sync + 'static;

    /// A persisted row
    type Record: Serialize + Clone + Send + Sync + Unpin + 'static;

    /// Lowercase name used in logs and not-found errors
    const LABEL: &'static str;
    /// Capitalized name used in response messages
    const TITLE: &'static str;
    /// Response key for a single record
    const ONE: &'static str;
    /// Response key for a list of records
    const MANY: &'static str;

    const TABLE: &'static str;
    /// Text columns, also the form field names
    const COLUMNS: &'static [&'static str];
    /// Image column, also the form field carrying the file
    const IMAGE_COLUMN: &'static str;
    /// Whether create refuses a request without an image
    const IMAGE_REQUIRED: bool;

    fn parse_fields(form: &FormData) -> Result<Self::Fields, ValidationError>;

    /// Field values for binding, in `COLUMNS` order.
    fn values(fields: &Self::Fields) -> Vec<&str>;

    fn reference(fields: &Self::Fields) -> Option<Reference<'_>>;

    fn assemble(id: i64, fields: Self::Fields, image: Option<String>) -> Self::Record;

    fn id(record: &Self::Record) -> i64;

    fn image(record: &Self::Record) -> Option<&str>;

    fn set_image(record: &mut Self::Record, image: Option<String>);

    fn image_limit(limits: &UploadLimits) -> u64;
}
