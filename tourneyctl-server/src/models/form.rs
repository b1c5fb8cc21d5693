//! Decoded request body: field name to text value or uploaded file
//!
//! Every write endpoint sees the same shape regardless of HTTP method or
//! body encoding. Decoding lives in `http::form`.

use std::collections::BTreeMap;

use axum::body::Bytes;

use super::ValidationError;

/// Maximum length for stored text fields
pub const MAX_TEXT_LEN: usize = 255;

/// A file part from a multipart body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Original filename as sent by the client
    pub filename: String,
    /// Content type declared on the part, if any
    pub content_type: Option<String>,
    /// Raw file bytes
    pub content: Bytes,
}

/// A single decoded field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(Upload),
}

/// Decoded form fields keyed by (case-sensitive) name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: BTreeMap<String, FormValue>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a plain value, trimmed of surrounding whitespace.
    ///
    /// A repeated name replaces the earlier value.
    pub fn insert_text(&mut self, name: impl Into<String>, value: &str) {
        self.fields
            .insert(name.into(), FormValue::Text(value.trim().to_owned()));
    }

    pub fn insert_file(&mut self, name: impl Into<String>, upload: Upload) {
        self.fields.insert(name.into(), FormValue::File(upload));
    }

    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.fields.get(name)
    }

    /// Text value for `name`; `None` for absent fields and file parts.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(FormValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    /// File part for `name`; `None` for absent fields and text values.
    pub fn file(&self, name: &str) -> Option<&Upload> {
        match self.fields.get(name) {
            Some(FormValue::File(upload)) => Some(upload),
            _ => None,
        }
    }

    /// Remove and return the file part for `name`.
    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        match self.fields.remove(name) {
            Some(FormValue::File(upload)) => Some(upload),
            Some(other) => {
                self.fields.insert(name.to_owned(), other);
                None
            }
            None => None,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Collect required text fields in the order given.
    ///
    /// Absent or blank fields are reported together as
    /// [`ValidationError::Missing`]; over-long values as `TooLong`.
    pub fn require_text(&self, names: &[&'static str]) -> Result<Vec<String>, ValidationError> {
        let missing: Vec<&'static str> = names
            .iter()
            .copied()
            .filter(|name| self.text(name).map_or(true, str::is_empty))
            .collect();

        if !missing.is_empty() {
            return Err(ValidationError::Missing { fields: missing });
        }

        names
            .iter()
            .map(|&name| {
                let value = self.text(name).unwrap_or_default();
                if value.chars().count() > MAX_TEXT_LEN {
                    Err(ValidationError::TooLong {
                        field: name,
                        max: MAX_TEXT_LEN,
                    })
                } else {
                    Ok(value.to_owned())
                }
            })
            .collect()
    }
}
