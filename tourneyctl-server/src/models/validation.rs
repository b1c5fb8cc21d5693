//! Validation error types

use std::fmt;

/// Validation error for request input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// One or more required fields are absent or blank
    Missing { fields: Vec<&'static str> },

    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// Value doesn't match the required format (e.g., numeric id)
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Uploaded file is not a JPG, PNG or GIF image
    UnsupportedImageType { field: &'static str, found: String },

    /// Uploaded file is over the per-entity size limit
    ImageTooLarge { field: &'static str, max_bytes: u64 },

    /// Request body could not be decoded
    MalformedBody { reason: String },
}

impl ValidationError {
    /// Merge another missing-field list into this error.
    ///
    /// Non-`Missing` errors are left as they are; the first error wins.
    pub fn with_missing(self, extra: &[&'static str]) -> Self {
        match self {
            Self::Missing { mut fields } => {
                for &field in extra {
                    if !fields.contains(&field) {
                        fields.push(field);
                    }
                }
                Self::Missing { fields }
            }
            other => other,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { fields } => {
                write!(f, "missing required fields: {}", fields.join(", "))
            }
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => {
                write!(f, "{}: {}", field, reason)
            }
            Self::UnsupportedImageType { field, found } => write!(
                f,
                "{}: invalid file type '{}'. Only JPG, PNG, and GIF types are accepted",
                field, found
            ),
            Self::ImageTooLarge { field, max_bytes } => write!(
                f,
                "{}: file size exceeds the maximum limit of {}",
                field,
                human_size(*max_bytes)
            ),
            Self::MalformedBody { reason } => write!(f, "malformed request body: {}", reason),
        }
    }
}

impl std::error::Error for ValidationError {}

fn human_size(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "name",
            max: 255,
        };
        assert_eq!(
            err.to_string(),
            "name exceeds maximum length of 255 characters"
        );
    }

    #[test]
    fn size_limit_is_shown_in_megabytes() {
        let err = ValidationError::ImageTooLarge {
            field: "player_image",
            max_bytes: 5 * 1024 * 1024,
        };
        assert_eq!(
            err.to_string(),
            "player_image: file size exceeds the maximum limit of 5MB"
        );
    }

    #[test]
    fn with_missing_appends_without_duplicates() {
        let err = ValidationError::Missing { fields: vec!["name"] }.with_missing(&["name", "image"]);
        assert_eq!(
            err,
            ValidationError::Missing {
                fields: vec!["name", "image"]
            }
        );
    }

    #[test]
    fn with_missing_keeps_other_errors() {
        let err = ValidationError::Empty { field: "id" }.with_missing(&["image"]);
        assert_eq!(err, ValidationError::Empty { field: "id" });
    }
}
