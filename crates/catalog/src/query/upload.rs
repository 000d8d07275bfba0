//! Object keys for uploaded images.

use std::path::Path;

use chrono::{DateTime, Utc};

use toppers_core::{CategoryId, ProductId};

/// Extension used when the file name has none.
const DEFAULT_EXTENSION: &str = "bin";

/// The record an uploaded image belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOwner {
    /// An existing product or category.
    Existing(String),
    /// A record not created yet. The upload time stands in for its id.
    Pending,
}

impl From<&ProductId> for ImageOwner {
    fn from(id: &ProductId) -> Self {
        Self::Existing(id.to_string())
    }
}

impl From<&CategoryId> for ImageOwner {
    fn from(id: &CategoryId) -> Self {
        Self::Existing(id.to_string())
    }
}

impl<T> From<Option<T>> for ImageOwner
where
    T: Into<Self>,
{
    fn from(owner: Option<T>) -> Self {
        owner.map_or(Self::Pending, Into::into)
    }
}

/// Build the key `{owner}-{unix_millis}.{ext}`.
#[must_use]
pub fn storage_key(owner: &ImageOwner, file_name: &str, at: DateTime<Utc>) -> String {
    let millis = at.timestamp_millis();
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .unwrap_or(DEFAULT_EXTENSION);

    match owner {
        ImageOwner::Existing(id) => format!("{id}-{millis}.{extension}"),
        ImageOwner::Pending => format!("{millis}-{millis}.{extension}"),
    }
}
