//! Entity rows as the hosted backend returns them, and mutation payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use toppers_core::{AdminUserId, CategoryIcon, CategoryId, Email, ProductId};

/// The `categories(name, icon)` relation embedded in product reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub name: String,
    pub icon: String,
}

/// A product row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category_id: CategoryId,
    pub material: String,
    pub occasion: String,
    pub theme: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Joined category. Absent on mutation results and when the category row
    /// no longer resolves.
    #[serde(rename = "categories", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategorySummary>,
}

/// A category row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// Either a short glyph or an image URL; see [`Category::icon`].
    pub icon: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Interpret the stored icon text.
    #[must_use]
    pub fn icon(&self) -> CategoryIcon<'_> {
        CategoryIcon::classify(&self.icon)
    }
}

/// Insert payload for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub category_id: CategoryId,
    pub material: String,
    pub occasion: String,
    pub theme: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

/// Partial update for a product. Only `Some` fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occasion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    /// Stamped by the query layer on every update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProductUpdate {
    /// Whether the update carries no business field.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category_id.is_none()
            && self.material.is_none()
            && self.occasion.is_none()
            && self.theme.is_none()
            && self.image_url.is_none()
            && self.featured.is_none()
    }
}

/// Insert payload for a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub icon: String,
}

impl NewCategory {
    /// Copy with surrounding whitespace removed from both fields.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_owned(),
            icon: self.icon.trim().to_owned(),
        }
    }
}

/// Category updates always send both fields.
pub type CategoryUpdate = NewCategory;

/// The admin user record kept in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: AdminUserId,
    pub email: Email,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// An admin user row including its stored credential.
///
/// Implements `Debug` manually so the hash never reaches the logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct AdminCredential {
    #[serde(flatten)]
    pub user: AdminUser,
    /// Argon2 PHC string. Rows without one can never sign in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
}

impl std::fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredential")
            .field("user", &self.user)
            .field(
                "password_hash",
                &self.password_hash.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// A binary file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Original file name; only its extension is kept.
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}
