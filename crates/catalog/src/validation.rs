//! Input checks applied before a payload reaches the backend.
//!
//! Every failing field is reported, not only the first.

use core::fmt;

use secrecy::{ExposeSecret, SecretString};
use toppers_core::{CategoryId, Email};

use crate::models::{NewCategory, NewProduct, ProductUpdate};

const MIN_PRODUCT_NAME: usize = 3;
const MIN_PRODUCT_DESCRIPTION: usize = 10;
const MIN_CLASSIFICATION: usize = 2;
const MIN_CATEGORY_NAME: usize = 2;

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All fields rejected by one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    fn min_chars(&mut self, field: &'static str, value: &str, min: usize) {
        if value.trim().chars().count() < min {
            self.push(field, format!("must be at least {min} characters"));
        }
    }

    fn category_id(&mut self, id: &CategoryId) {
        if !id.is_uuid() {
            self.push("category_id", "must be a valid category");
        }
    }

    fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// The rejected fields, in check order.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Whether `field` was rejected.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl NewProduct {
    /// Check the product form fields.
    ///
    /// # Errors
    ///
    /// Returns every field that is too short, and a `category_id` that is
    /// not a UUID.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.min_chars("name", &self.name, MIN_PRODUCT_NAME);
        errors.min_chars("description", &self.description, MIN_PRODUCT_DESCRIPTION);
        errors.category_id(&self.category_id);
        errors.min_chars("material", &self.material, MIN_CLASSIFICATION);
        errors.min_chars("occasion", &self.occasion, MIN_CLASSIFICATION);
        errors.min_chars("theme", &self.theme, MIN_CLASSIFICATION);
        errors.into_result()
    }
}

impl ProductUpdate {
    /// Check the fields present in the update with the product form rules.
    ///
    /// # Errors
    ///
    /// Same rules as [`NewProduct::validate`], applied to `Some` fields only.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if let Some(name) = &self.name {
            errors.min_chars("name", name, MIN_PRODUCT_NAME);
        }
        if let Some(description) = &self.description {
            errors.min_chars("description", description, MIN_PRODUCT_DESCRIPTION);
        }
        if let Some(category_id) = &self.category_id {
            errors.category_id(category_id);
        }
        for (field, value) in [
            ("material", &self.material),
            ("occasion", &self.occasion),
            ("theme", &self.theme),
        ] {
            if let Some(value) = value {
                errors.min_chars(field, value, MIN_CLASSIFICATION);
            }
        }
        errors.into_result()
    }
}

impl NewCategory {
    /// Check the category form fields.
    ///
    /// # Errors
    ///
    /// Returns a short `name` and an empty `icon`.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.min_chars("name", &self.name, MIN_CATEGORY_NAME);
        if self.icon.trim().is_empty() {
            errors.push("icon", "is required");
        }
        errors.into_result()
    }
}

/// Check the login form and return the parsed email.
///
/// # Errors
///
/// Returns a malformed `email` and an empty `password`.
pub fn validate_login(email: &str, password: &SecretString) -> Result<Email, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let parsed = Email::parse(email)
        .map_err(|e| errors.push("email", e.to_string()))
        .ok();
    if password.expose_secret().is_empty() {
        errors.push("password", "is required");
    }

    match parsed {
        Some(email) if errors.errors.is_empty() => Ok(email),
        _ => Err(errors),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_product() -> NewProduct {
        NewProduct {
            name: "Topo Safari".to_owned(),
            description: "Topo com animais da selva".to_owned(),
            category_id: CategoryId::new("0b7d3c1e-2f4a-4a8e-9d51-6c0f1e2a3b4c"),
            material: "Papel".to_owned(),
            occasion: "Aniversário".to_owned(),
            theme: "Safari".to_owned(),
            image_url: None,
            featured: false,
        }
    }

    #[test]
    fn test_valid_product() {
        assert!(valid_product().validate().is_ok());
    }

    #[test]
    fn test_product_collects_every_field() {
        let product = NewProduct {
            name: "To".to_owned(),
            description: "curta".to_owned(),
            category_id: CategoryId::new("Infantil"),
            material: "P".to_owned(),
            ..valid_product()
        };

        let errors = product.validate().unwrap_err();
        assert_eq!(errors.errors().len(), 4);
        for field in ["name", "description", "category_id", "material"] {
            assert!(errors.has(field), "{field} should be rejected");
        }
        assert!(!errors.has("theme"));
        assert!(errors.to_string().starts_with("name: must be at least 3 characters"));
    }

    #[test]
    fn test_update_checks_present_fields_only() {
        assert!(ProductUpdate::default().validate().is_ok());

        let update = ProductUpdate {
            theme: Some(" ".to_owned()),
            featured: Some(true),
            ..ProductUpdate::default()
        };
        let errors = update.validate().unwrap_err();
        assert!(errors.has("theme"));
        assert_eq!(errors.errors().len(), 1);
    }

    #[test]
    fn test_category_rules() {
        let category = NewCategory {
            name: "C".to_owned(),
            icon: "  ".to_owned(),
        };
        let errors = category.validate().unwrap_err();
        assert!(errors.has("name"));
        assert!(errors.has("icon"));

        let category = NewCategory {
            name: "Casamento".to_owned(),
            icon: "💍".to_owned(),
        };
        assert!(category.validate().is_ok());
    }

    #[test]
    fn test_login_rules() {
        let password = SecretString::from("segredo".to_owned());
        let email = validate_login(" Admin@Toppers.Example ", &password).unwrap();
        assert_eq!(email.as_str(), "admin@toppers.example");

        let errors = validate_login("not-an-email", &SecretString::from(String::new())).unwrap_err();
        assert!(errors.has("email"));
        assert!(errors.has("password"));
    }
}
