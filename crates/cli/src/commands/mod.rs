//! Command implementations and the context they share.

pub mod admin;
pub mod categories;
pub mod favorites;
pub mod products;

use std::path::Path;

use toppers_catalog::backend::RestStore;
use toppers_catalog::config::CatalogConfig;
use toppers_catalog::favorites::FavoritesStore;
use toppers_catalog::models::ImageUpload;
use toppers_catalog::session::SessionStore;
use toppers_catalog::storage::FileStorage;
use toppers_catalog::CatalogClient;

/// Boxed error returned by every command.
pub type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Backend client and local state, built from the environment.
pub struct Context {
    pub client: CatalogClient,
    pub storage: FileStorage,
}

impl Context {
    /// Load configuration and connect.
    pub fn from_env() -> CommandResult<Self> {
        let config = CatalogConfig::from_env()?;
        tracing::debug!(
            api_url = %config.backend.api_url,
            data_dir = %config.data_dir.display(),
            "Configuration loaded"
        );

        let client = CatalogClient::new(
            RestStore::new(&config.backend),
            config.query.clone(),
            &config.placeholder_image,
        );

        Ok(Self {
            client,
            storage: FileStorage::new(config.data_dir),
        })
    }

    pub fn favorites(&self) -> CommandResult<FavoritesStore<&FileStorage>> {
        Ok(FavoritesStore::load(&self.storage)?)
    }

    pub fn session(&self) -> CommandResult<SessionStore<&FileStorage>> {
        Ok(SessionStore::load(&self.storage)?)
    }

    /// Fail unless an admin is signed in.
    pub fn require_admin(&self) -> CommandResult {
        let session = self.session()?;
        let admin = session.require_admin()?;
        tracing::debug!(user_id = %admin.id, "Admin session active");
        Ok(())
    }
}

/// Read an image file for upload.
pub async fn read_image(path: &Path) -> CommandResult<ImageUpload> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| format!("Not a file path: {}", path.display()))?
        .to_owned();

    Ok(ImageUpload {
        content_type: content_type_for(&file_name).to_owned(),
        file_name,
        bytes,
    })
}

fn content_type_for(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("topo.PNG"), "image/png");
        assert_eq!(content_type_for("foto.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("icone.svg"), "image/svg+xml");
        assert_eq!(content_type_for("arquivo"), "application/octet-stream");
    }
}
