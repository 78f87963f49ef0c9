//! Persisted show configuration documents (JSON)

use std::path::Path;

use vibecast_core::prelude::*;
use vibecast_core::ConfigDocument;

/// Read a configuration document.
///
/// # Errors
///
/// - [`Error::ConfigNotFound`] if `path` does not exist
/// - [`Error::Json`] if the file is not a valid document
pub fn load_document(path: &Path) -> Result<ConfigDocument> {
    if !path.exists() {
        return Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    let document = serde_json::from_str(&content)?;
    debug!("Loaded configuration document from {:?}", path);
    Ok(document)
}

/// Write `document` as pretty JSON, creating parent directories.
pub fn save_document(path: &Path, document: &ConfigDocument) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(document)?;
    std::fs::write(path, content)?;
    info!("Saved configuration document to {:?}", path);
    Ok(())
}
