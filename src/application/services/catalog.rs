//! Catalog loading and saving

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::application::catalog::{demo_catalog, CatalogDocument};
use crate::application::hash::content_hash;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::Catalog;
use crate::infrastructure::traits::FileSystem;

/// Service reading and writing catalog files.
pub struct CatalogService {
    fs: Arc<dyn FileSystem>,
}

impl CatalogService {
    /// Create a new catalog service.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Parse and validate the catalog at `path`.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<Catalog> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read catalog", path)?;
        let document: CatalogDocument =
            toml::from_str(&content).map_err(|e| ApplicationError::parse(path, e.to_string()))?;
        let tree = document.into_tree()?;
        debug!(nodes = tree.len(), "catalog loaded");
        Ok(tree)
    }

    /// Load `path`, or the demo catalog if there is no such file.
    pub fn load_or_demo(&self, path: &Path) -> ApplicationResult<Catalog> {
        if self.fs.exists(path) {
            self.load(path)
        } else {
            warn!("no catalog at {}, using the demo catalog", path.display());
            Ok(demo_catalog())
        }
    }

    /// Write `tree` to `path`, creating parent directories.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn save(&self, tree: &Catalog, path: &Path) -> ApplicationResult<()> {
        let content = Self::render(tree)?;
        self.fs
            .ensure_parent(path)
            .with_path_context("create directory for", path)?;
        self.fs
            .write(path, &content)
            .with_path_context("write catalog", path)?;
        debug!(nodes = tree.len(), "catalog saved");
        Ok(())
    }

    /// 8-hex hash of the catalog file content.
    ///
    /// Without a file the hash of the rendered demo catalog is returned, in
    /// line with [`CatalogService::load_or_demo`].
    pub fn model_hash(&self, path: &Path) -> ApplicationResult<String> {
        if !self.fs.exists(path) {
            return Ok(content_hash(Self::render(&demo_catalog())?.as_bytes()));
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read catalog for hashing", path)?;
        Ok(content_hash(content.as_bytes()))
    }

    /// Catalog as TOML text.
    pub fn render(tree: &Catalog) -> ApplicationResult<String> {
        toml::to_string_pretty(&CatalogDocument::from_tree(tree)).map_err(|e| {
            ApplicationError::OperationFailed {
                context: "serialize catalog".to_string(),
                source: Box::new(e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use crate::infrastructure::traits::RealFileSystem;
    use tempfile::TempDir;

    fn service() -> CatalogService {
        CatalogService::new(Arc::new(RealFileSystem))
    }

    #[test]
    fn saved_catalog_loads_back_equal() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/catalog.toml");
        let tree = demo_catalog();

        service().save(&tree, &path).unwrap();
        let loaded = service().load(&path).unwrap();

        assert_eq!(
            CatalogDocument::from_tree(&loaded),
            CatalogDocument::from_tree(&tree)
        );
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.toml");
        std::fs::write(&path, "[root\nname=").unwrap();

        let err = service().load(&path).unwrap_err();

        assert!(matches!(err, ApplicationError::Parse { .. }));
    }

    #[test]
    fn validation_failures_surface_as_domain_errors() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.toml");
        std::fs::write(&path, "[root]\nname = \"Gas\"\nprice = -1\n").unwrap();

        let err = service().load(&path).unwrap_err();

        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::NegativePrice { .. })
        ));
    }

    #[test]
    fn model_hash_changes_with_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.toml");
        let mut tree = demo_catalog();
        service().save(&tree, &path).unwrap();
        let before = service().model_hash(&path).unwrap();

        let root = tree.root().unwrap();
        tree.value_mut(root).set_name("Brand");
        service().save(&tree, &path).unwrap();

        assert_ne!(service().model_hash(&path).unwrap(), before);
    }

    #[test]
    fn missing_file_falls_back_to_demo() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.toml");

        let tree = service().load_or_demo(&path).unwrap();

        assert_eq!(tree.len(), demo_catalog().len());
        assert_eq!(service().model_hash(&path).unwrap().len(), 8);
    }
}
