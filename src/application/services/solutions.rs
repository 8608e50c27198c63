//! Persistence of enumerated solutions

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::solutions::{SolutionSet, SolutionsDocument};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::infrastructure::traits::FileSystem;

/// Solutions read back from disk.
#[derive(Debug, Clone)]
pub struct StoredSolutions {
    pub solutions: SolutionSet,
    pub model_hash: String,
    /// Catalog changed since the solutions were written
    pub outdated: bool,
}

/// Service reading and writing solutions files.
pub struct SolutionStore {
    fs: Arc<dyn FileSystem>,
}

impl SolutionStore {
    /// Create a new solution store.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Write `solutions` tagged with the hash of the catalog they come from.
    #[instrument(level = "debug", skip(self, solutions))]
    pub fn save(
        &self,
        solutions: &SolutionSet,
        model_hash: &str,
        path: &Path,
    ) -> ApplicationResult<()> {
        let document = SolutionsDocument {
            model_hash: model_hash.to_string(),
            solutions: solutions.solutions().to_vec(),
        };
        let content =
            toml::to_string_pretty(&document).map_err(|e| ApplicationError::OperationFailed {
                context: "serialize solutions".to_string(),
                source: Box::new(e),
            })?;
        self.fs
            .ensure_parent(path)
            .with_path_context("create directory for", path)?;
        self.fs
            .write(path, &content)
            .with_path_context("write solutions", path)?;
        debug!(count = solutions.len(), "solutions saved");
        Ok(())
    }

    /// Read the solutions file and compare its catalog hash with
    /// `current_model_hash`.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path, current_model_hash: &str) -> ApplicationResult<StoredSolutions> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read solutions", path)?;
        let document: SolutionsDocument =
            toml::from_str(&content).map_err(|e| ApplicationError::parse(path, e.to_string()))?;
        let outdated = document.model_hash != current_model_hash;
        if outdated {
            info!(
                stored = %document.model_hash,
                current = %current_model_hash,
                "solutions are outdated"
            );
        }
        Ok(StoredSolutions {
            solutions: SolutionSet::from_solutions(document.solutions),
            model_hash: document.model_hash,
            outdated,
        })
    }
}
