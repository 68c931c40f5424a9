//! The stage catalog: ordered statements per stage.
//!
//! The catalog is the only place that knows the ordering between statements
//! and between stages. It is built once, before a run, from a
//! [`StatementSource`] backend (embedded text or a SQL directory) or from
//! explicit statement lists.

mod manifest;
mod source;

pub use manifest::{entries as manifest_entries, ManifestEntry, MANIFEST};
pub use source::{EmbeddedSource, FileSource, StatementSource};

use crate::core::{Artifact, ArtifactKind, StageName, Statement};
use crate::errors::WarehouseError;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::debug;

/// Ordered statements for each of the four stages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageCatalog {
    stages: BTreeMap<StageName, Vec<Statement>>,
}

impl StageCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the claims warehouse plan from `source`.
    ///
    /// The validate stage gets one count query per table created by the
    /// dims and facts stages.
    pub fn load(source: &dyn StatementSource) -> Result<Self, WarehouseError> {
        debug!(source = %source.describe(), "Loading stage catalog");

        let mut catalog = Self::new();
        for stage in [StageName::Views, StageName::Dims, StageName::Facts] {
            let statements = manifest_entries(stage)
                .map(|entry| {
                    let text = source.read(entry.path)?;
                    let artifact = match entry.kind {
                        ArtifactKind::View => Artifact::view(entry.artifact),
                        ArtifactKind::Table => Artifact::table(entry.artifact),
                    };
                    Ok::<_, WarehouseError>(Statement::creating(text, artifact))
                })
                .collect::<Result<Vec<_>, WarehouseError>>()?;
            catalog = catalog.with_stage(stage, statements)?;
        }
        catalog.with_derived_validation()
    }

    /// Loads the plan from the statements compiled into the binary.
    pub fn embedded() -> Result<Self, WarehouseError> {
        Self::load(&EmbeddedSource)
    }

    /// Loads the plan from a SQL directory.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, WarehouseError> {
        Self::load(&FileSource::new(dir.as_ref()))
    }

    /// Sets the statements of `stage`, replacing any previous ones.
    ///
    /// # Errors
    ///
    /// Fails if a views/dims/facts statement has no artifact, a validate
    /// statement has one, or an artifact name is already used by another
    /// statement in the catalog.
    pub fn with_stage(
        mut self,
        stage: StageName,
        statements: Vec<Statement>,
    ) -> Result<Self, WarehouseError> {
        self.stages.remove(&stage);

        let mut seen: HashSet<String> = self
            .stages
            .values()
            .flatten()
            .filter_map(|s| s.artifact_name().map(str::to_string))
            .collect();

        for (index, statement) in statements.iter().enumerate() {
            match (stage.produces_artifacts(), statement.artifact_name()) {
                (true, None) => {
                    return Err(WarehouseError::Catalog(format!(
                        "statement {} of stage '{stage}' does not name the artifact it creates",
                        index + 1
                    )));
                }
                (false, Some(name)) => {
                    return Err(WarehouseError::Catalog(format!(
                        "validate statement {} must not create artifact '{name}'",
                        index + 1
                    )));
                }
                (true, Some(name)) if !seen.insert(name.to_string()) => {
                    return Err(WarehouseError::Catalog(format!(
                        "artifact '{name}' is created more than once"
                    )));
                }
                _ => {}
            }
        }

        self.stages.insert(stage, statements);
        Ok(self)
    }

    /// Replaces the validate stage with a count query per dims/facts table.
    pub fn with_derived_validation(self) -> Result<Self, WarehouseError> {
        let counts: Vec<Statement> = self
            .tables()
            .iter()
            .map(Statement::row_count)
            .collect();
        self.with_stage(StageName::Validate, counts)
    }

    /// Returns the statements of `stage` in execution order.
    #[must_use]
    pub fn statements(&self, stage: StageName) -> &[Statement] {
        self.stages.get(&stage).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns the artifact names `stage` produces, in order.
    #[must_use]
    pub fn artifact_names(&self, stage: StageName) -> Vec<&str> {
        self.statements(stage)
            .iter()
            .filter_map(Statement::artifact_name)
            .collect()
    }

    /// Returns every table produced by the dims and facts stages, in order.
    #[must_use]
    pub fn tables(&self) -> Vec<Artifact> {
        [StageName::Dims, StageName::Facts]
            .into_iter()
            .flat_map(|stage| self.statements(stage))
            .filter_map(|s| s.artifact.clone())
            .filter(|a| a.kind == ArtifactKind::Table)
            .collect()
    }

    /// Total number of statements across all stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.values().map(Vec::len).sum()
    }

    /// Returns true if the catalog has no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
