//! Warehouse artifacts: the views and tables statements produce.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of object an artifact is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// A view.
    View,
    /// A table (CTAS).
    Table,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::View => write!(f, "view"),
            Self::Table => write!(f, "table"),
        }
    }
}

/// A named view or table produced by a successful statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artifact {
    /// Object name in the target database.
    pub name: String,
    /// Whether it is a view or a table.
    pub kind: ArtifactKind,
}

impl Artifact {
    /// Creates a view artifact.
    #[must_use]
    pub fn view(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ArtifactKind::View,
        }
    }

    /// Creates a table artifact.
    #[must_use]
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ArtifactKind::Table,
        }
    }

    /// Returns the idempotent removal statement for this artifact.
    #[must_use]
    pub fn drop_statement(&self) -> String {
        match self.kind {
            ArtifactKind::View => format!("DROP VIEW IF EXISTS {}", self.name),
            ArtifactKind::Table => format!("DROP TABLE IF EXISTS {}", self.name),
        }
    }

    /// Returns the row-count query used by the validate stage.
    #[must_use]
    pub fn count_statement(&self) -> String {
        format!(
            "SELECT '{name}' AS table_name, COUNT(*) AS cnt FROM {name}",
            name = self.name
        )
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}
