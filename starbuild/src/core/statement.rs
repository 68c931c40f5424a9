//! Opaque query statements.

use super::Artifact;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Maximum number of characters shown when logging statement text.
pub const PREVIEW_CHARS: usize = 200;

/// One unit of query text submitted to the engine.
///
/// The text is never parsed; it is submitted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// The query text.
    pub text: String,
    /// Human-readable label used in logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// The view or table this statement creates, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Artifact>,
    /// The table a validation count reads, if this is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<String>,
}

impl Statement {
    /// Creates a statement with no label and no artifact.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: None,
            artifact: None,
            counts: None,
        }
    }

    /// Creates a statement producing `artifact`, labelled after it.
    #[must_use]
    pub fn creating(text: impl Into<String>, artifact: Artifact) -> Self {
        let label = format!("Create {} {}", artifact.kind, artifact.name);
        Self {
            text: text.into(),
            label: Some(label),
            artifact: Some(artifact),
            counts: None,
        }
    }

    /// Creates the count query the validate stage runs for `table`.
    #[must_use]
    pub fn row_count(table: &Artifact) -> Self {
        Self {
            counts: Some(table.name.clone()),
            ..Self::new(table.count_statement())
                .with_label(format!("Validation count {}", table.name))
        }
    }

    /// Returns the table a [`Statement::row_count`] query counts.
    #[must_use]
    pub fn counted_table(&self) -> Option<&str> {
        self.counts.as_deref()
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns the name of the produced artifact, if any.
    #[must_use]
    pub fn artifact_name(&self) -> Option<&str> {
        self.artifact.as_ref().map(|a| a.name.as_str())
    }

    /// Returns the statement text truncated for logging.
    #[must_use]
    pub fn preview(&self) -> String {
        preview(&self.text)
    }

    /// Returns a short SHA-256 fingerprint of the text.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.text)
    }
}

/// Truncates query text to [`PREVIEW_CHARS`] characters.
#[must_use]
pub fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// First 12 hex characters of the SHA-256 of `text`.
#[must_use]
pub fn fingerprint(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(12);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creating_sets_label_and_artifact() {
        let stmt = Statement::creating("CREATE OR REPLACE VIEW v AS SELECT 1", Artifact::view("v"));

        assert_eq!(stmt.label.as_deref(), Some("Create view v"));
        assert_eq!(stmt.artifact_name(), Some("v"));
    }

    #[test]
    fn test_row_count_names_counted_table() {
        let stmt = Statement::row_count(&Artifact::table("dim_date_etl"));

        assert_eq!(stmt.counted_table(), Some("dim_date_etl"));
        assert!(stmt.artifact.is_none());
        assert_eq!(Statement::new("SELECT 1").counted_table(), None);
    }

    #[test]
    fn test_counted_table_survives_relabel() {
        let stmt = Statement::row_count(&Artifact::table("fact_claims_etl"))
            .with_label("Row count fact_claims_etl");
        assert_eq!(stmt.counted_table(), Some("fact_claims_etl"));

        let labelled = Statement::new("SELECT 'x', COUNT(*) AS cnt FROM x")
            .with_label("Validation count x");
        assert_eq!(labelled.counted_table(), None);

        let json = serde_json::to_value(&stmt).unwrap();
        assert_eq!(json["counts"], "fact_claims_etl");
        let back: Statement = serde_json::from_value(json).unwrap();
        assert_eq!(back.counted_table(), Some("fact_claims_etl"));
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let text = "x".repeat(250);
        let stmt = Statement::new(text);

        let preview = stmt.preview();
        assert_eq!(preview.len(), PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
        assert_eq!(Statement::new("SELECT 1").preview(), "SELECT 1");
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = Statement::new("SELECT 1");
        let b = Statement::new("SELECT 1");
        let c = Statement::new("SELECT 2");

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 12);
    }
}
