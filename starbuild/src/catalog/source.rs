//! Statement text backends.

use crate::errors::WarehouseError;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Resolves a manifest path to statement text.
pub trait StatementSource: Send + Sync + Debug {
    /// Returns the text stored at `path`.
    fn read(&self, path: &str) -> Result<String, WarehouseError>;

    /// Short backend name for logs.
    fn describe(&self) -> String;
}

/// Statement text compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedSource;

impl EmbeddedSource {
    fn lookup(path: &str) -> Option<&'static str> {
        let text = match path {
            "01-views/v_providers_etl.sql" => include_str!("../../sql/01-views/v_providers_etl.sql"),
            "01-views/v_patients_etl.sql" => include_str!("../../sql/01-views/v_patients_etl.sql"),
            "01-views/v_inpatient_claims_etl.sql" => {
                include_str!("../../sql/01-views/v_inpatient_claims_etl.sql")
            }
            "01-views/v_outpatient_claims_etl.sql" => {
                include_str!("../../sql/01-views/v_outpatient_claims_etl.sql")
            }
            "01-views/v_all_claims_etl.sql" => include_str!("../../sql/01-views/v_all_claims_etl.sql"),
            "02-dims/dim_date_etl.sql" => include_str!("../../sql/02-dims/dim_date_etl.sql"),
            "02-dims/dim_provider_etl.sql" => include_str!("../../sql/02-dims/dim_provider_etl.sql"),
            "02-dims/dim_patient_etl.sql" => include_str!("../../sql/02-dims/dim_patient_etl.sql"),
            "02-dims/dim_diagnosis_etl.sql" => include_str!("../../sql/02-dims/dim_diagnosis_etl.sql"),
            "02-dims/dim_procedure_etl.sql" => include_str!("../../sql/02-dims/dim_procedure_etl.sql"),
            "03-facts/fact_claims_etl.sql" => include_str!("../../sql/03-facts/fact_claims_etl.sql"),
            "03-facts/fact_provider_summary_etl.sql" => {
                include_str!("../../sql/03-facts/fact_provider_summary_etl.sql")
            }
            "03-facts/fact_patient_claims_summary_etl.sql" => {
                include_str!("../../sql/03-facts/fact_patient_claims_summary_etl.sql")
            }
            _ => return None,
        };
        Some(text)
    }
}

impl StatementSource for EmbeddedSource {
    fn read(&self, path: &str) -> Result<String, WarehouseError> {
        Self::lookup(path)
            .map(str::to_string)
            .ok_or_else(|| WarehouseError::StatementNotFound {
                path: path.to_string(),
            })
    }

    fn describe(&self) -> String {
        "embedded".to_string()
    }
}

/// Statement text read from a SQL directory at load time.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    /// Creates a source rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the SQL directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl StatementSource for FileSource {
    fn read(&self, path: &str) -> Result<String, WarehouseError> {
        let full_path = self.root.join(path);
        if !full_path.is_file() {
            return Err(WarehouseError::StatementNotFound {
                path: full_path.display().to_string(),
            });
        }
        Ok(std::fs::read_to_string(full_path)?)
    }

    fn describe(&self) -> String {
        format!("files under {}", self.root.display())
    }
}
