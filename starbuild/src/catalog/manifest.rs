//! The warehouse build plan: which statement file produces which artifact.
//!
//! Order within a stage is the dependency order. `dim_date_etl` reads
//! `v_all_claims_etl`, which reads the two claim views before it; the fact
//! tables join the dimension tables.

use crate::core::{ArtifactKind, StageName};

/// One create step in the build plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Stage the step belongs to.
    pub stage: StageName,
    /// Statement path relative to the SQL directory.
    pub path: &'static str,
    /// Name of the produced view or table.
    pub artifact: &'static str,
    /// Whether the artifact is a view or a table.
    pub kind: ArtifactKind,
}

const fn view(path: &'static str, artifact: &'static str) -> ManifestEntry {
    ManifestEntry {
        stage: StageName::Views,
        path,
        artifact,
        kind: ArtifactKind::View,
    }
}

const fn table(stage: StageName, path: &'static str, artifact: &'static str) -> ManifestEntry {
    ManifestEntry {
        stage,
        path,
        artifact,
        kind: ArtifactKind::Table,
    }
}

/// The claims warehouse build plan.
pub const MANIFEST: [ManifestEntry; 13] = [
    view("01-views/v_providers_etl.sql", "v_providers_etl"),
    view("01-views/v_patients_etl.sql", "v_patients_etl"),
    view("01-views/v_inpatient_claims_etl.sql", "v_inpatient_claims_etl"),
    view("01-views/v_outpatient_claims_etl.sql", "v_outpatient_claims_etl"),
    view("01-views/v_all_claims_etl.sql", "v_all_claims_etl"),
    table(StageName::Dims, "02-dims/dim_date_etl.sql", "dim_date_etl"),
    table(StageName::Dims, "02-dims/dim_provider_etl.sql", "dim_provider_etl"),
    table(StageName::Dims, "02-dims/dim_patient_etl.sql", "dim_patient_etl"),
    table(StageName::Dims, "02-dims/dim_diagnosis_etl.sql", "dim_diagnosis_etl"),
    table(StageName::Dims, "02-dims/dim_procedure_etl.sql", "dim_procedure_etl"),
    table(StageName::Facts, "03-facts/fact_claims_etl.sql", "fact_claims_etl"),
    table(
        StageName::Facts,
        "03-facts/fact_provider_summary_etl.sql",
        "fact_provider_summary_etl",
    ),
    table(
        StageName::Facts,
        "03-facts/fact_patient_claims_summary_etl.sql",
        "fact_patient_claims_summary_etl",
    ),
];

/// Returns the manifest entries of `stage` in order.
pub fn entries(stage: StageName) -> impl Iterator<Item = &'static ManifestEntry> {
    MANIFEST.iter().filter(move |entry| entry.stage == stage)
}
