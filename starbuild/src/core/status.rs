//! Stage names, stage status and engine execution state enums.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::WarehouseError;

/// One phase of the warehouse build.
///
/// The declaration order is the dependency order: views feed dimensions,
/// dimensions feed facts, and validation reads everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    /// Transformation views over the raw claims tables.
    Views,
    /// Dimension tables.
    Dims,
    /// Fact tables.
    Facts,
    /// Read-only row-count checks.
    Validate,
}

impl StageName {
    /// All stages in their fixed execution order.
    pub const ORDERED: [Self; 4] = [Self::Views, Self::Dims, Self::Facts, Self::Validate];

    /// Returns the canonical lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Views => "views",
            Self::Dims => "dims",
            Self::Facts => "facts",
            Self::Validate => "validate",
        }
    }

    /// Returns true if statements in this stage produce artifacts.
    #[must_use]
    pub fn produces_artifacts(&self) -> bool {
        !matches!(self, Self::Validate)
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageName {
    type Err = WarehouseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "views" => Ok(Self::Views),
            "dims" => Ok(Self::Dims),
            "facts" => Ok(Self::Facts),
            "validate" => Ok(Self::Validate),
            _ => Err(WarehouseError::UnknownStage(s.to_string())),
        }
    }
}

/// Lifecycle of a stage within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage has not started.
    #[default]
    Pending,
    /// Stage is executing statements.
    Running,
    /// Every required statement succeeded.
    Completed,
    /// A required statement failed; the run was aborted.
    Failed,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl StageStatus {
    /// Returns true if the status represents a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Execution state reported by the query engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionState {
    /// Accepted but not yet running.
    Queued,
    /// Running.
    Running,
    /// Finished successfully.
    Succeeded,
    /// Finished with an error.
    Failed,
    /// Cancelled before completion.
    Cancelled,
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "QUEUED"),
            Self::Running => write!(f, "RUNNING"),
            Self::Succeeded => write!(f, "SUCCEEDED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl ExecutionState {
    /// Returns true if the engine will not transition out of this state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }

    /// Parses the engine's wire representation.
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "QUEUED" => Some(Self::Queued),
            "RUNNING" => Some(Self::Running),
            "SUCCEEDED" => Some(Self::Succeeded),
            "FAILED" => Some(Self::Failed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }
}
