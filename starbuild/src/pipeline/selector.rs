//! Stage selection for a run.

use crate::core::StageName;
use crate::errors::WarehouseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which stages a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageSelector {
    /// Every stage, in fixed order.
    #[default]
    All,
    /// Exactly one stage.
    Only(StageName),
}

impl StageSelector {
    /// Resolves the selector to the stages it runs, in execution order.
    #[must_use]
    pub fn stages(&self) -> Vec<StageName> {
        match self {
            Self::All => StageName::ORDERED.to_vec(),
            Self::Only(stage) => vec![*stage],
        }
    }

    /// Returns the selector as it is written on the command line.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(stage) => stage.as_str(),
        }
    }
}

impl From<StageName> for StageSelector {
    fn from(stage: StageName) -> Self {
        Self::Only(stage)
    }
}

impl fmt::Display for StageSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageSelector {
    type Err = WarehouseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<StageName>().map(Self::Only)
    }
}
