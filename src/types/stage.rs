//! Pipeline Stage Identifiers
//!
//! Stage names are the stable vocabulary shared by the model registry, the
//! orchestrator, progress events, and the results map. Stages are fixed:
//! reordering or skipping one changes pipeline semantics.

use serde::{Deserialize, Serialize};

/// A named step of the enhancement pipeline.
///
/// `Presenter` is a registry key rather than a standalone state: it selects
/// the model used by the second half of the comprehensive review. `Solve`
/// and `Verify` belong to solve mode only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageName {
    Analysis,
    Generation,
    Vetting,
    Finalization,
    Enhancement,
    Comprehensive,
    Presenter,
    Solve,
    Verify,
}

/// The six standard pipeline stages, in execution order.
pub const STANDARD_STAGES: [StageName; 6] = [
    StageName::Analysis,
    StageName::Generation,
    StageName::Vetting,
    StageName::Finalization,
    StageName::Enhancement,
    StageName::Comprehensive,
];

impl StageName {
    /// Stable identifier used as the registry key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analysis => "analysis",
            Self::Generation => "generation",
            Self::Vetting => "vetting",
            Self::Finalization => "finalization",
            Self::Enhancement => "enhancement",
            Self::Comprehensive => "comprehensive",
            Self::Presenter => "presenter",
            Self::Solve => "solve",
            Self::Verify => "verify",
        }
    }

    /// Key under which this stage's output lands in the results map.
    pub fn result_key(&self) -> &'static str {
        match self {
            Self::Analysis => "analysis",
            Self::Generation => "generation",
            Self::Vetting => "vetting",
            Self::Finalization => "final",
            Self::Enhancement => "enhanced",
            Self::Comprehensive => "comprehensive",
            Self::Presenter => "comprehensive",
            Self::Solve => "solved",
            Self::Verify => "comprehensive",
        }
    }

    /// Position within the standard pipeline (1-based), if part of it.
    pub fn position(&self) -> Option<u8> {
        STANDARD_STAGES
            .iter()
            .position(|s| s == self)
            .map(|i| i as u8 + 1)
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StageName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "analysis" => Ok(Self::Analysis),
            "generation" => Ok(Self::Generation),
            "vetting" => Ok(Self::Vetting),
            "finalization" => Ok(Self::Finalization),
            "enhancement" => Ok(Self::Enhancement),
            "comprehensive" => Ok(Self::Comprehensive),
            "presenter" => Ok(Self::Presenter),
            "solve" => Ok(Self::Solve),
            "verify" => Ok(Self::Verify),
            _ => Err(format!(
                "Unknown stage: {}. Valid values: analysis, generation, vetting, \
                 finalization, enhancement, comprehensive, presenter, solve, verify",
                s
            )),
        }
    }
}

// =============================================================================
// Run Mode
// =============================================================================

/// Pipeline execution mode selecting which stage set runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Standard pipeline unless the prompt carries solve cues
    #[default]
    Auto,
    /// Full 6-stage enhancement pipeline
    Standard,
    /// Single solve call plus a verify/correct pass
    Solve,
    /// 6 stages, each wrapped in a self-critique round-trip
    Boost,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Auto => write!(f, "auto"),
            RunMode::Standard => write!(f, "standard"),
            RunMode::Solve => write!(f, "solve"),
            RunMode::Boost => write!(f, "boost"),
        }
    }
}

impl std::str::FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(RunMode::Auto),
            "standard" => Ok(RunMode::Standard),
            "solve" => Ok(RunMode::Solve),
            "boost" => Ok(RunMode::Boost),
            _ => Err(format!(
                "Unknown mode: {}. Valid values: auto, standard, solve, boost",
                s
            )),
        }
    }
}
