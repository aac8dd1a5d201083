//! Diagnosis Types
//!
//! Core types for diagnosis classification.
//! No decision logic here - only data structures and their errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// PROBABILITY (from the model)
// ============================================================================

/// Raw sigmoid output of the model, always within [0, 1].
///
/// Model convention: 0 = cancer, 1 = normal.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Probability(f64);

impl Probability {
    /// Fails on values outside [0, 1] (NaN included). Never clamps.
    pub fn new(value: f64) -> Result<Self, ClassifyError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ClassifyError::OutOfRange(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Likelihood of the positive (cancer) class
    pub fn complement(self) -> f64 {
        1.0 - self.0
    }
}

impl TryFrom<f64> for Probability {
    type Error = ClassifyError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Diagnosis classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Lesion consistent with oral cancer
    Cancer,
    /// No sign of malignancy
    Normal,
    /// Inconclusive; reported as normal but flagged for clinical evaluation
    Borderline,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Cancer => "cancer",
            Classification::Normal => "normal",
            Classification::Borderline => "borderline",
        }
    }

    pub fn is_cancer(&self) -> bool {
        matches!(self, Classification::Cancer)
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordinal risk attached to a diagnosis
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// DIAGNOSIS (classifier output)
// ============================================================================

/// Result of classifying one probability under a policy.
///
/// Only the classifier builds these; fields are read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    probability: Probability,
    classification: Classification,
    label: String,
    confidence: f64,
    risk_level: RiskLevel,
    advisory: String,
    zone: String,
}

impl Diagnosis {
    pub(super) fn new(
        probability: Probability,
        classification: Classification,
        label: String,
        confidence: f64,
        risk_level: RiskLevel,
        advisory: String,
        zone: String,
    ) -> Self {
        Self {
            probability,
            classification,
            label,
            confidence,
            risk_level,
            advisory,
            zone,
        }
    }

    pub fn probability(&self) -> Probability {
        self.probability
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    /// Human readable diagnosis, e.g. "Cancer Detected"
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Percentage in [0, 100]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    pub fn advisory(&self) -> &str {
        &self.advisory
    }

    /// Name of the policy zone that produced this diagnosis
    pub fn zone(&self) -> &str {
        &self.zone
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifyError {
    #[error("probability {0} is outside [0, 1]")]
    OutOfRange(f64),

    #[error("no policy zone covers probability {0}")]
    Uncovered(f64),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    #[error("policy has no zones")]
    Empty,

    #[error("zone '{0}' has a bound outside [0, 1]")]
    OutOfBounds(String),

    #[error("zone '{0}' is empty")]
    EmptyZone(String),

    #[error("first zone must start at 0 (inclusive)")]
    MissingLowerEdge,

    #[error("last zone must end at 1 (inclusive)")]
    MissingUpperEdge,

    #[error("gap between zones at probability {0}")]
    Gap(f64),

    #[error("zones overlap at probability {0}")]
    Overlap(f64),

    #[error("decision boundary {0} must lie strictly between 0 and 1")]
    InvalidBoundary(f64),

    #[error("unknown policy preset '{0}'")]
    UnknownPreset(String),

    #[error("failed to load policy table: {0}")]
    Load(String),
}
