//! Diagnosis Policy
//!
//! Declarative zone table mapping a probability range to a label, risk,
//! confidence formula and advisory. No classify logic here - only the table,
//! its presets and its validation.

use serde::{Deserialize, Serialize};

use super::types::{Classification, PolicyError, Probability, RiskLevel};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default two-zone decision boundary
pub const DEFAULT_BOUNDARY: f64 = 0.5;

/// Confidence (percent) above which the confident advisory is used
pub const ADVISORY_CUTOFF: f64 = 80.0;

/// Three-zone: p at or below this is cancer, i.e. (1-p) >= 0.8
pub const THREE_ZONE_CANCER_MAX: f64 = 0.2;

/// Three-zone: p at or above this is normal, i.e. (1-p) <= 0.4
pub const THREE_ZONE_NORMAL_MIN: f64 = 0.6;

pub const LABEL_CANCER: &str = "Cancer Detected";
pub const LABEL_NORMAL: &str = "Normal (Non-Cancer)";
pub const LABEL_BORDERLINE: &str = "Normal (Borderline)";

const ADVICE_CANCER_CONFIDENT: &str =
    "⚠️ Strong indication of oral cancer. Consult a specialist IMMEDIATELY!";
const ADVICE_CANCER_TENTATIVE: &str =
    "⚠️ Possible oral cancer detected. Please see a doctor soon for a follow-up examination.";
const ADVICE_NORMAL_CONFIDENT: &str =
    "✅ The oral condition looks normal. Keep up your regular oral hygiene.";
const ADVICE_NORMAL_TENTATIVE: &str =
    "✅ The oral condition looks normal, but a routine dental check-up is still recommended.";
const ADVICE_BORDERLINE: &str =
    "ℹ️ Inconclusive result. Clinical evaluation by a dentist or specialist is recommended.";

// ============================================================================
// ZONE TABLE
// ============================================================================

/// One edge of a zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub value: f64,
    pub inclusive: bool,
}

impl Bound {
    pub const fn inclusive(value: f64) -> Self {
        Self { value, inclusive: true }
    }

    pub const fn exclusive(value: f64) -> Self {
        Self { value, inclusive: false }
    }
}

/// How a zone turns the probability into a confidence percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceFormula {
    /// round(p * 100)
    Probability,
    /// round((1 - p) * 100)
    Complement,
}

impl ConfidenceFormula {
    /// Reported confidence, rounded to a whole percent
    pub fn apply(self, p: Probability) -> f64 {
        self.percent(p).round()
    }

    /// Unrounded percentage; advisory selection compares against this
    pub fn percent(self, p: Probability) -> f64 {
        let raw = match self {
            ConfidenceFormula::Probability => p.value(),
            ConfidenceFormula::Complement => p.complement(),
        };
        raw * 100.0
    }
}

/// Advisory text picked by confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    /// Used when confidence > cutoff
    pub confident: String,
    /// Used otherwise
    pub tentative: String,
    #[serde(default = "default_cutoff")]
    pub cutoff: f64,
}

fn default_cutoff() -> f64 {
    ADVISORY_CUTOFF
}

impl Advisory {
    pub fn new(confident: &str, tentative: &str) -> Self {
        Self {
            confident: confident.to_string(),
            tentative: tentative.to_string(),
            cutoff: ADVISORY_CUTOFF,
        }
    }

    /// Same message regardless of confidence
    pub fn fixed(message: &str) -> Self {
        Self::new(message, message)
    }

    pub fn select(&self, confidence: f64) -> &str {
        if confidence > self.cutoff {
            &self.confident
        } else {
            &self.tentative
        }
    }
}

/// One row of the policy table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub lower: Bound,
    pub upper: Bound,
    pub classification: Classification,
    pub label: String,
    pub risk_level: RiskLevel,
    pub confidence: ConfidenceFormula,
    pub advisory: Advisory,
}

impl Zone {
    pub fn contains(&self, p: Probability) -> bool {
        let v = p.value();
        let above_lower = if self.lower.inclusive { v >= self.lower.value } else { v > self.lower.value };
        let below_upper = if self.upper.inclusive { v <= self.upper.value } else { v < self.upper.value };
        above_lower && below_upper
    }

    fn is_empty(&self) -> bool {
        match self.lower.value.partial_cmp(&self.upper.value) {
            Some(std::cmp::Ordering::Less) => false,
            Some(std::cmp::Ordering::Equal) => !(self.lower.inclusive && self.upper.inclusive),
            _ => true,
        }
    }
}

// ============================================================================
// POLICY
// ============================================================================

/// Validated zone table. Zones are kept in ascending order and partition
/// [0, 1] exactly: every probability falls into one and only one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PolicyTable", into = "PolicyTable")]
pub struct Policy {
    name: String,
    zones: Vec<Zone>,
}

/// Unvalidated wire form of a policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyTable {
    pub name: String,
    pub zones: Vec<Zone>,
}

impl TryFrom<PolicyTable> for Policy {
    type Error = PolicyError;

    fn try_from(table: PolicyTable) -> Result<Self, Self::Error> {
        Policy::new(table.name, table.zones)
    }
}

impl From<Policy> for PolicyTable {
    fn from(policy: Policy) -> Self {
        PolicyTable {
            name: policy.name,
            zones: policy.zones,
        }
    }
}

impl Policy {
    /// Build a policy, rejecting tables with gaps, overlaps or open edges.
    pub fn new(name: impl Into<String>, zones: Vec<Zone>) -> Result<Self, PolicyError> {
        validate_zones(&zones)?;
        Ok(Self {
            name: name.into(),
            zones,
        })
    }

    /// Cancer when p < boundary, normal otherwise.
    pub fn two_zone(boundary: f64) -> Result<Self, PolicyError> {
        if !(boundary > 0.0 && boundary < 1.0) {
            return Err(PolicyError::InvalidBoundary(boundary));
        }

        let zones = vec![
            Zone {
                name: "cancer".to_string(),
                lower: Bound::inclusive(0.0),
                upper: Bound::exclusive(boundary),
                classification: Classification::Cancer,
                label: LABEL_CANCER.to_string(),
                risk_level: RiskLevel::High,
                confidence: ConfidenceFormula::Complement,
                advisory: Advisory::new(ADVICE_CANCER_CONFIDENT, ADVICE_CANCER_TENTATIVE),
            },
            Zone {
                name: "normal".to_string(),
                lower: Bound::inclusive(boundary),
                upper: Bound::inclusive(1.0),
                classification: Classification::Normal,
                label: LABEL_NORMAL.to_string(),
                risk_level: RiskLevel::Low,
                confidence: ConfidenceFormula::Probability,
                advisory: Advisory::new(ADVICE_NORMAL_CONFIDENT, ADVICE_NORMAL_TENTATIVE),
            },
        ];

        Self::new(format!("two_zone({})", boundary), zones)
    }

    /// Cancer when (1-p) >= 0.8, normal when (1-p) <= 0.4, borderline between.
    pub fn three_zone() -> Self {
        let cancer_max = THREE_ZONE_CANCER_MAX;
        let normal_min = THREE_ZONE_NORMAL_MIN;

        // Fixed bounds, checked by `three_zone_is_valid` in tests
        Self {
            name: "three_zone".to_string(),
            zones: vec![
                Zone {
                    name: "cancer".to_string(),
                    lower: Bound::inclusive(0.0),
                    upper: Bound::inclusive(cancer_max),
                    classification: Classification::Cancer,
                    label: LABEL_CANCER.to_string(),
                    risk_level: RiskLevel::High,
                    confidence: ConfidenceFormula::Complement,
                    advisory: Advisory::fixed(ADVICE_CANCER_CONFIDENT),
                },
                Zone {
                    name: "borderline".to_string(),
                    lower: Bound::exclusive(cancer_max),
                    upper: Bound::exclusive(normal_min),
                    classification: Classification::Borderline,
                    label: LABEL_BORDERLINE.to_string(),
                    risk_level: RiskLevel::Moderate,
                    confidence: ConfidenceFormula::Probability,
                    advisory: Advisory::fixed(ADVICE_BORDERLINE),
                },
                Zone {
                    name: "normal".to_string(),
                    lower: Bound::inclusive(normal_min),
                    upper: Bound::inclusive(1.0),
                    classification: Classification::Normal,
                    label: LABEL_NORMAL.to_string(),
                    risk_level: RiskLevel::Low,
                    confidence: ConfidenceFormula::Probability,
                    advisory: Advisory::new(ADVICE_NORMAL_CONFIDENT, ADVICE_NORMAL_TENTATIVE),
                },
            ],
        }
    }

    /// Resolve a preset by name (`two_zone` or `three_zone`)
    pub fn preset(name: &str, boundary: f64) -> Result<Self, PolicyError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "two_zone" | "two-zone" | "binary" => Self::two_zone(boundary),
            "three_zone" | "three-zone" | "ternary" => Ok(Self::three_zone()),
            other => Err(PolicyError::UnknownPreset(other.to_string())),
        }
    }

    /// Parse and validate a JSON zone table
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        serde_json::from_str(json).map_err(|e| PolicyError::Load(e.to_string()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// The zone containing `p`, scanning in table order
    pub fn zone_for(&self, p: Probability) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.contains(p))
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::three_zone()
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

fn validate_zones(zones: &[Zone]) -> Result<(), PolicyError> {
    let (first, last) = match (zones.first(), zones.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(PolicyError::Empty),
    };

    for zone in zones {
        let in_unit = |b: &Bound| b.value.is_finite() && (0.0..=1.0).contains(&b.value);
        if !in_unit(&zone.lower) || !in_unit(&zone.upper) {
            return Err(PolicyError::OutOfBounds(zone.name.clone()));
        }
        if zone.is_empty() {
            return Err(PolicyError::EmptyZone(zone.name.clone()));
        }
    }

    if first.lower.value != 0.0 || !first.lower.inclusive {
        return Err(PolicyError::MissingLowerEdge);
    }
    if last.upper.value != 1.0 || !last.upper.inclusive {
        return Err(PolicyError::MissingUpperEdge);
    }

    for pair in zones.windows(2) {
        let (upper, lower) = (pair[0].upper, pair[1].lower);

        if upper.value < lower.value {
            return Err(PolicyError::Gap(upper.value));
        }
        if upper.value > lower.value {
            return Err(PolicyError::Overlap(lower.value));
        }
        // Shared edge: exactly one side may own it
        match (upper.inclusive, lower.inclusive) {
            (true, true) => return Err(PolicyError::Overlap(upper.value)),
            (false, false) => return Err(PolicyError::Gap(upper.value)),
            _ => {}
        }
    }

    Ok(())
}
