//! Diagnosis Classifier
//!
//! Only the classify step - types live in `types`, thresholds in `policy`.
//! Input: Probability + Policy
//! Output: Diagnosis

use super::policy::{Policy, Zone};
use super::types::{ClassifyError, Diagnosis, Probability};

/// Classifier bound to one policy for the lifetime of the service
#[derive(Debug, Clone)]
pub struct Classifier {
    policy: Policy,
}

impl Classifier {
    pub fn new(policy: Policy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn classify(&self, probability: Probability) -> Result<Diagnosis, ClassifyError> {
        classify(probability, &self.policy)
    }

    /// Classify an unchecked model output
    pub fn classify_value(&self, value: f64) -> Result<Diagnosis, ClassifyError> {
        self.classify(Probability::new(value)?)
    }
}

/// Main classification function
///
/// Deterministic: the same probability and policy always give the same diagnosis.
pub fn classify(probability: Probability, policy: &Policy) -> Result<Diagnosis, ClassifyError> {
    let zone = policy
        .zone_for(probability)
        .ok_or(ClassifyError::Uncovered(probability.value()))?;

    Ok(diagnose(probability, zone))
}

fn diagnose(probability: Probability, zone: &Zone) -> Diagnosis {
    let confidence = zone.confidence.apply(probability);
    let advisory = zone
        .advisory
        .select(zone.confidence.percent(probability))
        .to_string();

    Diagnosis::new(
        probability,
        zone.classification,
        zone.label.clone(),
        confidence,
        zone.risk_level,
        advisory,
        zone.name.clone(),
    )
}
