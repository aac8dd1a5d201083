//! Classifier Module
//!
//! Turns the model's probability into a diagnosis under an injected policy.
//!
//! ## Structure
//! - `types`: Probability, Diagnosis, Classification, RiskLevel, errors
//! - `policy`: Declarative zone table and its presets
//! - `classifier`: Classification logic
//!
//! ## Usage
//! ```ignore
//! use crate::logic::classifier::{Classifier, Policy, Probability};
//!
//! let classifier = Classifier::new(Policy::two_zone(0.5)?);
//! let diagnosis = classifier.classify(Probability::new(0.1)?)?;
//! assert_eq!(diagnosis.label(), "Cancer Detected");
//! ```

pub mod types;
pub mod policy;
pub mod classifier;


pub use types::{
    Classification,
    ClassifyError,
    Diagnosis,
    PolicyError,
    Probability,
    RiskLevel,
};

pub use policy::{Advisory, Bound, ConfidenceFormula, Policy, Zone, DEFAULT_BOUNDARY};

pub use classifier::{classify, Classifier};
