//! Confidence heuristics and quality scoring.
//!
//! [`confidence`] holds every confidence constant used by the estimators;
//! [`QualityScorer`] turns an audit trail into statistics and the
//! completeness / reliability / consistency metrics.

pub mod confidence;
mod scorer;

pub use scorer::QualityScorer;
