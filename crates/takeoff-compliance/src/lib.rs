//! Takeoff Compliance
//!
//! Checks a settled project against the SANS 10142-1 wiring code and
//! cross-references schedule point counts against the layouts.
//!
//! The compliance engine provides:
//! - Earth-leakage and surge protection per board
//! - Points per circuit, spare ways and cable sizing
//! - Dedicated stove, geyser and AC circuits
//! - Wet-area, site cable and external installation notes
//! - A scored report: pass percentage less 10 per critical failure
//!
//! # Examples
//!
//! ```no_run
//! use takeoff_compliance::{cross_reference, ComplianceConfig, ComplianceEngine};
//! use takeoff_domain::Project;
//!
//! let engine = ComplianceEngine::new(ComplianceConfig::strict()).unwrap();
//! let project = Project::new("Clubhouse");
//!
//! let report = engine.evaluate(&project);
//! let links = cross_reference(&project);
//! println!("score {:.0}, {} conflicts", report.compliance_score, links.conflicts);
//! ```

#![warn(missing_docs)]

mod config;
mod crossref;
mod engine;
mod error;
mod report;
mod rules;

pub use config::ComplianceConfig;
pub use crossref::{
    cross_reference, CircuitLink, CrossReferenceReport, Discrepancy, DiscrepancySeverity,
    LinkStatus,
};
pub use engine::ComplianceEngine;
pub use error::ComplianceError;
pub use report::{compliance_score, ComplianceReport, Flag, Severity, CRITICAL_PENALTY, STANDARD};
pub use rules::{
    standard_rules, AirConditioningRule, CableSizingRule, CircuitPointsRule, DedicatedCircuitRule,
    EarthLeakageRule, ExternalInstallationRule, Rule, SiteCableRule, SpareWaysRule,
    SurgeProtectionRule, WetAreaRule, CABLE_CURRENT_CAPACITY, CABLE_MAX_BREAKER,
};
