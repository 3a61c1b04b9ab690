//! Takeoff Domain Layer
//!
//! This crate holds the entity graph that every other takeoff crate reads or
//! mutates, plus the pieces of logic that are pure functions of it.
//!
//! ## Key Concepts
//!
//! - **Project**: root of the graph; owns building blocks, site cable runs,
//!   supply points and system parameters
//! - **Tracked value**: a field value paired with its confidence tier; the
//!   field-merge policy is defined once on [`Tracked`]
//! - **Confidence tier**: Extracted, Inferred, Estimated or Manual provenance
//! - **Fixture counts**: per-room symbol tallies, each individually tagged
//! - **Confidence scoring**: completeness blended with mean item trust
//!
//! ## Architecture
//!
//! - No I/O and no network access
//! - Provider calls are described by the [`traits::VisionProvider`] capability
//!   and implemented in `takeoff-llm`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod board;
pub mod confidence;
pub mod fixtures;
pub mod page;
pub mod project;
pub mod room;
pub mod run;
pub mod scoring;
pub mod site;
pub mod tracked;
pub mod traits;

// Re-exports for convenience
pub use board::{Circuit, DistributionBoard};
pub use confidence::Confidence;
pub use fixtures::{FixtureCategory, FixtureCounts};
pub use page::{ImageRef, Page, PageType};
pub use project::{names_match, BuildingBlock, Project, DEFAULT_BLOCK_NAME};
pub use room::Room;
pub use run::RunId;
pub use scoring::{score_project, ConfidenceBreakdown, ScoringConfig, ESCALATION_THRESHOLD};
pub use site::{HeavyEquipment, SiteCableRun, SupplyPoint, SystemParameters};
pub use tracked::{union_into, Tracked, Truthy};
pub use traits::{VisionProvider, VisionResponse};
