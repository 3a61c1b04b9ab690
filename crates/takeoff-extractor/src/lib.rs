//! Takeoff Extractor
//!
//! Turns classified drawing pages into a reconciled entity graph.
//!
//! # Overview
//!
//! Each drawing kind (single-line diagram, lighting layout, plugs layout,
//! combined layout, site drawing) is sent to a vision provider once. The
//! response is read leniently into a typed payload and folded into the
//! project by the Merge Engine, which never loses a known value to a blank
//! one and never touches a reviewer's correction. The graph is then scored,
//! and a graph below the escalation threshold gets exactly one verification
//! pass.
//!
//! # Architecture
//!
//! ```text
//! Pages → group by kind → Prompt → VisionProvider → Parser → Payload
//!                                                              │
//!                                              MergeEngine (accumulate)
//!                                                              │
//!                                                       Project graph
//!                                                              │
//!                               Scorer → EscalationController (≤ 1 pass)
//!                                                              │
//!                                                       ExtractionRun
//! ```
//!
//! # Key Features
//!
//! - **Kind isolation**: a failed call or unreadable reply for one kind is a
//!   warning, never an abort
//! - **Lenient payloads**: numbers as strings, flags as "yes", trailing commas
//!   and code fences are all tolerated
//! - **Idempotent merge**: merging the same payload twice changes nothing
//! - **Bounded escalation**: one verification attempt, rolled back on failure
//!
//! # Example Usage
//!
//! ```no_run
//! use takeoff_domain::{ImageRef, Page, PageType, Project};
//! use takeoff_extractor::{Pipeline, PipelineConfig};
//! use takeoff_llm::MockProvider;
//!
//! let provider = MockProvider::new(r#"{"distribution_boards": []}"#);
//! let pipeline = Pipeline::new(provider, PipelineConfig::default());
//!
//! let pages = vec![Page::new(
//!     1,
//!     PageType::Sld,
//!     Some(ImageRef::new("image/png", "aGVsbG8=")),
//! )];
//! let run = pipeline.run(Project::new("Clubhouse"), &pages);
//!
//! println!("Confidence: {:.2}", run.confidence());
//! println!("Warnings: {}", run.warnings.len());
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod escalation;
mod lenient;
mod merge;
mod parser;
mod payload;
mod pipeline;
mod prompt;

#[cfg(test)]
mod tests;

pub use config::PipelineConfig;
pub use error::ExtractorError;
pub use escalation::{decode_sections, EscalationController, EscalationOutcome, EscalationState};
pub use lenient::{bool_of, count_of, number_of, string_of};
pub use merge::{merge, MergeEngine, MergeMode, MergeReport};
pub use parser::{parse_response, parse_value};
pub use payload::{
    fixture_entries, BoardPayload, CableRunPayload, CircuitPayload, EquipmentPayload,
    FixtureEntry, Payload, PayloadKind, RoomPayload, RoomsPayload, SitePayload, SldPayload,
    SupplyPointPayload, SystemParametersPayload,
};
pub use pipeline::{ingest, ExtractionRun, Pipeline};
pub use prompt::{heading, verification_prompt, PromptBuilder, VERIFICATION_HEADING};
