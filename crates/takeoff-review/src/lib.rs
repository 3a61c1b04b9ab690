//! Takeoff Review
//!
//! Reviewer corrections over a settled entity graph.
//!
//! # Overview
//!
//! A reviewer checks the extracted takeoff against the drawings and fixes
//! what the vision pass got wrong. Each correction names its field with a
//! dot path, is written into the graph, and pins that field as Manual so no
//! later merge or verification pass overwrites it. The session keeps a log
//! of every correction, which yields the extraction accuracy.
//!
//! # Usage
//!
//! ```no_run
//! use takeoff_domain::Project;
//! use takeoff_review::{CorrectionEntry, ReviewSession};
//!
//! # fn main() -> takeoff_review::Result<()> {
//! let mut session = ReviewSession::new(Project::with_blocks("Clubhouse", ["Pool"]));
//!
//! session.apply(CorrectionEntry::new(
//!     "system_parameters.earthing_system",
//!     "TN-C-S",
//!     "parameter",
//! ))?;
//! session.undo()?;
//!
//! let outcome = session.finish();
//! println!("{}", outcome.metrics.summary());
//! # Ok(())
//! # }
//! ```
//!
//! # Accuracy
//!
//! `accuracy = max(0, items − changed − removed) / items × 100`, where items
//! counts boards, circuits, rooms, non-zero fixture counts, equipment and
//! site cable runs at the start of the review. Additions do not count
//! against the extraction.

#![warn(missing_docs)]

mod error;
mod log;
mod metrics;
mod path;
mod session;

pub use error::{Result, ReviewError};
pub use log::{is_empty_value, CorrectionEntry, CorrectionLog};
pub use metrics::ReviewMetrics;
pub use path::FieldPath;
pub use session::{count_ai_items, ReviewOutcome, ReviewSession};
