//! Command implementations.

pub mod check;
pub mod config;
pub mod correct;
pub mod extract;
pub mod reconcile;

pub use self::check::execute_check;
pub use self::config::execute_config;
pub use self::correct::execute_correct;
pub use self::extract::execute_extract;
pub use self::reconcile::execute_reconcile;

use crate::error::Result;
use std::fs;
use std::path::Path;
use takeoff_domain::Project;

/// Read a project graph from a JSON file.
pub(crate) fn read_project(path: &Path) -> Result<Project> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Write a project graph as pretty JSON.
pub(crate) fn write_project(path: &Path, project: &Project) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(project)?)?;
    Ok(())
}
