//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::{Formatter, RunSummary};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use takeoff_domain::{ImageRef, Page, PageType, Project};
use takeoff_extractor::{ExtractionRun, Pipeline};
use takeoff_llm::AnyProvider;
use tracing::{debug, warn};

/// Pages to extract, as listed in a TOML manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// Project name
    #[serde(default)]
    pub name: Option<String>,

    /// Building block names known up front
    #[serde(default)]
    pub blocks: Vec<String>,

    /// Pages in drawing order
    #[serde(default)]
    pub pages: Vec<ManifestPage>,
}

/// One page entry in a manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestPage {
    /// Image file, relative to the manifest
    #[serde(default)]
    pub path: Option<String>,

    /// Page classification (`SLD`, `LIGHTING`, `PLUGS`, `COMBINED`, `SITE`, ...)
    #[serde(rename = "type")]
    pub page_type: String,

    /// Page number; defaults to the position in the list
    #[serde(default)]
    pub number: Option<u32>,

    /// Text layer, used when no image is given
    #[serde(default)]
    pub text: Option<String>,
}

impl Manifest {
    /// Parse a manifest from TOML.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(contents)?;
        if manifest.pages.is_empty() {
            return Err(CliError::InvalidInput("Manifest lists no pages".to_string()));
        }
        Ok(manifest)
    }

    /// Load pages, reading and encoding images relative to `base`.
    pub fn load_pages(&self, base: &Path) -> Result<Vec<Page>> {
        let mut pages = Vec::with_capacity(self.pages.len());
        for (idx, entry) in self.pages.iter().enumerate() {
            let number = entry
                .number
                .unwrap_or_else(|| u32::try_from(idx + 1).unwrap_or(u32::MAX));
            let page_type = PageType::parse(&entry.page_type);
            if page_type == PageType::Unknown {
                warn!(page = number, tag = %entry.page_type, "Unrecognised page type");
            }

            let image = match &entry.path {
                Some(path) => Some(read_image(&base.join(path))?),
                None => None,
            };
            let mut page = Page::new(number, page_type, image);
            page.text = entry.text.clone();
            debug!(page = number, page_type = page_type.as_str(), "Loaded page");
            pages.push(page);
        }
        Ok(pages)
    }
}

/// MIME type for an image file extension.
pub fn media_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn read_image(path: &Path) -> Result<ImageRef> {
    let media_type = media_type(path).ok_or_else(|| {
        CliError::InvalidInput(format!("{}: unsupported image type", path.display()))
    })?;
    let bytes = fs::read(path)?;
    Ok(ImageRef::new(media_type, STANDARD.encode(bytes)))
}

/// Run the pipeline with the configured providers.
pub fn run_extraction(config: &Config, project: Project, pages: &[Page]) -> Result<ExtractionRun> {
    let primary = AnyProvider::from_config(&config.primary)?;
    let pipeline = Pipeline::try_new(primary, config.pipeline.clone())?;

    let verifier = AnyProvider::from_config(config.verifier.as_ref().unwrap_or(&config.primary))?;
    let run = pipeline.with_verifier(verifier).run(project, pages);
    Ok(run)
}

/// Execute the extract command.
pub fn execute_extract(args: ExtractArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let contents = fs::read_to_string(&args.manifest)?;
    let manifest = Manifest::from_toml(&contents)?;
    let base = args.manifest.parent().unwrap_or_else(|| Path::new("."));
    let pages = manifest.load_pages(base)?;

    let name = manifest.name.clone().unwrap_or_else(|| {
        args.manifest
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("project")
            .to_string()
    });
    let project = Project::with_blocks(name, manifest.blocks.iter().cloned());

    let run = run_extraction(config, project, &pages)?;
    let path: Vec<String> = run
        .escalation
        .path
        .iter()
        .map(|state| state.as_str().to_string())
        .collect();
    let summary = RunSummary::new(&run.project, run.final_confidence, run.warnings.clone())
        .with_usage(path.join(" -> "), run.tokens_used, run.cost);
    println!("{}", formatter.format_summary(&summary)?);

    if let Some(output) = &args.output {
        super::write_project(output, &run.project)?;
        eprintln!("{}", formatter.success(&format!("Project written to {}", output.display())));
    }
    Ok(())
}
