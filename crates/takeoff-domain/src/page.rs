//! Page model - externally classified drawing pages

use serde::{Deserialize, Serialize};

/// Classification tag assigned to a page upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageType {
    /// Drawing register / title sheet
    Register,
    /// Single-line diagram with board schedules
    Sld,
    /// Lighting layout
    LayoutLighting,
    /// Power (plugs) layout
    LayoutPlugs,
    /// Combined lighting and power layout
    LayoutCombined,
    /// External / site drawing
    OutsideLights,
    /// Unclassified
    Unknown,
}

impl PageType {
    /// Get the tag as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Register => "REGISTER",
            PageType::Sld => "SLD",
            PageType::LayoutLighting => "LAYOUT_LIGHTING",
            PageType::LayoutPlugs => "LAYOUT_PLUGS",
            PageType::LayoutCombined => "LAYOUT_COMBINED",
            PageType::OutsideLights => "OUTSIDE_LIGHTS",
            PageType::Unknown => "UNKNOWN",
        }
    }

    /// Parse a tag; unrecognised tags are Unknown
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().replace(['-', ' '], "_").as_str() {
            "REGISTER" => PageType::Register,
            "SLD" => PageType::Sld,
            "LAYOUT_LIGHTING" | "LIGHTING" => PageType::LayoutLighting,
            "LAYOUT_PLUGS" | "PLUGS" => PageType::LayoutPlugs,
            "LAYOUT_COMBINED" | "COMBINED" => PageType::LayoutCombined,
            "OUTSIDE_LIGHTS" | "SITE" => PageType::OutsideLights,
            _ => PageType::Unknown,
        }
    }
}

/// Reference to a page image, base64-encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// MIME type, e.g. "image/png"
    pub media_type: String,
    /// Base64 image bytes
    pub data: String,
}

impl ImageRef {
    /// Create an image reference
    pub fn new(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            data: data.into(),
        }
    }
}

/// One rasterized drawing page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number within the document set
    pub number: u32,
    /// Upstream classification
    pub page_type: PageType,
    /// Rendered image, if rasterization succeeded
    #[serde(default)]
    pub image: Option<ImageRef>,
    /// Text layer, if any
    #[serde(default)]
    pub text: Option<String>,
}

impl Page {
    /// Create a page with an image
    pub fn new(number: u32, page_type: PageType, image: Option<ImageRef>) -> Self {
        Self {
            number,
            page_type,
            image,
            text: None,
        }
    }
}
