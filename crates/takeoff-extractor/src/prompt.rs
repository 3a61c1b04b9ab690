//! Prompt construction for drawing extraction

use crate::payload::PayloadKind;
use takeoff_domain::{FixtureCategory, Project};

/// Heading that opens the verification prompt
pub const VERIFICATION_HEADING: &str = "VERIFICATION PASS";

/// Heading that opens the extraction prompt for a drawing kind
pub fn heading(kind: PayloadKind) -> &'static str {
    match kind {
        PayloadKind::Sld => "SINGLE-LINE DIAGRAM",
        PayloadKind::Lighting => "LIGHTING LAYOUT",
        PayloadKind::Plugs => "PLUGS LAYOUT",
        PayloadKind::Combined => "COMBINED LAYOUT",
        PayloadKind::SiteInfra => "SITE DRAWING",
    }
}

/// Builds the extraction prompt for one drawing kind
pub struct PromptBuilder {
    kind: PayloadKind,
    block_names: Vec<String>,
    page_text: Vec<String>,
}

impl PromptBuilder {
    /// Create a new prompt builder
    pub fn new(kind: PayloadKind) -> Self {
        Self {
            kind,
            block_names: Vec::new(),
            page_text: Vec::new(),
        }
    }

    /// Known building block names, so the model reuses them verbatim
    pub fn with_block_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.block_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Text already extracted from the pages (title blocks, schedules)
    pub fn with_page_text<I, S>(mut self, text: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.page_text = text
            .into_iter()
            .map(Into::into)
            .filter(|t: &String| !t.trim().is_empty())
            .collect();
        self
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        // 1. Drawing type and task
        prompt.push_str(&format!("Drawing type: {}\n\n", heading(self.kind)));
        prompt.push_str(task(self.kind));
        prompt.push_str("\n\n");

        // 2. Block context
        if !self.block_names.is_empty() {
            prompt.push_str("Known building blocks (use these names exactly):\n");
            for name in &self.block_names {
                prompt.push_str(&format!("- {}\n", name));
            }
            prompt.push('\n');
        }

        // 3. Fixture vocabulary for layouts
        if self.kind.has_rooms() || self.kind == PayloadKind::SiteInfra {
            prompt.push_str(&fixture_vocabulary(self.kind));
            prompt.push('\n');
        }

        // 4. Text extracted upstream
        if !self.page_text.is_empty() {
            prompt.push_str("Text found on the pages:\n---\n");
            for text in &self.page_text {
                prompt.push_str(text.trim());
                prompt.push('\n');
            }
            prompt.push_str("---\n\n");
        }

        // 5. Schema and confidence rules
        prompt.push_str("Output schema:\n");
        prompt.push_str(schema(self.kind));
        prompt.push_str("\n\n");
        prompt.push_str(CONFIDENCE_RULES);
        prompt.push_str("\n\n");
        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }
}

/// Build the verification prompt around the serialized project
pub fn verification_prompt(project: &Project) -> Result<String, serde_json::Error> {
    let graph = serde_json::to_string_pretty(project)?;
    let mut prompt = String::new();
    prompt.push_str(&format!("{}\n\n", VERIFICATION_HEADING));
    prompt.push_str(VERIFICATION_INSTRUCTIONS);
    prompt.push_str("\n\nCurrent extraction:\n---\n");
    prompt.push_str(&graph);
    prompt.push_str("\n---\n\n");
    prompt.push_str(VERIFICATION_FORMAT);
    prompt.push_str("\n\n");
    prompt.push_str(CONFIDENCE_RULES);
    prompt.push_str("\n\n");
    prompt.push_str(OUTPUT_FORMAT_REMINDER);
    Ok(prompt)
}

fn task(kind: PayloadKind) -> &'static str {
    match kind {
        PayloadKind::Sld => {
            "Read every distribution board schedule on these pages. For each board list its \
             main breaker, earth leakage device, surge protection, spare ways and supply cable, \
             then every circuit row with its id, type, wattage, cable, breaker and number of \
             points. Also list heavy equipment, incoming supply points and system parameters."
        }
        PayloadKind::Lighting => {
            "Count the light fittings and switches in every room on these lighting layouts. \
             Record which circuits each room is wired to as they are labelled on the drawing."
        }
        PayloadKind::Plugs => {
            "Count the socket outlets, isolators and fixed appliances in every room on these \
             power layouts. Record which circuits each room is wired to as they are labelled."
        }
        PayloadKind::Combined => {
            "These layouts show lighting and power together. For every room count the light \
             fittings, switches, socket outlets and isolators, and record the circuit labels."
        }
        PayloadKind::SiteInfra => {
            "Read the site plan. List every cable run between supply points, kiosks and boards \
             with its cable specification and length, and count the external luminaires."
        }
    }
}

fn fixture_vocabulary(kind: PayloadKind) -> String {
    let categories: &[FixtureCategory] = match kind {
        PayloadKind::Lighting => &[FixtureCategory::Lighting, FixtureCategory::Switch],
        PayloadKind::Plugs => &[FixtureCategory::Power, FixtureCategory::Switch],
        PayloadKind::SiteInfra => &[FixtureCategory::Lighting],
        _ => &[
            FixtureCategory::Lighting,
            FixtureCategory::Power,
            FixtureCategory::Switch,
        ],
    };

    let mut out = String::from("Fixture keys (use these keys for counts):\n");
    for category in categories {
        out.push_str(&format!(
            "- {:?}: {}\n",
            category,
            category.catalogue().join(", ")
        ));
    }
    out
}

fn schema(kind: PayloadKind) -> &'static str {
    match kind {
        PayloadKind::Sld => SLD_SCHEMA,
        PayloadKind::Lighting | PayloadKind::Plugs | PayloadKind::Combined => ROOMS_SCHEMA,
        PayloadKind::SiteInfra => SITE_SCHEMA,
    }
}

const SLD_SCHEMA: &str = r#"{
  "building_block": "block name",
  "distribution_boards": [{
    "name": "DB-GF", "confidence": "extracted",
    "description": "", "location": "", "supply_from": "", "supply_cable": "",
    "supply_cable_size_mm2": 16, "supply_cable_length_m": 25,
    "main_breaker_a": 63, "main_breaker_type": "MCB",
    "earth_leakage": true, "earth_leakage_rating_a": 63, "surge_protection": false,
    "spare_ways": 4, "phase": "1PH", "voltage_v": 230, "fault_level_ka": 6,
    "circuits": [{
      "id": "L1", "type": "lighting", "description": "", "confidence": "extracted",
      "wattage_w": 396, "wattage_formula": "", "cable_size_mm2": 1.5, "cable_cores": 3,
      "cable_type": "GP", "breaker_a": 10, "breaker_poles": 1, "num_points": 8,
      "is_spare": false, "has_vsd": false, "has_isolator": false, "isolator_rating_a": 0,
      "has_overload_relay": false, "feeds_board": "", "controlled_circuits": []
    }]
  }],
  "heavy_equipment": [{"name": "", "type": "", "rating_kw": 0, "cable_size_mm2": 0,
    "cable_type": "", "breaker_a": 0, "has_vsd": false, "has_dol": false,
    "isolator_a": 0, "fed_from_db": "", "qty": 1, "confidence": "extracted"}],
  "supply_points": [{"name": "", "type": "", "voltage_v": 400, "capacity_kva": 0,
    "phase": "3PH", "location": "", "confidence": "extracted"}],
  "system_parameters": {"supply_voltage_v": 400, "phase": "3PH", "frequency_hz": 50,
    "earthing_system": "TN-C-S", "fault_level_ka": 15, "confidence": "extracted"}
}"#;

const ROOMS_SCHEMA: &str = r#"{
  "building_block": "block name",
  "rooms": [{
    "name": "Kitchen", "room_number": 3, "type": "kitchen", "confidence": "extracted",
    "area_m2": 14.5, "floor": "ground", "is_wet_area": true, "has_ac": false, "has_geyser": false,
    "fixtures": {"downlight_led_6w": 6, "downlight_led_6w_confidence": "extracted"},
    "circuit_refs": ["L1", "P2"],
    "notes": []
  }]
}"#;

const SITE_SCHEMA: &str = r#"{
  "site_cable_runs": [{
    "from_point": "Kiosk", "to_point": "DB-M", "confidence": "extracted",
    "cable_spec": "4C 16mm² SWA", "cable_size_mm2": 16, "cable_cores": 4, "cable_type": "SWA",
    "length_m": 45, "length_confidence": "estimated",
    "is_underground": true, "needs_trenching": true, "notes": ""
  }],
  "outside_lights": {"pole_light_60w": 4, "pole_light_60w_confidence": "extracted"}
}"#;

const CONFIDENCE_RULES: &str = r#"Confidence labels:
- "extracted": read directly off the drawing
- "inferred": calculated from other values on the drawing
- "estimated": guessed or scaled; use this whenever you are unsure
Omit fields you cannot read. Never invent circuits, rooms or boards."#;

const VERIFICATION_INSTRUCTIONS: &str = r#"Below is a structured extraction of these electrical drawings produced by an earlier pass.
Compare it against the attached pages. Confirm values that are right, correct values that
are wrong, and fill in values that are missing. Only include entities and fields you have
checked; anything you leave out stays as it is."#;

const VERIFICATION_FORMAT: &str = r#"Return one JSON object with any of these sections, each using the same
schema as the corresponding extraction:
{
  "sld": {"building_block": "", "distribution_boards": [], "heavy_equipment": [], "supply_points": [], "system_parameters": {}},
  "lighting": {"building_block": "", "rooms": []},
  "plugs": {"building_block": "", "rooms": []},
  "combined": {"building_block": "", "rooms": []},
  "site": {"site_cable_runs": [], "outside_lights": {}}
}"#;

const OUTPUT_FORMAT_REMINDER: &str =
    "Remember: Return ONLY valid JSON, no markdown code blocks, no explanations.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_drawing_type() {
        for kind in PayloadKind::ALL {
            let prompt = PromptBuilder::new(kind).build();
            assert!(prompt.contains(heading(kind)));
            for other in PayloadKind::ALL.iter().filter(|k| **k != kind) {
                assert!(!prompt.contains(heading(*other)), "{} mentions {}", kind, other);
            }
            assert!(!prompt.contains(VERIFICATION_HEADING));
        }
    }

    #[test]
    fn test_prompt_includes_blocks_and_text() {
        let prompt = PromptBuilder::new(PayloadKind::Sld)
            .with_block_names(["Main House", "Pool Block"])
            .with_page_text(["DB-GF SCHEDULE", "  "])
            .build();
        assert!(prompt.contains("- Pool Block"));
        assert!(prompt.contains("DB-GF SCHEDULE"));
        assert!(prompt.contains("distribution_boards"));
    }

    #[test]
    fn test_layout_prompt_lists_fixture_keys() {
        let prompt = PromptBuilder::new(PayloadKind::Plugs).build();
        assert!(prompt.contains("double_socket_300"));
        assert!(prompt.contains("circuit_refs"));
        assert!(!prompt.contains("recessed_led_600x1200"));
    }

    #[test]
    fn test_verification_prompt_embeds_project() {
        let project = Project::with_blocks("Clubhouse", ["Main House"]);
        let prompt = verification_prompt(&project).unwrap();
        assert!(prompt.starts_with(VERIFICATION_HEADING));
        assert!(prompt.contains("\"Main House\""));
        assert!(prompt.contains("\"site\""));
        for kind in PayloadKind::ALL {
            assert!(!prompt.contains(heading(kind)));
        }
    }
}
