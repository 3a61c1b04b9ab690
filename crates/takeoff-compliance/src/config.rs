//! Compliance configuration

use serde::{Deserialize, Serialize};

/// Thresholds and rule toggles for the compliance engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceConfig {
    /// Maximum points on a lighting circuit
    pub max_lighting_points: u32,

    /// Maximum points on a power circuit
    pub max_socket_points: u32,

    /// Minimum share of spare ways per board, in percent
    pub min_spare_ways_pct: f64,

    /// Site runs longer than this are checked for voltage drop (m)
    pub long_run_m: f64,

    /// Conductor size below which a long run is flagged (mm²)
    pub voltage_drop_min_mm2: f64,

    /// Underground runs longer than this get a burial-depth note (m)
    pub burial_note_min_m: f64,

    /// ELCB rating suggested when a board has none (A)
    pub elcb_rating_a: u32,

    /// ELCB sensitivity suggested when a board has none (mA)
    pub elcb_sensitivity_ma: u32,

    /// Enable the earth-leakage check
    pub check_earth_leakage: bool,

    /// Enable the surge-protection check
    pub check_surge_protection: bool,

    /// Enable the points-per-circuit check
    pub check_circuit_points: bool,

    /// Enable the spare-ways check
    pub check_spare_ways: bool,

    /// Enable the dedicated stove and geyser circuit checks
    pub check_dedicated_circuits: bool,

    /// Enable cable sizing against breaker ratings
    pub check_cable_sizing: bool,

    /// Enable wet-area socket checks
    pub check_wet_areas: bool,

    /// Enable air-conditioning circuit checks
    pub check_air_conditioning: bool,

    /// Enable site cable length checks
    pub check_site_cables: bool,

    /// Enable underground and external installation checks
    pub check_external: bool,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            max_lighting_points: 10,
            max_socket_points: 10,
            min_spare_ways_pct: 15.0,
            long_run_m: 100.0,
            voltage_drop_min_mm2: 16.0,
            burial_note_min_m: 5.0,
            elcb_rating_a: 63,
            elcb_sensitivity_ma: 30,
            check_earth_leakage: true,
            check_surge_protection: true,
            check_circuit_points: true,
            check_spare_ways: true,
            check_dedicated_circuits: true,
            check_cable_sizing: true,
            check_wet_areas: true,
            check_air_conditioning: true,
            check_site_cables: true,
            check_external: true,
        }
    }
}

impl ComplianceConfig {
    /// Create a strict configuration (tighter limits, every rule enabled)
    pub fn strict() -> Self {
        Self {
            max_lighting_points: 8,
            max_socket_points: 8,
            min_spare_ways_pct: 20.0,
            long_run_m: 60.0,
            voltage_drop_min_mm2: 25.0,
            burial_note_min_m: 0.0,
            ..Self::default()
        }
    }

    /// Create a permissive configuration (safety-critical rules only)
    pub fn permissive() -> Self {
        Self {
            min_spare_ways_pct: 10.0,
            check_surge_protection: false,
            check_spare_ways: false,
            check_wet_areas: false,
            check_site_cables: false,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_lighting_points == 0 || self.max_socket_points == 0 {
            return Err("points per circuit limits must be greater than 0".to_string());
        }
        if !(0.0..100.0).contains(&self.min_spare_ways_pct) {
            return Err(format!(
                "min_spare_ways_pct must be within [0, 100), got {}",
                self.min_spare_ways_pct
            ));
        }
        if self.long_run_m < 0.0 || self.burial_note_min_m < 0.0 {
            return Err("length thresholds must not be negative".to_string());
        }
        if self.voltage_drop_min_mm2 <= 0.0 {
            return Err("voltage_drop_min_mm2 must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
