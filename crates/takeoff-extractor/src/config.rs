//! Configuration for the extraction pipeline

use crate::payload::PayloadKind;
use serde::{Deserialize, Serialize};
use takeoff_domain::ESCALATION_THRESHOLD;

/// Configuration for the Pipeline and its Escalation Controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Page images sent per drawing kind (SLD and layouts)
    pub max_pages_per_kind: usize,

    /// Page images sent for outside-lights / site drawings
    pub max_site_pages: usize,

    /// Output budget per extraction call
    pub max_output_tokens: u32,

    /// Output budget for site drawings
    pub site_max_output_tokens: u32,

    /// Overall confidence below which a verification pass runs
    pub escalation_threshold: f64,

    /// Whether low-confidence runs escalate at all
    pub escalation_enabled: bool,

    /// Page images sent with the verification request
    pub max_verification_pages: usize,

    /// Output budget for the verification call
    pub verification_max_output_tokens: u32,
}

impl PipelineConfig {
    /// Image limit for a payload kind
    pub fn page_limit(&self, kind: PayloadKind) -> usize {
        match kind {
            PayloadKind::SiteInfra => self.max_site_pages,
            _ => self.max_pages_per_kind,
        }
    }

    /// Output budget for a payload kind
    pub fn output_tokens(&self, kind: PayloadKind) -> u32 {
        match kind {
            PayloadKind::SiteInfra => self.site_max_output_tokens,
            _ => self.max_output_tokens,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_pages_per_kind == 0 {
            return Err("max_pages_per_kind must be greater than 0".to_string());
        }
        if self.max_site_pages == 0 {
            return Err("max_site_pages must be greater than 0".to_string());
        }
        if self.max_output_tokens == 0 || self.site_max_output_tokens == 0 {
            return Err("output token budgets must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.escalation_threshold) {
            return Err(format!(
                "escalation_threshold must be within [0, 1], got {}",
                self.escalation_threshold
            ));
        }
        if self.escalation_enabled && self.verification_max_output_tokens == 0 {
            return Err("verification_max_output_tokens must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_pages_per_kind: 5,
            max_site_pages: 3,
            max_output_tokens: 8192,
            site_max_output_tokens: 4096,
            escalation_threshold: ESCALATION_THRESHOLD,
            escalation_enabled: true,
            max_verification_pages: 10,
            verification_max_output_tokens: 16384,
        }
    }
}

impl PipelineConfig {
    /// Thorough preset: more pages per call, escalate more readily
    pub fn thorough() -> Self {
        Self {
            max_pages_per_kind: 10,
            max_site_pages: 5,
            max_output_tokens: 16384,
            site_max_output_tokens: 8192,
            escalation_threshold: 0.90,
            escalation_enabled: true,
            max_verification_pages: 20,
            verification_max_output_tokens: 32768,
        }
    }

    /// Economy preset: fewer pages, no verification pass
    pub fn economy() -> Self {
        Self {
            max_pages_per_kind: 3,
            max_site_pages: 2,
            max_output_tokens: 4096,
            site_max_output_tokens: 2048,
            escalation_threshold: ESCALATION_THRESHOLD,
            escalation_enabled: false,
            max_verification_pages: 0,
            verification_max_output_tokens: 0,
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
        assert!(PipelineConfig::thorough().validate().is_ok());
        assert!(PipelineConfig::economy().validate().is_ok());
    }

    #[test]
    fn test_site_limits() {
        let config = PipelineConfig::default();
        assert_eq!(config.page_limit(PayloadKind::Sld), 5);
        assert_eq!(config.page_limit(PayloadKind::SiteInfra), 3);
        assert_eq!(config.output_tokens(PayloadKind::Lighting), 8192);
        assert_eq!(config.output_tokens(PayloadKind::SiteInfra), 4096);
    }

    #[test]
    fn test_invalid_threshold() {
        let config = PipelineConfig {
            escalation_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_page_limit() {
        let config = PipelineConfig {
            max_pages_per_kind: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = PipelineConfig::from_toml("escalation_enabled = false\n").unwrap();
        assert!(!config.escalation_enabled);
        assert_eq!(config.max_pages_per_kind, 5);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PipelineConfig::thorough();
        let toml_str = config.to_toml().unwrap();
        let parsed = PipelineConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }
}
