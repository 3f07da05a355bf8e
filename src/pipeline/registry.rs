//! Model Registry
//!
//! Resolves which model serves a stage and which substitutes stand in when
//! it fails. Assignments come from configuration and are validated once at
//! construction; resolution afterwards is infallible.

use std::collections::BTreeMap;

use crate::config::ModelsConfig;
use crate::types::{Error, Result, StageName};

/// Stage names that may carry a model assignment in configuration.
const ASSIGNABLE_STAGES: [&str; 7] = [
    "analysis",
    "generation",
    "vetting",
    "finalization",
    "enhancement",
    "comprehensive",
    "presenter",
];

/// Validated stage-to-model and model-to-fallback lookup tables
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    stages: BTreeMap<String, String>,
    fallbacks: BTreeMap<String, Vec<String>>,
}

impl ModelRegistry {
    /// Build a registry from configuration, rejecting unknown stage keys.
    pub fn from_config(models: &ModelsConfig) -> Result<Self> {
        for key in models.stages.keys() {
            if !ASSIGNABLE_STAGES.contains(&key.as_str()) {
                return Err(Error::Config(format!(
                    "unknown stage '{}' in model assignments (expected one of: {})",
                    key,
                    ASSIGNABLE_STAGES.join(", ")
                )));
            }
        }

        // The six pipeline stages must all have an assignment; presenter
        // alone may be omitted and falls back to the comprehensive model.
        for stage in ASSIGNABLE_STAGES.iter().filter(|s| **s != "presenter") {
            if !models.stages.contains_key(*stage) {
                return Err(Error::Config(format!(
                    "no model assigned for stage '{}'",
                    stage
                )));
            }
        }

        Ok(Self {
            stages: models.stages.clone(),
            fallbacks: models.fallbacks.clone(),
        })
    }

    /// The model assigned to `stage`.
    ///
    /// Solve runs on the comprehensive model; verify and presenter use the
    /// presenter assignment, falling back to comprehensive when absent.
    pub fn resolve(&self, stage: StageName) -> &str {
        match stage {
            StageName::Solve => &self.stages["comprehensive"],
            StageName::Verify | StageName::Presenter => self
                .stages
                .get("presenter")
                .unwrap_or(&self.stages["comprehensive"]),
            other => &self.stages[other.as_str()],
        }
    }

    /// Ordered substitute models for `model`; empty when none are configured.
    pub fn fallbacks_for(&self, model: &str) -> &[String] {
        self.fallbacks.get(model).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every distinct model the registry can hand out, assignments first.
    pub fn all_models(&self) -> Vec<String> {
        let mut models: Vec<String> = Vec::new();
        for model in self.stages.values() {
            if !models.contains(model) {
                models.push(model.clone());
            }
        }
        for chain in self.fallbacks.values() {
            for model in chain {
                if !models.contains(model) {
                    models.push(model.clone());
                }
            }
        }
        models
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_builds() {
        let registry = ModelRegistry::from_config(&ModelsConfig::default()).unwrap();
        assert_eq!(registry.resolve(StageName::Analysis), "llama3.2:latest");
        assert_eq!(registry.resolve(StageName::Comprehensive), "phi4:latest");
    }

    #[test]
    fn test_unknown_stage_key_rejected() {
        let mut models = ModelsConfig::default();
        models
            .stages
            .insert("polishing".to_string(), "phi4:latest".to_string());
        let err = ModelRegistry::from_config(&models).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("polishing"));
    }

    #[test]
    fn test_missing_required_stage_rejected() {
        let mut models = ModelsConfig::default();
        models.stages.remove("vetting");
        assert!(ModelRegistry::from_config(&models).is_err());
    }

    #[test]
    fn test_solve_and_verify_resolution() {
        let registry = ModelRegistry::from_config(&ModelsConfig::default()).unwrap();
        assert_eq!(
            registry.resolve(StageName::Solve),
            registry.resolve(StageName::Comprehensive)
        );
        assert_eq!(registry.resolve(StageName::Verify), "deepseek-r1:14b");
    }

    #[test]
    fn test_presenter_defaults_to_comprehensive() {
        let mut models = ModelsConfig::default();
        models.stages.remove("presenter");
        let registry = ModelRegistry::from_config(&models).unwrap();
        assert_eq!(registry.resolve(StageName::Presenter), "phi4:latest");
        assert_eq!(registry.resolve(StageName::Verify), "phi4:latest");
    }

    #[test]
    fn test_fallbacks_for_unknown_model_is_empty() {
        let registry = ModelRegistry::from_config(&ModelsConfig::default()).unwrap();
        assert!(registry.fallbacks_for("nonexistent:model").is_empty());
        assert_eq!(
            registry.fallbacks_for("llama3.2:latest"),
            ["deepseek-r1", "phi4:latest"]
        );
    }

    #[test]
    fn test_all_models_is_deduplicated() {
        let registry = ModelRegistry::from_config(&ModelsConfig::default()).unwrap();
        let models = registry.all_models();
        let mut sorted = models.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(models.len(), sorted.len());
        assert!(models.contains(&"phi4:latest".to_string()));
    }
}
