//! Registry of filter surfaces keyed by model name

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::core::config::FilterConfig;
use crate::error::FilterError;
use crate::rules::Conjunction;
use crate::scope::Scope;
use crate::surface::{FilterSurface, FilterSurfaceBuilder};

/// Holds every registered model's compiled surface
///
/// Related models must be registered before the models that reference them.
/// Re-registering a model replaces its surface; surfaces already compiled
/// against the old one keep their copy.
#[derive(Debug, Default)]
pub struct Catalog {
    surfaces: RwLock<FxHashMap<String, Arc<FilterSurface>>>,
    config: FilterConfig,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FilterConfig) -> Self {
        Self {
            surfaces: RwLock::new(FxHashMap::default()),
            config,
        }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Compile and register a surface
    pub fn register(&self, builder: FilterSurfaceBuilder) -> Result<Arc<FilterSurface>, FilterError> {
        let model = builder.model().to_string();
        let surface = Arc::new(builder.build_with(|related| self.get(related), &self.config)?);

        let replaced = self
            .surfaces
            .write()
            .insert(model.clone(), surface.clone())
            .is_some();
        tracing::debug!(model = %model, replaced, "Registered filter surface");

        Ok(surface)
    }

    pub fn get(&self, model: &str) -> Option<Arc<FilterSurface>> {
        self.surfaces.read().get(model).cloned()
    }

    pub fn contains(&self, model: &str) -> bool {
        self.surfaces.read().contains_key(model)
    }

    /// Registered model names, sorted
    pub fn models(&self) -> Vec<String> {
        let mut models: Vec<String> = self.surfaces.read().keys().cloned().collect();
        models.sort_unstable();
        models
    }

    /// Filter `base` with the surface registered for its model
    pub fn filter(
        &self,
        base: &Scope,
        rules: &Value,
        conjunction: Conjunction,
    ) -> Result<Scope, FilterError> {
        let surface = self
            .get(base.model())
            .ok_or_else(|| {
                FilterError::invalid_filter(format!(
                    "No filter surface registered for {}",
                    base.model()
                ))
            })?;
        surface.filter(base, rules, conjunction)
    }
}
