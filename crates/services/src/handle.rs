//! Shared, swappable reference to the current registry.
//!
//! Readers take a snapshot and keep using it; a reload builds a whole new
//! registry and swaps the pointer, so no table is ever edited in place.

use arc_swap::ArcSwap;
use shared::settings::RegistryConfig;
use shared::LoadError;
use std::sync::Arc;
use tracing::info;

use crate::dataset_registry::{load_with, LoadReport, Registry};

pub struct RegistryHandle {
    current: ArcSwap<Registry>,
}

impl RegistryHandle {
    pub fn new(registry: Registry) -> Self {
        Self {
            current: ArcSwap::from_pointee(registry),
        }
    }

    /// Load `cfg.data_dir` and wrap the result.
    pub fn load(cfg: &RegistryConfig) -> Result<(Self, LoadReport), LoadError> {
        let (registry, report) = load_with(cfg)?;
        Ok((Self::new(registry), report))
    }

    pub fn snapshot(&self) -> Arc<Registry> {
        self.current.load_full()
    }

    /// Rebuild from disk and swap. On error the current registry stays in place.
    pub fn reload(&self, cfg: &RegistryConfig) -> Result<LoadReport, LoadError> {
        let (registry, report) = load_with(cfg)?;
        self.replace(registry);
        info!(datasets = report.loaded.len(), "registry reloaded");
        Ok(report)
    }

    pub fn replace(&self, registry: Registry) {
        self.current.store(Arc::new(registry));
    }
}
