use std::sync::Arc;

use crate::core::{Mediator, MediatorConfig};
use crate::topics::TypeHierarchy;

/// Builder for constructing a shared [`Mediator`].
#[derive(Default)]
pub struct MediatorBuilder {
    cfg: MediatorConfig,
    hierarchy: TypeHierarchy,
}

impl MediatorBuilder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the mediator configuration.
    pub fn with_config(mut self, cfg: MediatorConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the subtype relation used for assignability matching.
    ///
    /// More relations can be declared later with [`Mediator::declare_subtype`].
    pub fn with_hierarchy(mut self, hierarchy: TypeHierarchy) -> Self {
        self.hierarchy = hierarchy;
        self
    }

    /// Builds the mediator.
    ///
    /// Returned as `Arc` so handlers can hold a handle and re-enter it.
    pub fn build(self) -> Arc<Mediator> {
        Arc::new(Mediator::with_hierarchy(self.cfg, self.hierarchy))
    }
}
