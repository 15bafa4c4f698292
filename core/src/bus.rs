//! Bus - The Shared Transition Payload
//!
//! The Bus is handed by reference to every hook and every continuation
//! check of a single `resolve` pass. Hooks may read and write it freely;
//! the strict ordering of the pass is the only thing keeping it consistent.
//!
//! Besides the router fields (`resolve_index`, `resolved_models`,
//! `query_params`) the Bus carries arbitrary typed resources.

use crate::params::Params;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};

/// Shared payload of one transition attempt (TypeMap pattern plus router fields).
#[derive(Default)]
pub struct Bus {
    resources: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    resolve_index: usize,
    resolved_models: BTreeMap<String, Value>,
    query_params: Option<Params>,
}

impl Bus {
    /// Create a new empty Bus
    pub fn new() -> Self {
        Bus::default()
    }

    /// Index of the segment the resolver is about to resolve.
    ///
    /// Reaches the segment count once the last segment has resolved.
    pub fn resolve_index(&self) -> usize {
        self.resolve_index
    }

    /// Mirrors the resolver cursor. Overwritten at every step.
    pub fn set_resolve_index(&mut self, index: usize) {
        self.resolve_index = index;
    }

    /// Contexts of every segment resolved (or re-visited) so far, by segment name.
    pub fn resolved_models(&self) -> &BTreeMap<String, Value> {
        &self.resolved_models
    }

    pub fn resolved_model(&self, name: &str) -> Option<&Value> {
        self.resolved_models.get(name)
    }

    pub fn record_model(&mut self, name: impl Into<String>, context: Value) {
        self.resolved_models.insert(name.into(), context);
    }

    pub fn query_params(&self) -> Option<&Params> {
        self.query_params.as_ref()
    }

    pub fn set_query_params(&mut self, query_params: Params) {
        self.query_params = Some(query_params);
    }

    /// Insert a resource into the Bus.
    ///
    /// If a resource of this type already exists, it is replaced.
    pub fn insert<T: Send + Sync + 'static>(&mut self, resource: T) {
        self.resources.insert(TypeId::of::<T>(), Box::new(resource));
    }

    /// Get a reference to a resource.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.resources
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref())
    }

    /// Get a mutable reference to a resource.
    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.resources
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut())
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.resources.contains_key(&TypeId::of::<T>())
    }

    /// Remove a resource from the Bus, returning it if present.
    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.resources
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast().ok())
            .map(|boxed| *boxed)
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("resolve_index", &self.resolve_index)
            .field("resolved_models", &self.resolved_models.keys())
            .field("resource_count", &self.resources.len())
            .finish()
    }
}
