use super::{InjectValue, Injector, InvokeFn, Resolver};
use crate::error::{EnsembleError, Result};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

type Instance = Arc<dyn Any + Send + Sync>;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ServiceKey {
    type_id: TypeId,
    name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct GroupKey {
    type_id: TypeId,
    group: String,
}

/// Thread-safe, type-directed dependency injection container.
///
/// Ungrouped values are keyed by type and optional name; providing the same
/// key twice is an error. Grouped values are collected per type and group in
/// the order they were provided.
pub struct Container {
    services: DashMap<ServiceKey, Instance>,
    groups: DashMap<GroupKey, Vec<Instance>>,
}

impl Clone for Container {
    fn clone(&self) -> Self {
        Self {
            services: self.services.clone(),
            groups: self.groups.clone(),
        }
    }
}

impl Container {
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
            groups: DashMap::new(),
        }
    }

    /// Register a single value.
    pub fn register(&self, value: &InjectValue) -> Result<()> {
        if let Some(group) = value.group() {
            self.groups
                .entry(GroupKey {
                    type_id: value.type_id(),
                    group: group.to_string(),
                })
                .or_default()
                .push(Arc::clone(value.instance()));
            return Ok(());
        }

        let key = ServiceKey {
            type_id: value.type_id(),
            name: value.name().map(str::to_string),
        };
        if self.services.contains_key(&key) {
            return Err(EnsembleError::DuplicateValue {
                type_name: value.type_name().to_string(),
                name: key.name,
            });
        }
        self.services.insert(key, Arc::clone(value.instance()));
        Ok(())
    }

    pub fn contains<T: 'static>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        self.services.iter().any(|entry| entry.key().type_id == type_id)
            || self.groups.iter().any(|entry| entry.key().type_id == type_id)
    }

    pub fn as_resolver(&self) -> &dyn Resolver {
        self
    }

    pub fn len(&self) -> usize {
        self.services.len() + self.groups.iter().map(|entry| entry.value().len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for Container {
    fn lookup(&self, type_id: TypeId, name: Option<&str>) -> Option<Instance> {
        let key = ServiceKey {
            type_id,
            name: name.map(str::to_string),
        };
        self.services.get(&key).map(|entry| Arc::clone(entry.value()))
    }

    fn lookup_group(&self, type_id: TypeId, group: &str) -> Vec<Instance> {
        let key = GroupKey {
            type_id,
            group: group.to_string(),
        };
        self.groups
            .get(&key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}

impl Injector for Container {
    fn provide(&self, values: &[InjectValue]) -> Result<()> {
        for value in values {
            self.register(value)?;
            tracing::debug!("Provided: {}", value.label());
        }
        Ok(())
    }

    fn invoke(&self, targets: Vec<InvokeFn>) -> Result<()> {
        for (index, target) in targets.into_iter().enumerate() {
            target(self.as_resolver()).map_err(|e| {
                tracing::error!("Invoke target #{} failed: {}", index, e);
                EnsembleError::Invoke {
                    index,
                    message: e.to_string(),
                }
            })?;
        }
        Ok(())
    }
}
