//! 进程级容器注册表
//!
//! Holds every container created through `ContainerInstance::of`, plus the
//! default container, which is created on first access and never reset.

use super::identifier::ContainerIdentifier;
use super::instance::{ContainerInstance, ContainerRef};
use super::options::{ConflictDefinition, CreateContainerOptions, OnConflict, OnFree};
use crate::errors::ContainerError;
use crate::logging::OperationTimer;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Parent requested for a container being provisioned.
#[derive(Debug, Clone, Default)]
pub enum ContainerParent {
    /// The process-wide default container.
    #[default]
    Default,
    Explicit(ContainerRef),
    /// No parent link at all.
    Orphaned,
}

impl ContainerParent {
    pub fn resolve(&self) -> Option<ContainerRef> {
        match self {
            ContainerParent::Default => Some(default_container()),
            ContainerParent::Explicit(parent) => Some(parent.clone()),
            ContainerParent::Orphaned => None,
        }
    }
}

impl PartialEq for ContainerParent {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ContainerParent::Default, ContainerParent::Default) => true,
            (ContainerParent::Orphaned, ContainerParent::Orphaned) => true,
            (ContainerParent::Explicit(a), ContainerParent::Explicit(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&ContainerRef> for ContainerParent {
    fn from(parent: &ContainerRef) -> Self {
        ContainerParent::Explicit(parent.clone())
    }
}

impl From<Option<&ContainerRef>> for ContainerParent {
    fn from(parent: Option<&ContainerRef>) -> Self {
        parent.map_or(ContainerParent::Orphaned, ContainerParent::from)
    }
}

pub struct ContainerRegistry {
    containers: DashMap<ContainerIdentifier, ContainerRef>,
    default: ContainerRef,
    default_options: RwLock<CreateContainerOptions>,
}

lazy_static::lazy_static! {
    static ref REGISTRY: ContainerRegistry = ContainerRegistry::new();
}

/// 获取全局容器注册表
pub fn registry() -> &'static ContainerRegistry {
    &REGISTRY
}

/// 获取默认容器
pub fn default_container() -> ContainerRef {
    REGISTRY.default.clone()
}

impl ContainerRegistry {
    fn new() -> Self {
        let default = ContainerInstance::create(ContainerIdentifier::Default, None);
        let containers = DashMap::new();
        containers.insert(ContainerIdentifier::Default, default.clone());
        Self {
            containers,
            default,
            default_options: RwLock::new(CreateContainerOptions::default()),
        }
    }

    pub fn default_container(&self) -> ContainerRef {
        self.default.clone()
    }

    /// Options used by `provision` calls that pass none of their own.
    pub fn default_options(&self) -> CreateContainerOptions {
        *self.default_options.read()
    }

    pub fn set_default_options(&self, options: CreateContainerOptions) {
        tracing::debug!(?options, "Default provisioning options updated");
        *self.default_options.write() = options;
    }

    pub fn get(&self, id: &ContainerIdentifier) -> Option<ContainerRef> {
        self.containers.get(id).map(|entry| entry.value().clone())
    }

    pub fn has(&self, id: &ContainerIdentifier) -> bool {
        self.containers.contains_key(id)
    }

    /// Forget the container registered under `id`. The default container
    /// cannot be removed.
    pub fn remove(&self, id: &ContainerIdentifier) -> Option<ContainerRef> {
        if *id == ContainerIdentifier::Default {
            tracing::warn!("Refusing to remove the default container");
            return None;
        }
        self.containers.remove(id).map(|(_, container)| container)
    }

    pub fn provision(
        &self,
        id: ContainerIdentifier,
        parent: &ContainerParent,
        options: Option<&CreateContainerOptions>,
    ) -> Result<Option<ContainerRef>, ContainerError> {
        if id == ContainerIdentifier::Default {
            return Ok(Some(self.default.clone()));
        }

        let _timer = OperationTimer::new("provision_container").with_metadata("id", &id.to_string());
        let options = options.copied().unwrap_or_else(|| self.default_options());
        let parent = parent.resolve();

        // Entry guards are dropped before visitors run so they may re-enter the registry.
        let created = match self.containers.entry(id.clone()) {
            Entry::Occupied(mut occupied) => {
                let existing = occupied.get().clone();
                if !conflicts(&existing, parent.as_ref(), options.conflict_definition) {
                    return Ok(Some(existing));
                }
                match options.on_conflict {
                    OnConflict::Throw => return Err(ContainerError::Conflict { id }),
                    OnConflict::Null => return Ok(None),
                    OnConflict::ReturnExisting => return Ok(Some(existing)),
                    OnConflict::Overwrite => {
                        let container = ContainerInstance::create(id.clone(), parent.clone());
                        occupied.insert(container.clone());
                        tracing::debug!(container = %id, "Existing container overwritten");
                        container
                    }
                }
            }
            Entry::Vacant(vacant) => match options.on_free {
                OnFree::Null => return Ok(None),
                OnFree::Throw => return Err(ContainerError::ContainerNotFound { id }),
                OnFree::ReturnNew => {
                    let container = ContainerInstance::create(id.clone(), parent.clone());
                    vacant.insert(container.clone());
                    tracing::debug!(container = %id, orphaned = parent.is_none(), "Container created");
                    container
                }
            },
        };

        match &parent {
            Some(parent) => {
                for visitor in parent.visitors_snapshot() {
                    visitor.visit_child_container(&created);
                }
            }
            None => {
                for visitor in self.default.visitors_snapshot() {
                    visitor.visit_orphaned_container(&created);
                }
            }
        }

        Ok(Some(created))
    }
}

fn conflicts(existing: &ContainerRef, parent: Option<&ContainerRef>, definition: ConflictDefinition) -> bool {
    match definition {
        ConflictDefinition::RejectAll => true,
        ConflictDefinition::AllowAll => false,
        ConflictDefinition::AllowSameParent => match (existing.parent(), parent) {
            (Some(a), Some(b)) => !Arc::ptr_eq(a, b),
            (None, None) => false,
            _ => true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provision_returns_same_instance() {
        let id = ContainerIdentifier::unique();
        let first = ContainerInstance::of(id.clone(), ContainerParent::Default, None).unwrap().unwrap();
        let second = ContainerInstance::of(id.clone(), ContainerParent::Default, None).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(first.parent().unwrap(), &default_container()));

        assert!(registry().remove(&id).is_some());
        let third = ContainerInstance::of(id, ContainerParent::Default, None).unwrap().unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn test_orphaned_container_has_no_parent() {
        let orphan = ContainerInstance::of(ContainerIdentifier::unique(), ContainerParent::Orphaned, None)
            .unwrap()
            .unwrap();
        assert!(orphan.parent().is_none());
    }

    #[test]
    fn test_different_parent_conflicts_by_default() {
        let id = ContainerIdentifier::unique();
        ContainerInstance::of(id.clone(), ContainerParent::Default, None).unwrap();

        let err = ContainerInstance::of(id.clone(), ContainerParent::Orphaned, None).unwrap_err();
        assert_eq!(err, ContainerError::Conflict { id: id.clone() });

        let options = CreateContainerOptions::default().on_conflict(OnConflict::Overwrite, ConflictDefinition::AllowSameParent);
        let replaced = ContainerInstance::of(id.clone(), ContainerParent::Orphaned, Some(&options))
            .unwrap()
            .unwrap();
        assert!(replaced.parent().is_none());
        assert!(Arc::ptr_eq(&registry().get(&id).unwrap(), &replaced));
    }

    #[test]
    fn test_on_free_policies() {
        let id = ContainerIdentifier::unique();
        let null = CreateContainerOptions::default().on_free(OnFree::Null);
        assert!(ContainerInstance::of(id.clone(), ContainerParent::Default, Some(&null)).unwrap().is_none());
        assert!(!registry().has(&id));

        let throw = CreateContainerOptions::default().on_free(OnFree::Throw);
        let err = ContainerInstance::of(id.clone(), ContainerParent::Default, Some(&throw)).unwrap_err();
        assert!(matches!(err, ContainerError::ContainerNotFound { .. }));
    }

    #[test]
    fn test_default_options_apply_when_none_given() {
        let local = ContainerRegistry::new();
        assert_eq!(local.default_options(), CreateContainerOptions::default());
        local.set_default_options(CreateContainerOptions::default().on_free(OnFree::Null));

        let id = ContainerIdentifier::unique();
        assert!(local.provision(id.clone(), &ContainerParent::Default, None).unwrap().is_none());
        assert!(!local.has(&id));

        // Explicit options still win.
        let explicit = CreateContainerOptions::default();
        assert!(local.provision(id.clone(), &ContainerParent::Default, Some(&explicit)).unwrap().is_some());
        assert!(local.has(&id));
    }

    #[test]
    fn test_default_container_cannot_be_removed() {
        assert!(registry().remove(&ContainerIdentifier::Default).is_none());
        let default = ContainerInstance::of(ContainerIdentifier::Default, ContainerParent::Orphaned, None)
            .unwrap()
            .unwrap();
        assert!(Arc::ptr_eq(&default, &default_container()));
    }
}
