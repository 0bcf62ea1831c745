//! 容器创建选项

use serde::{Deserialize, Serialize};

/// What `ContainerInstance::of` does when no container exists under the id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnFree {
    /// Create and register a new container.
    #[default]
    ReturnNew,
    /// Return `None` without creating anything.
    Null,
    /// Fail with `ContainerError::ContainerNotFound`.
    Throw,
}

/// What `ContainerInstance::of` does when the existing container conflicts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnConflict {
    /// Fail with `ContainerError::Conflict`.
    #[default]
    Throw,
    ReturnExisting,
    /// Replace the registered container with a freshly created one.
    Overwrite,
    Null,
}

/// Which existing registrations count as a conflict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictDefinition {
    RejectAll,
    /// Conflict only when the existing container has a different parent.
    #[default]
    AllowSameParent,
    AllowAll,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CreateContainerOptions {
    pub on_free: OnFree,
    pub on_conflict: OnConflict,
    pub conflict_definition: ConflictDefinition,
}

impl CreateContainerOptions {
    pub fn on_free(mut self, on_free: OnFree) -> Self {
        self.on_free = on_free;
        self
    }

    pub fn on_conflict(mut self, on_conflict: OnConflict, definition: ConflictDefinition) -> Self {
        self.on_conflict = on_conflict;
        self.conflict_definition = definition;
        self
    }
}
