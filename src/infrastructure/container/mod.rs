//! 依赖注入容器
//!
//! The hooks consume this through a narrow surface: lookups, provisioning
//! and tree visitor attachment.

pub mod identifier;
pub mod instance;
pub mod options;
pub mod registry;
pub mod visitor;

pub use identifier::{ContainerIdentifier, ServiceIdentifier, ServiceKey, Token, TypeKey};
pub use instance::{ContainerInstance, ContainerRef, ContainerStats, Registration, ServiceFactory, ServiceValue};
pub use options::{ConflictDefinition, CreateContainerOptions, OnConflict, OnFree};
pub use registry::{default_container, registry, ContainerParent, ContainerRegistry};
pub use visitor::{same_visitor, ContainerTreeVisitor, VisitorRef};
