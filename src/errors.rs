use crate::infrastructure::container::{ContainerIdentifier, ServiceIdentifier};
use thiserror::Error;

#[allow(unused)]
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),
    #[error("Logging initialization failed: {0}")]
    Logging(String),
}

/// Errors raised by the container and surfaced unmodified through the hooks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    /// No registration matches the identifier (in this container or any parent).
    #[error("Service {id} was not found in the container")]
    NotFound { id: ServiceIdentifier },
    /// Provisioning with `on_free: Throw` found no container under the id.
    #[error("Container {id} does not exist")]
    ContainerNotFound { id: ContainerIdentifier },
    /// Provisioning found an incompatible container under the same id.
    #[error("Container {id} is already registered with a conflicting definition")]
    Conflict { id: ContainerIdentifier },
    #[error("Service {id} could not be cast to {expected}")]
    TypeCastFailed {
        id: ServiceIdentifier,
        expected: &'static str,
    },
    #[error("Factory for service {id} failed: {message}")]
    CreationFailed {
        id: ServiceIdentifier,
        message: String,
    },
    #[error("Service {id} depends on itself")]
    CircularDependency { id: ServiceIdentifier },
}

impl ContainerError {
    /// True for the absence case that the `*_or_none` accessors swallow.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ContainerError::NotFound { .. })
    }
}

#[allow(unused)]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from file '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Invalid value '{value}' for {field}")]
    InvalidValue { field: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let err = ContainerError::NotFound {
            id: ServiceIdentifier::name("logger"),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Service \"logger\" was not found in the container");

        let conflict = ContainerError::Conflict {
            id: ContainerIdentifier::name("scope"),
        };
        assert!(!conflict.is_not_found());
    }

    #[test]
    fn test_app_error_from_container_error() {
        let err: AppError = ContainerError::CircularDependency {
            id: ServiceIdentifier::name("a"),
        }
        .into();
        assert!(matches!(err, AppError::Container(_)));
        assert!(err.to_string().starts_with("Container error:"));
    }
}
