pub mod config;
pub mod errors;
pub mod hooks;
pub mod infrastructure;
pub mod logging;

// Re-export commonly used items for convenience
pub use config::HooksConfig;
pub use errors::{AppError, ContainerError};
pub use hooks::{
    use_container, use_many_services, use_many_services_or_none, use_service, use_service_or_none, use_tree_visitor,
};
pub use infrastructure::container::{default_container, ContainerInstance, ContainerRef, Token};
