pub mod hooks_config;
pub mod loader;

pub use hooks_config::{HooksConfig, LoggingSection, CONFIG_FILE_NAME, USER_CONFIG_PATH};
pub use loader::ConfigLoader;
