//! 配置加载的集成测试
//!
//! Kept in its own test binary: installing the configuration changes the
//! process-wide provisioning defaults.

#![allow(clippy::uninlined_format_args)]

use inject_hooks::hooks::render_hook;
use inject_hooks::infrastructure::container::{registry, ContainerIdentifier, ContainerParent, CreateContainerOptions, OnFree};
use inject_hooks::{use_container, HooksConfig};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_configured_provisioning_defaults_reach_use_container() {
    let temp_dir = TempDir::new().unwrap();
    let config_dir = temp_dir.path().join(".config/inject-hooks");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        r#"
[logging]
level = "debug"
format = "compact"

[provisioning]
on-free = "null"
"#,
    )
    .unwrap();

    let config = HooksConfig::load_with_base_path(temp_dir.path().to_path_buf()).unwrap();
    assert_eq!(config.default_options().on_free, OnFree::Null);
    config.install().unwrap();
    assert_eq!(registry().default_options(), config.default_options());

    let free_id = ContainerIdentifier::unique();
    let hook = render_hook((), |cx, _| use_container(cx, free_id.clone(), ContainerParent::Default, None));
    assert!(hook.current().unwrap().is_none());
    assert!(!registry().has(&free_id));

    // Options passed by the caller still take precedence.
    let explicit = CreateContainerOptions::default();
    let hook = render_hook((), |cx, _| {
        use_container(cx, free_id.clone(), ContainerParent::Default, Some(&explicit))
    });
    assert!(hook.current().unwrap().is_some());

    HooksConfig::default().apply_provisioning();
    assert_eq!(registry().default_options(), CreateContainerOptions::default());
}
