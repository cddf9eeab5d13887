//! Integration tests for the configuration system

use pagemark_config::{
    AppConfig, CatalogConfig, CatalogProvider, Config, ConfigManager, ConfigSection, LogLevel,
    TimerConfig, CONFIG_VERSION,
};
use std::path::PathBuf;
use tempfile::TempDir;

fn setup_test_manager() -> Result<(TempDir, ConfigManager), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf())?;
    Ok((temp_dir, manager))
}

#[test]
fn test_full_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    let created = manager.initialize()?;
    assert!(created);

    let config = manager.load()?;
    assert_eq!(config.version, CONFIG_VERSION);

    let mut modified = config.clone();
    modified.catalog.provider = CatalogProvider::OpenBd;
    modified.app.log_level = LogLevel::Info;
    manager.save(&modified)?;

    let reloaded = manager.load()?;
    assert_eq!(reloaded.catalog.provider, CatalogProvider::OpenBd);
    assert_eq!(reloaded.app.log_level, LogLevel::Info);

    manager.reset()?;
    assert_eq!(manager.load()?, Config::default());

    Ok(())
}

#[test]
fn test_invalid_config_is_not_saved() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;
    manager.save(&Config::default())?;

    let mut invalid = Config::default();
    invalid.catalog.base_url = Some("ftp://books".to_string());
    assert!(manager.save(&invalid).is_err());

    assert!(manager.validate()?.is_empty());
    Ok(())
}

#[test]
fn test_atomic_save_keeps_backup() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    let config = Config::default();
    manager.save(&config)?;
    assert!(manager.config_path().exists());

    manager.save(&config)?;
    let backup_path = manager.config_path().with_extension("toml.backup");
    assert!(backup_path.exists());

    Ok(())
}

#[test]
fn test_all_sections_default_are_valid() {
    assert!(AppConfig::default().validate().is_ok());
    assert!(CatalogConfig::default().validate().is_ok());
    assert!(TimerConfig::default().validate().is_ok());
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_handwritten_file_is_read() -> Result<(), Box<dyn std::error::Error>> {
    let (temp_dir, manager) = setup_test_manager()?;

    std::fs::write(
        manager.config_path(),
        r#"
[app]
data_file = "reading/books.json"
confirm_destructive = false

[catalog]
provider = "openbd"
timeout_secs = 5

[timer]
tick_interval_ms = 500
"#,
    )?;

    let config = manager.load()?;
    assert!(!config.app.confirm_destructive);
    assert_eq!(config.catalog.provider, CatalogProvider::OpenBd);
    assert_eq!(config.catalog.effective_base_url(), "https://api.openbd.jp");
    assert_eq!(config.timer.tick_interval_ms, 500);
    assert_eq!(
        manager.resolve_data_file(&config),
        temp_dir.path().join(PathBuf::from("reading/books.json"))
    );

    Ok(())
}

#[test]
fn test_serialization_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let mut original = Config::default();
    original.catalog.base_url = Some("http://localhost:8080".to_string());
    let toml_string = toml::to_string(&original)?;
    let deserialized: Config = toml::from_str(&toml_string)?;
    assert_eq!(original, deserialized);
    Ok(())
}
