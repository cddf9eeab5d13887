//! Locating, loading and saving `config.toml`

use crate::persistence::ConfigPersistence;
use crate::{CatalogProvider, Config, ConfigError, ConfigResult, LogLevel, ValidationError};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "PAGEMARK";
const CONFIG_FILE: &str = "config.toml";

/// Entry point for everything config related
///
/// Knows where `config.toml` lives and which directory a relative
/// `app.data_file` is resolved against.
pub struct ConfigManager {
    persistence: ConfigPersistence,
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl ConfigManager {
    /// Uses the per-user platform directories
    ///
    /// On Linux the config goes to `~/.config/pagemark/` and the book list
    /// to `~/.local/share/pagemark/`.
    pub fn new() -> ConfigResult<Self> {
        let dirs = ProjectDirs::from("", "", "pagemark").ok_or(ConfigError::NoProjectDirs)?;
        Ok(Self::rooted(dirs.config_dir(), dirs.data_dir()))
    }

    /// Keeps both the config and the data file in `dir`
    pub fn with_directory(dir: PathBuf) -> ConfigResult<Self> {
        Ok(Self::rooted(&dir, &dir))
    }

    fn rooted(config_dir: &Path, data_dir: &Path) -> Self {
        Self {
            persistence: ConfigPersistence::new(config_dir.join(CONFIG_FILE)),
            config_dir: config_dir.to_path_buf(),
            data_dir: data_dir.to_path_buf(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.persistence.path().to_path_buf()
    }

    /// Absolute location of the book list for `config`
    pub fn resolve_data_file(&self, config: &Config) -> PathBuf {
        let file = &config.app.data_file;
        match file.is_absolute() {
            true => file.clone(),
            false => self.data_dir.join(file),
        }
    }

    /// Defaults when the file is missing, an error when it is unreadable
    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Read-modify-write of the stored config
    pub fn update(&self, edit: impl FnOnce(&mut Config)) -> ConfigResult<()> {
        let mut config = self.load()?;
        edit(&mut config);
        self.save(&config)
    }

    /// Writes the defaults unless a file is already there
    ///
    /// `Ok(true)` means a file was created.
    pub fn initialize(&self) -> ConfigResult<bool> {
        let path = self.config_path();
        if path.exists() {
            log::debug!("Keeping existing config at {}", path.display());
            return Ok(false);
        }

        self.save(&Config::default())?;
        log::info!("Wrote default config to {}", path.display());
        Ok(true)
    }

    /// Overwrites the stored config with the defaults
    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Field problems in the stored config, empty when it is valid
    pub fn validate(&self) -> ConfigResult<Vec<ValidationError>> {
        Ok(self.load()?.validate().err().unwrap_or_default())
    }

    /// Loads the file, then applies `PAGEMARK_SECTION_FIELD` variables
    ///
    /// Out-of-range values are replaced by their defaults. The replaced
    /// fields are returned so the caller can report them once logging is up.
    pub fn load_with_env_overrides(&self) -> ConfigResult<(Config, Vec<ValidationError>)> {
        self.load_with_overrides(|key| std::env::var(key).ok())
    }

    /// [`load_with_env_overrides`](Self::load_with_env_overrides) with an
    /// injected variable lookup
    pub fn load_with_overrides<F>(&self, lookup: F) -> ConfigResult<(Config, Vec<ValidationError>)>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, lookup);
        let replaced = config.replace_invalid();
        Ok((config, replaced))
    }
}

/// Applies overrides looked up by variable name
///
/// Values that fail to parse are logged and ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(&format!("{}_{}", ENV_PREFIX, name));

    if let Some(level) = var("APP_LOG_LEVEL") {
        match level.parse::<LogLevel>() {
            Ok(l) => config.app.log_level = l,
            Err(e) => log::warn!("Ignoring {}_APP_LOG_LEVEL: {}", ENV_PREFIX, e),
        }
    }

    if let Some(path) = var("APP_DATA_FILE") {
        config.app.data_file = PathBuf::from(path);
    }

    if let Some(provider) = var("CATALOG_PROVIDER") {
        match provider.parse::<CatalogProvider>() {
            Ok(p) => config.catalog.provider = p,
            Err(e) => log::warn!("Ignoring {}_CATALOG_PROVIDER: {}", ENV_PREFIX, e),
        }
    }

    if let Some(url) = var("CATALOG_BASE_URL") {
        config.catalog.base_url = Some(url);
    }

    if let Some(timeout) = var("CATALOG_TIMEOUT_SECS") {
        match timeout.parse::<u64>() {
            Ok(t) => config.catalog.timeout_secs = t,
            Err(e) => log::warn!("Ignoring {}_CATALOG_TIMEOUT_SECS: {}", ENV_PREFIX, e),
        }
    }

    if let Some(interval) = var("TIMER_TICK_INTERVAL_MS") {
        match interval.parse::<u64>() {
            Ok(i) => config.timer.tick_interval_ms = i,
            Err(e) => log::warn!("Ignoring {}_TIMER_TICK_INTERVAL_MS: {}", ENV_PREFIX, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TimerConfig;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn setup_test_manager() -> (TempDir, ConfigManager) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf())
            .expect("Failed to create manager");
        (temp_dir, manager)
    }

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_with_missing_file_gives_defaults() {
        let (_temp_dir, manager) = setup_test_manager();
        assert_eq!(manager.load().expect("Should load"), Config::default());
    }

    #[test]
    fn test_load_with_corrupt_file_fails() {
        let (_temp_dir, manager) = setup_test_manager();
        std::fs::write(manager.config_path(), "[[[").expect("Should write");
        assert!(matches!(manager.load(), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_update() {
        let (_temp_dir, manager) = setup_test_manager();
        manager.save(&Config::default()).expect("Should save");

        manager
            .update(|config| {
                config.app.confirm_destructive = false;
            })
            .expect("Should update");

        let loaded = manager.load().expect("Should load");
        assert!(!loaded.app.confirm_destructive);
    }

    #[test]
    fn test_initialize_creates_file_once() {
        let (_temp_dir, manager) = setup_test_manager();

        assert!(manager.initialize().expect("Should initialize"));
        assert!(manager.config_path().exists());
        assert!(!manager.initialize().expect("Should initialize"));
    }

    #[test]
    fn test_reset() {
        let (_temp_dir, manager) = setup_test_manager();

        let mut config = Config::default();
        config.timer.tick_interval_ms = 2000;
        manager.save(&config).expect("Should save");

        manager.reset().expect("Should reset");

        let loaded = manager.load().expect("Should load");
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_validate_reports_file_errors() {
        let (_temp_dir, manager) = setup_test_manager();
        std::fs::write(manager.config_path(), "[catalog]\ntimeout_secs = 0\n")
            .expect("Should write");

        let errors = manager.validate().expect("Should validate");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "catalog.timeout_secs");
    }

    #[test]
    fn test_zero_tick_override_falls_back_to_default() {
        let (_temp_dir, manager) = setup_test_manager();
        std::fs::write(manager.config_path(), "[catalog]\ntimeout_secs = 0\n")
            .expect("Should write");

        let (config, replaced) = manager
            .load_with_overrides(lookup_from(&[("PAGEMARK_TIMER_TICK_INTERVAL_MS", "0")]))
            .expect("Should load");

        assert_eq!(config.timer, TimerConfig::default());
        assert_eq!(config.catalog.timeout_secs, 10);
        let fields: Vec<_> = replaced.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["catalog.timeout_secs", "timer.tick_interval_ms"]);
    }

    #[test]
    fn test_valid_overrides_are_kept() {
        let (_temp_dir, manager) = setup_test_manager();

        let (config, replaced) = manager
            .load_with_overrides(lookup_from(&[("PAGEMARK_TIMER_TICK_INTERVAL_MS", "250")]))
            .expect("Should load");

        assert!(replaced.is_empty());
        assert_eq!(config.timer.tick_interval_ms, 250);
    }

    #[test]
    fn test_resolve_data_file_relative() {
        let (temp_dir, manager) = setup_test_manager();
        let config = Config::default();
        assert_eq!(
            manager.resolve_data_file(&config),
            temp_dir.path().join("books.json")
        );
    }

    #[test]
    fn test_resolve_data_file_absolute() {
        let (temp_dir, manager) = setup_test_manager();
        let absolute = temp_dir.path().join("elsewhere").join("reading.json");

        let mut config = Config::default();
        config.app.data_file = absolute.clone();
        assert_eq!(manager.resolve_data_file(&config), absolute);
    }

    #[test]
    fn test_env_overrides_applied() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            lookup_from(&[
                ("PAGEMARK_APP_LOG_LEVEL", "debug"),
                ("PAGEMARK_CATALOG_PROVIDER", "openbd"),
                ("PAGEMARK_CATALOG_BASE_URL", "http://127.0.0.1:9000"),
                ("PAGEMARK_CATALOG_TIMEOUT_SECS", "30"),
                ("PAGEMARK_TIMER_TICK_INTERVAL_MS", "250"),
                ("PAGEMARK_APP_DATA_FILE", "shelf.json"),
            ]),
        );

        assert_eq!(config.app.log_level, LogLevel::Debug);
        assert_eq!(config.app.data_file, PathBuf::from("shelf.json"));
        assert_eq!(config.catalog.provider, CatalogProvider::OpenBd);
        assert_eq!(
            config.catalog.base_url.as_deref(),
            Some("http://127.0.0.1:9000")
        );
        assert_eq!(config.catalog.timeout_secs, 30);
        assert_eq!(config.timer.tick_interval_ms, 250);
    }

    #[test]
    fn test_env_overrides_ignore_unparseable_values() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            lookup_from(&[
                ("PAGEMARK_CATALOG_TIMEOUT_SECS", "soon"),
                ("PAGEMARK_CATALOG_PROVIDER", "library-of-babel"),
            ]),
        );

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_file_path() {
        let (_temp_dir, manager) = setup_test_manager();
        assert!(manager.config_path().ends_with("config.toml"));
        assert_eq!(manager.data_dir(), manager.config_dir());
    }
}
