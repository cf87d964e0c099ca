//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Directory receiving `att backup` snapshots.
    pub backup_dir: PathBuf,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("backup_dir", &self.backup_dir)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("att.db"),
            backup_dir: data_dir.join("backups"),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(config_path).extract()
    }

    fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (ATT_*)
        figment.merge(Env::prefixed("ATT_"))
    }
}

/// Returns the platform-specific config directory for att.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("att"))
}

/// Returns the platform-specific data directory for att.
///
/// On Linux: `~/.local/share/att`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("att"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use figment::Jail;

    #[test]
    fn test_dirs_data_path_ends_with_att() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "att");
    }

    #[test]
    fn test_default_config_uses_data_dir() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("att.db"));
        assert_eq!(config.backup_dir, data_dir.join("backups"));
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                "database_path = \"/tmp/att-test.db\"\nbackup_dir = \"/tmp/att-backups\"\n",
            )?;

            let config: Config = Config::figment(Some(Path::new("custom.toml"))).extract()?;
            assert_eq!(config.database_path, PathBuf::from("/tmp/att-test.db"));
            assert_eq!(config.backup_dir, PathBuf::from("/tmp/att-backups"));
            Ok(())
        });
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        Jail::expect_with(|jail| {
            let defaults: Config = Config::figment(None).extract()?;
            jail.create_file("custom.toml", "database_path = \"/tmp/only.db\"\n")?;

            let config: Config = Config::figment(Some(Path::new("custom.toml"))).extract()?;
            assert_eq!(config.database_path, PathBuf::from("/tmp/only.db"));
            assert_eq!(config.backup_dir, defaults.backup_dir);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_explicit_file() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "database_path = \"/tmp/file.db\"\n")?;
            jail.set_env("ATT_DATABASE_PATH", "/tmp/env.db");

            let config = Config::load_from(Some(Path::new("custom.toml")))?;
            assert_eq!(config.database_path, PathBuf::from("/tmp/env.db"));
            Ok(())
        });
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_explicit_file_wins_over_default_location() {
        Jail::expect_with(|jail| {
            let xdg = jail.directory().join("xdg");
            std::fs::create_dir_all(xdg.join("att")).unwrap();
            std::fs::write(
                xdg.join("att/config.toml"),
                "database_path = \"/tmp/user.db\"\nbackup_dir = \"/tmp/user-backups\"\n",
            )
            .unwrap();
            jail.set_env("XDG_CONFIG_HOME", xdg.display());
            jail.create_file("custom.toml", "database_path = \"/tmp/custom.db\"\n")?;

            let config: Config = Config::figment(Some(Path::new("custom.toml"))).extract()?;
            assert_eq!(config.database_path, PathBuf::from("/tmp/custom.db"));
            assert_eq!(config.backup_dir, PathBuf::from("/tmp/user-backups"));
            Ok(())
        });
    }
}
