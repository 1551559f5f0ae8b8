//! Configuration file management for wedplan.
//!
//! Provides a TOML-based config file at `~/.config/wedplan/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use wedplan_core::recommend::CategoryWeights;
use wedplan_core::token::{TOKEN_SECRET_ENV, TokenConfig};
use wedplan_db::config::DbConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    pub auth: AuthSection,
    #[serde(default)]
    pub recommend: RecommendSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthSection {
    /// Hex-encoded token secret (64 hex chars = 32 bytes).
    pub token_secret: String,
}

/// Budget weights per category; missing keys keep their defaults.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RecommendSection {
    #[serde(default)]
    pub weights: CategoryWeights,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the wedplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/wedplan` or `~/.config/wedplan`,
/// never the macOS `~/Library/Application Support`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("wedplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("wedplan")
}

/// Return the path to the wedplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file at `path`.
pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents).context("failed to parse config file")
}

/// Load the config file from its default location.
pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&config_path())
}

/// Serialize and write the config file to `path`, creating parent dirs.
/// Sets file permissions to 0600 on Unix.
pub fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

/// Write the config file to its default location.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    save_config_to(config, &config_path())
}

// -----------------------------------------------------------------------
// Token secret generation
// -----------------------------------------------------------------------

/// Generate a random token secret: 32 random bytes, hex-encoded (64 chars).
pub fn generate_token_secret() -> String {
    use rand::Rng;
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct WedplanConfig {
    pub db_config: DbConfig,
    /// `None` when no secret is configured; only `serve` and `token issue`
    /// need one.
    pub token_config: Option<TokenConfig>,
    pub weights: CategoryWeights,
}

impl WedplanConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `WEDPLAN_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - Token secret: `WEDPLAN_TOKEN_SECRET` > `auth.token_secret` > unset
    /// - Weights: `[recommend.weights]` > defaults
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        Self::resolve_with(cli_db_url, load_config().ok())
    }

    fn resolve_with(cli_db_url: Option<&str>, file_config: Option<ConfigFile>) -> Result<Self> {
        let db_url = if let Some(url) = cli_db_url {
            url.to_owned()
        } else if let Ok(url) = std::env::var(DbConfig::URL_ENV) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_owned()
        };

        let token_config = if let Ok(secret_hex) = std::env::var(TOKEN_SECRET_ENV) {
            Some(
                TokenConfig::from_hex(&secret_hex)
                    .with_context(|| format!("{TOKEN_SECRET_ENV} env var is not a valid secret"))?,
            )
        } else if let Some(ref cfg) = file_config {
            Some(
                TokenConfig::from_hex(&cfg.auth.token_secret)
                    .context("invalid token_secret in config file")?,
            )
        } else {
            None
        };

        let weights = file_config
            .map(|cfg| cfg.recommend.weights)
            .unwrap_or_default();

        Ok(Self {
            db_config: DbConfig::new(db_url),
            token_config,
            weights,
        })
    }

    /// The token config, or an error telling the operator how to set one.
    pub fn require_token(&self) -> Result<&TokenConfig> {
        self.token_config.as_ref().ok_or_else(|| {
            anyhow!(
                "token secret not found; set {TOKEN_SECRET_ENV} or run `wedplan init` to create a config file"
            )
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55";

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    fn sample(url: &str) -> ConfigFile {
        ConfigFile {
            database: DatabaseSection { url: url.to_owned() },
            auth: AuthSection {
                token_secret: "aa".repeat(32),
            },
            recommend: RecommendSection::default(),
        }
    }

    #[test]
    fn generate_token_secret_is_64_hex_chars() {
        let secret = generate_token_secret();
        assert_eq!(secret.len(), 64);
        assert!(
            secret.chars().all(|c| c.is_ascii_hexdigit()),
            "expected all hex digits, got: {secret}"
        );
    }

    #[test]
    fn generate_token_secret_is_random() {
        assert_ne!(generate_token_secret(), generate_token_secret());
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("wedplan").join("config.toml");

        save_config_to(&sample("postgresql://testhost:5432/testdb"), &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        assert_eq!(loaded.database.url, "postgresql://testhost:5432/testdb");
        assert_eq!(loaded.auth.token_secret, "aa".repeat(32));
        assert_eq!(loaded.recommend.weights, CategoryWeights::default());
    }

    #[cfg(unix)]
    #[test]
    fn save_config_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        save_config_to(&sample("postgresql://localhost/wedplan"), &path).unwrap();

        let meta = std::fs::metadata(&path).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn partial_recommend_weights_keep_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "[database]\nurl = \"postgresql://localhost/wedplan\"\n\n\
             [auth]\ntoken_secret = \"abcd\"\n\n\
             [recommend.weights]\nvenue = 8\n",
        )
        .unwrap();

        let loaded = load_config_from(&path).unwrap();
        let weights = loaded.recommend.weights;
        assert_eq!(weights.venue, 8);
        assert_eq!(weights.studio, CategoryWeights::default().studio);
    }

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        let _lock = lock_env();
        unsafe { std::env::set_var(DbConfig::URL_ENV, "postgresql://env:5432/envdb") };

        let config = WedplanConfig::resolve_with(
            Some("postgresql://cli:5432/clidb"),
            Some(sample("postgresql://file:5432/filedb")),
        )
        .unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://cli:5432/clidb");

        unsafe { std::env::remove_var(DbConfig::URL_ENV) };
    }

    #[test]
    fn resolve_with_env_var_overrides_config_file() {
        let _lock = lock_env();
        unsafe { std::env::set_var(DbConfig::URL_ENV, "postgresql://env:5432/envdb") };
        unsafe { std::env::set_var(TOKEN_SECRET_ENV, SECRET) };

        let config =
            WedplanConfig::resolve_with(None, Some(sample("postgresql://file:5432/filedb"))).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://env:5432/envdb");
        assert_eq!(config.require_token().unwrap().secret, hex::decode(SECRET).unwrap());

        unsafe { std::env::remove_var(DbConfig::URL_ENV) };
        unsafe { std::env::remove_var(TOKEN_SECRET_ENV) };
    }

    #[test]
    fn resolve_falls_back_to_config_file_then_default() {
        let _lock = lock_env();
        unsafe { std::env::remove_var(DbConfig::URL_ENV) };
        unsafe { std::env::remove_var(TOKEN_SECRET_ENV) };

        let from_file =
            WedplanConfig::resolve_with(None, Some(sample("postgresql://file:5432/filedb"))).unwrap();
        assert_eq!(from_file.db_config.database_url, "postgresql://file:5432/filedb");
        assert!(from_file.token_config.is_some());

        let defaults = WedplanConfig::resolve_with(None, None).unwrap();
        assert_eq!(defaults.db_config.database_url, DbConfig::DEFAULT_URL);
        assert_eq!(defaults.weights, CategoryWeights::default());
    }

    #[test]
    fn require_token_errors_when_no_secret() {
        let _lock = lock_env();
        unsafe { std::env::remove_var(TOKEN_SECRET_ENV) };

        let config = WedplanConfig::resolve_with(Some("postgresql://localhost/wedplan"), None).unwrap();
        let msg = config.require_token().unwrap_err().to_string();
        assert!(msg.contains("token secret not found"), "unexpected error: {msg}");
    }

    #[test]
    fn invalid_secret_hex_is_rejected() {
        let _lock = lock_env();
        unsafe { std::env::set_var(TOKEN_SECRET_ENV, "not-hex") };

        let result = WedplanConfig::resolve_with(None, None);

        unsafe { std::env::remove_var(TOKEN_SECRET_ENV) };
        assert!(result.is_err());
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("wedplan/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
