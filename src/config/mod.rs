use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use time::Time;

use crate::model::{self, Quality, SleepType};
use crate::night;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "SleepLog";
const APP_NAME: &str = "sleeplog";

pub const CONFIG_ENV: &str = "SLEEPLOG_CONFIG";
pub const DATA_ENV: &str = "SLEEPLOG_DATA";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load(&self.paths)?;
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load(&self.paths)?;
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let override_data = env::var(DATA_ENV).ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let data_root = override_data.unwrap_or_else(|| project_dirs.data_dir().to_path_buf());
        let database_path = data_root.join("sleep.db");

        Ok(Self {
            config_dir,
            config_file,
            data_dir: data_root,
            database_path,
        })
    }

    /// Layout rooted at a single directory, for throwaway data sets.
    pub fn rooted_at(root: &Path) -> Self {
        let config_dir = root.join("config");
        let data_dir = root.join("data");
        Self {
            config_file: config_dir.join("config.toml"),
            config_dir,
            database_path: data_dir.join("sleep.db"),
            data_dir,
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.data_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub locale: Locale,
    /// Number of days shown by `stats` and `timeline`.
    pub window_days: u32,
    /// Span of the trailing moving average in `stats`.
    pub average_days: u32,
    pub entry: EntryDefaults,
    pub storage: StorageOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            locale: Locale::En,
            window_days: 30,
            average_days: 7,
            entry: EntryDefaults::default(),
            storage: StorageOptions::default(),
        }
    }
}

impl AppConfig {
    fn post_load(&mut self, paths: &ConfigPaths) -> Result<()> {
        self.storage
            .resolve(paths)
            .context("resolving storage paths")?;
        let max_days = night::MAX_WINDOW_DAYS as u32;
        if self.window_days == 0 {
            tracing::warn!("window_days must be positive, falling back to 30");
            self.window_days = 30;
        } else if self.window_days > max_days {
            tracing::warn!(window_days = self.window_days, "window_days capped at {max_days}");
            self.window_days = max_days;
        }
        if self.average_days == 0 {
            tracing::warn!("average_days must be positive, falling back to 7");
            self.average_days = 7;
        } else if self.average_days > max_days {
            tracing::warn!(average_days = self.average_days, "average_days capped at {max_days}");
            self.average_days = max_days;
        }
        self.entry.repair();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Fr,
}

impl Default for Locale {
    fn default() -> Self {
        Locale::En
    }
}

/// Values pre-filled when `add` is called without the matching flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryDefaults {
    pub sleep_type: SleepType,
    pub bed_time: String,
    pub wake_time: String,
    pub sleep_quality: u8,
    pub wake_quality: u8,
}

impl Default for EntryDefaults {
    fn default() -> Self {
        Self {
            sleep_type: SleepType::Nocturnal,
            bed_time: "22:00".into(),
            wake_time: "07:00".into(),
            sleep_quality: 3,
            wake_quality: 3,
        }
    }
}

impl EntryDefaults {
    pub fn bed_time(&self) -> Time {
        model::parse_clock(&self.bed_time).unwrap_or(Time::MIDNIGHT)
    }

    pub fn wake_time(&self) -> Time {
        model::parse_clock(&self.wake_time).unwrap_or(Time::MIDNIGHT)
    }

    pub fn sleep_quality(&self) -> Quality {
        Quality::new(self.sleep_quality).unwrap_or_default()
    }

    pub fn wake_quality(&self) -> Quality {
        Quality::new(self.wake_quality).unwrap_or_default()
    }

    fn repair(&mut self) {
        let fallback = EntryDefaults::default();
        if let Err(err) = model::parse_clock(&self.bed_time) {
            tracing::warn!(%err, "invalid default bed time, falling back to {}", fallback.bed_time);
            self.bed_time = fallback.bed_time;
        }
        if let Err(err) = model::parse_clock(&self.wake_time) {
            tracing::warn!(%err, "invalid default wake time, falling back to {}", fallback.wake_time);
            self.wake_time = fallback.wake_time;
        }
        if let Err(err) = Quality::new(self.sleep_quality) {
            tracing::warn!(%err, "invalid default sleep quality, falling back to 3");
            self.sleep_quality = fallback.sleep_quality;
        }
        if let Err(err) = Quality::new(self.wake_quality) {
            tracing::warn!(%err, "invalid default wake quality, falling back to 3");
            self.wake_quality = fallback.wake_quality;
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

impl Default for StorageBackend {
    fn default() -> Self {
        StorageBackend::Sqlite
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    pub backend: StorageBackend,
    #[serde(skip)]
    pub database_path: PathBuf,
    pub wal_autocheckpoint: u32,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            database_path: PathBuf::new(),
            wal_autocheckpoint: 1000,
        }
    }
}

impl StorageOptions {
    fn resolve(&mut self, paths: &ConfigPaths) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            self.database_path = paths.database_path.clone();
        }
        Ok(())
    }
}
