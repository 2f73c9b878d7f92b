use crate::errors::AppResult;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Environment variable holding a full database path.
pub const ENV_DB_PATH: &str = "TOTEMLOG_DB";
/// Environment variable holding the database name (file stem in the config dir).
pub const ENV_DB_NAME: &str = "DB_NAME";
const DEFAULT_DB_NAME: &str = "flexmedia_totem";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_totem_id")]
    pub totem_id: String,
    #[serde(default = "default_totem_location")]
    pub totem_location: String,
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    #[serde(default = "default_report_window_days")]
    pub report_window_days: i64,
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,
    #[serde(default = "default_model_path")]
    pub model_path: String,
}

fn default_database() -> String {
    Config::database_file().to_string_lossy().to_string()
}
fn default_totem_id() -> String {
    "TOTEM-001".to_string()
}
fn default_totem_location() -> String {
    "FIAP - Campus".to_string()
}
fn default_retention_days() -> i64 {
    90
}
fn default_report_window_days() -> i64 {
    30
}
fn default_test_size() -> f64 {
    0.2
}
fn default_random_seed() -> u64 {
    42
}
fn default_model_path() -> String {
    Config::config_dir()
        .join("models")
        .join("touch_classifier.json")
        .to_string_lossy()
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            totem_id: default_totem_id(),
            totem_location: default_totem_location(),
            retention_days: default_retention_days(),
            report_window_days: default_report_window_days(),
            test_size: default_test_size(),
            random_seed: default_random_seed(),
            model_path: default_model_path(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("totemlog")
        } else {
            let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".totemlog")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("totemlog.conf")
    }

    /// Database path chosen through the environment, if any.
    ///
    /// `TOTEMLOG_DB` (full path) wins over `DB_NAME` (file stem inside the
    /// config dir).
    fn env_database() -> Option<PathBuf> {
        if let Ok(path) = env::var(ENV_DB_PATH)
            && !path.trim().is_empty()
        {
            return Some(PathBuf::from(path));
        }

        match env::var(ENV_DB_NAME) {
            Ok(name) if !name.trim().is_empty() => {
                Some(Self::config_dir().join(format!("{}.sqlite", name.trim())))
            }
            _ => None,
        }
    }

    /// Return the full path of the SQLite database: the environment choice,
    /// or `<config_dir>/flexmedia_totem.sqlite`.
    pub fn database_file() -> PathBuf {
        Self::env_database()
            .unwrap_or_else(|| Self::config_dir().join(format!("{DEFAULT_DB_NAME}.sqlite")))
    }

    /// Load configuration from file, or return defaults if not found.
    /// A malformed file is reported and replaced by defaults.
    pub fn load() -> Self {
        let path = Self::config_file();

        let mut cfg = if path.exists() {
            match fs::read_to_string(&path)
                .map_err(crate::errors::AppError::from)
                .and_then(|content| serde_yaml::from_str::<Config>(&content).map_err(Into::into))
            {
                Ok(cfg) => cfg,
                Err(e) => {
                    log::warn!("Ignoring configuration file {}: {}", path.display(), e);
                    Config::default()
                }
            }
        } else {
            Config::default()
        };

        // The environment overrides what the file says.
        if let Some(p) = Self::env_database() {
            cfg.database = p.to_string_lossy().to_string();
        }

        cfg
    }

    /// Initialize configuration and database files
    pub fn init_all(custom_db: Option<String>, is_test: bool) -> AppResult<Config> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        let db_path = match custom_db {
            Some(name) => {
                let p = std::path::Path::new(&name);
                if p.is_absolute() {
                    p.to_path_buf()
                } else {
                    dir.join(p)
                }
            }
            None => Self::database_file(),
        };

        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            ..Config::default()
        };

        if !is_test {
            let yaml = serde_yaml::to_string(&config)?;
            let mut file = fs::File::create(Self::config_file())?;
            file.write_all(yaml.as_bytes())?;
            println!("✅ Config file: {:?}", Self::config_file());
        }

        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        println!("✅ Database:    {:?}", db_path);

        Ok(config)
    }
}
