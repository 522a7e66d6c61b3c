#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::env;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

use crate::domain::models::PageName;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    ApiURL,
    AspectRatio,
    CatalogFile,
    ConfigFile,
    DataDir,
    DownloadDir,
    ErrorRecoveryDelay,
    HealthCheckTimeout,
    Model,
    NotificationDuration,
    Page,
}

fn home_dir() -> path::PathBuf {
    return dirs::home_dir().unwrap_or_else(env::temp_dir);
}

pub fn cache_dir() -> path::PathBuf {
    return dirs::cache_dir()
        .unwrap_or_else(|| return home_dir().join(".cache"))
        .join("genstudio");
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn default(key: ConfigKey) -> String {
        #[cfg(not(target_os = "macos"))]
        let config_path = dirs::config_dir()
            .unwrap_or_else(|| return home_dir().join(".config"))
            .join("genstudio/config.toml");
        #[cfg(target_os = "macos")]
        let config_path = home_dir().join(".config/genstudio/config.toml");

        let download_dir = dirs::download_dir().unwrap_or_else(|| return home_dir().join("Downloads"));
        let default_page = PageName::Image.to_string();

        let res = match key {
            ConfigKey::ApiURL => "http://localhost:8080/api/v1".to_string(),
            ConfigKey::AspectRatio => "".to_string(),
            ConfigKey::CatalogFile => "".to_string(),
            ConfigKey::DataDir => cache_dir().to_string_lossy().to_string(),
            ConfigKey::DownloadDir => download_dir.to_string_lossy().to_string(),
            ConfigKey::ErrorRecoveryDelay => "3000".to_string(),
            ConfigKey::HealthCheckTimeout => "1000".to_string(),
            ConfigKey::Model => "".to_string(),
            ConfigKey::NotificationDuration => "3000".to_string(),
            ConfigKey::Page => default_page,

            // Special
            ConfigKey::ConfigFile => config_path.to_string_lossy().to_string(),
        };

        return res;
    }

    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                if let Some(val) = doc.get(&key.to_string()) {
                    // Use clap value parsers to do validation.
                    let mut possible_values = vec![];
                    if let Some(arg) = cmd
                        .get_arguments()
                        .find(|e| return e.get_long() == Some(key.to_string().as_str()))
                    {
                        possible_values = arg
                            .get_possible_values()
                            .iter()
                            .map(|e| return e.get_name().to_string())
                            .collect::<Vec<String>>();
                    }

                    if let Some(val_int) = val.as_integer() {
                        Config::set(key, &val_int.to_string());
                    } else if let Some(val_str) = val.as_str() {
                        if val_str.is_empty() {
                            continue;
                        }
                        if !possible_values.is_empty()
                            && !possible_values.contains(&val_str.to_string())
                        {
                            bail!(format!("config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}", possible_values.join(", ")));
                        }
                        Config::set(key, val_str);
                    } else {
                        bail!(format!(
                            "config.toml has an invalid value for key '{key}', expected a string or an integer"
                        ));
                    }
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        for key in [
            ConfigKey::ErrorRecoveryDelay,
            ConfigKey::HealthCheckTimeout,
            ConfigKey::NotificationDuration,
        ] {
            if Config::get(key).parse::<u64>().is_err() {
                bail!(format!(
                    "'{key}' must be a number of milliseconds, got '{}'",
                    Config::get(key)
                ));
            }
        }

        tracing::debug!(
            api_url = Config::get(ConfigKey::ApiURL),
            catalog_file = Config::get(ConfigKey::CatalogFile),
            data_dir = Config::get(ConfigKey::DataDir),
            model = Config::get(ConfigKey::Model),
            page = Config::get(ConfigKey::Page),
            "config"
        );

        return Ok(());
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))?;

                let mut description = arg
                    .get_help()
                    .map(|e| return e.to_string())
                    .unwrap_or_default()
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                if !arg.get_possible_values().is_empty() {
                    let possible_values = arg
                        .get_possible_values()
                        .iter()
                        .map(|e| return e.get_name().to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    description = format!("{description} [possible values: {possible_values}]");
                }

                let mut val = Config::default(key);
                // Directory defaults depend on the host, so leave them commented out.
                if val.is_empty() || key == ConfigKey::DataDir || key == ConfigKey::DownloadDir {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i32>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
