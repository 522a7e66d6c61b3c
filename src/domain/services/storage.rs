#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;

use std::fs;
use std::path;

use anyhow::Result;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum StorageKey {
    ApiKey,
    History,
    Remix,
}

impl StorageKey {
    fn file_name(&self) -> String {
        match self {
            StorageKey::ApiKey => return self.to_string(),
            StorageKey::History | StorageKey::Remix => return format!("{self}.json"),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(file_path: &path::Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(file_path, fs::Permissions::from_mode(0o600))?;
    return Ok(());
}

#[cfg(not(unix))]
fn restrict_permissions(_file_path: &path::Path) -> Result<()> {
    return Ok(());
}

/// String-keyed persistence for the handful of values the studio keeps
/// between runs. Each key is stored as its own file in the data directory.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    pub data_dir: path::PathBuf,
}

impl Default for LocalStorage {
    fn default() -> LocalStorage {
        return LocalStorage::new(path::PathBuf::from(Config::get(ConfigKey::DataDir)));
    }
}

impl LocalStorage {
    pub fn new(data_dir: path::PathBuf) -> LocalStorage {
        return LocalStorage { data_dir };
    }

    pub fn file_path(&self, key: StorageKey) -> path::PathBuf {
        return self.data_dir.join(key.file_name());
    }

    pub fn get(&self, key: StorageKey) -> Option<String> {
        let file_path = self.file_path(key);
        if !file_path.exists() {
            return None;
        }

        match fs::read_to_string(&file_path) {
            Ok(payload) => return Some(payload),
            Err(err) => {
                tracing::warn!(key = key.to_string(), error = ?err, "failed to read local storage");
                return None;
            }
        }
    }

    pub fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        if !self.data_dir.exists() {
            fs::create_dir_all(&self.data_dir)?;
        }

        let file_path = self.file_path(key);
        fs::write(&file_path, value)?;
        if key == StorageKey::ApiKey {
            restrict_permissions(&file_path)?;
        }

        return Ok(());
    }

    pub fn remove(&self, key: StorageKey) -> Result<()> {
        let file_path = self.file_path(key);
        if !file_path.exists() {
            return Ok(());
        }

        fs::remove_file(file_path)?;
        return Ok(());
    }

    /// Reads a one-shot value and deletes it.
    pub fn take(&self, key: StorageKey) -> Result<Option<String>> {
        let value = self.get(key);
        if value.is_some() {
            self.remove(key)?;
        }

        return Ok(value);
    }
}
