#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;

use super::LocalStorage;
use super::StorageKey;

/// Holds the single API key used to authorize generation requests. The key is
/// never validated locally, the remote service is the only judge.
#[derive(Clone, Debug)]
pub struct CredentialStore {
    storage: LocalStorage,
}

impl CredentialStore {
    pub fn new(storage: LocalStorage) -> CredentialStore {
        return CredentialStore { storage };
    }

    pub fn get(&self) -> Option<String> {
        return self
            .storage
            .get(StorageKey::ApiKey)
            .map(|value| return value.trim().to_string())
            .filter(|value| return !value.is_empty());
    }

    pub fn set(&self, value: &str) -> Result<()> {
        let value = value.trim();
        if value.is_empty() {
            bail!("API key cannot be empty");
        }

        self.storage.set(StorageKey::ApiKey, value)?;
        return Ok(());
    }

    pub fn clear(&self) -> Result<()> {
        return self.storage.remove(StorageKey::ApiKey);
    }

    pub fn is_set(&self) -> bool {
        return self.get().is_some();
    }
}
