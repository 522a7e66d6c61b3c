pub mod remote;

use anyhow::bail;
use anyhow::Result;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Catalog;
use crate::domain::models::GeneratorBox;

pub struct GeneratorManager {}

impl GeneratorManager {
    pub fn get(catalog: &Catalog) -> Result<GeneratorBox> {
        let url = Config::get(ConfigKey::ApiURL);
        if url.trim().is_empty() {
            bail!("No generation service configured, set api-url in your config file");
        }

        return Ok(Box::new(remote::RemoteGenerator::new(
            &url,
            catalog.clone(),
        )));
    }
}
