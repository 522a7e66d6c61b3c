#[cfg(test)]
#[path = "router_test.rs"]
mod tests;

use std::collections::HashMap;

use anyhow::bail;
use anyhow::Result;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Page;
use crate::domain::models::PageContext;
use crate::domain::models::PageName;

fn build_page(name: PageName) -> Page {
    let body = match name {
        PageName::Image => vec![],
        PageName::Video => vec![
            "Video generation is coming soon.".to_string(),
            "Press F1 to head back to the image studio.".to_string(),
        ],
        PageName::Settings => vec![
            format!("API URL: {}", Config::get(ConfigKey::ApiURL)),
            format!("Data directory: {}", Config::get(ConfigKey::DataDir)),
            format!("Download directory: {}", Config::get(ConfigKey::DownloadDir)),
            format!("Config file: {}", Config::get(ConfigKey::ConfigFile)),
        ],
    };

    tracing::debug!(page = name.to_string(), "mounted page");
    return Page { name, body };
}

/// Swaps the active page by its short key. The landing page is built up
/// front, every other page on its first visit.
pub struct Router {
    active: PageName,
    context: Option<PageContext>,
    pages: HashMap<PageName, Page>,
}

impl Router {
    pub fn new(landing: PageName) -> Router {
        let mut pages = HashMap::new();
        pages.insert(landing, build_page(landing));

        return Router {
            active: landing,
            context: None,
            pages,
        };
    }

    pub fn navigate(&mut self, key: &str, context: Option<PageContext>) -> Result<PageName> {
        let name = match PageName::parse(key) {
            Some(name) => name,
            None => bail!(format!("No page named {key}")),
        };

        if !self.is_mounted(name) {
            self.pages.insert(name, build_page(name));
        }
        self.active = name;
        self.context = context;

        return Ok(name);
    }

    pub fn active(&self) -> PageName {
        return self.active;
    }

    pub fn page(&self) -> Option<&Page> {
        return self.pages.get(&self.active);
    }

    pub fn is_mounted(&self, name: PageName) -> bool {
        return self.pages.contains_key(&name);
    }

    /// Context passed with the last navigation, handed out once.
    pub fn take_context(&mut self) -> Option<PageContext> {
        return self.context.take();
    }
}
