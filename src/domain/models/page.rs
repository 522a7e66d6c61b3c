#[cfg(test)]
#[path = "page_test.rs"]
mod tests;

use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum PageName {
    Image,
    Video,
    Settings,
}

impl PageName {
    pub fn parse(text: &str) -> Option<PageName> {
        return PageName::iter().find(|e| return e.to_string() == text);
    }

    pub fn title(&self) -> &'static str {
        match self {
            PageName::Image => return "Image Studio",
            PageName::Video => return "Video Studio",
            PageName::Settings => return "Settings",
        }
    }

    pub fn index(&self) -> usize {
        return PageName::iter()
            .position(|e| return e == *self)
            .unwrap_or_default();
    }
}

/// Optional context handed to a page when navigating to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageContext {
    Prompt(String),
}

/// A mounted page. Pages other than the landing page are only built when
/// they are first visited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub name: PageName,
    pub body: Vec<String>,
}
