#[cfg(test)]
#[path = "selection_test.rs"]
mod tests;

use crate::domain::models::Catalog;

fn cycle(options: &[String], current: &str, forward: bool) -> Option<String> {
    if options.is_empty() {
        return None;
    }

    let len = options.len();
    let idx = options
        .iter()
        .position(|option| return option == current)
        .map(|idx| {
            if forward {
                return (idx + 1) % len;
            }
            return (idx + len - 1) % len;
        })
        .unwrap_or_default();

    return Some(options[idx].to_string());
}

/// The model, aspect ratio and resolution currently picked in the studio.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub model_id: String,
    pub aspect_ratio: String,
    pub resolution: String,
    pub resolution_visible: bool,
    aspect_ratios: Vec<String>,
    resolutions: Vec<String>,
}

impl Selection {
    /// Starts on `model_id`, or on the first catalog model when the id is
    /// unknown.
    pub fn new(catalog: &Catalog, model_id: &str) -> Selection {
        let mut model_id = model_id.to_string();
        if catalog.find_by_id(&model_id).is_none() {
            model_id = catalog.default_model().id.to_string();
        }

        let aspect_ratios = catalog.aspect_ratios_for(&model_id);
        let resolutions = catalog.resolutions_for(&model_id);

        return Selection {
            aspect_ratio: aspect_ratios[0].to_string(),
            resolution: resolutions[0].to_string(),
            resolution_visible: catalog.has_resolution_control(&model_id),
            model_id,
            aspect_ratios,
            resolutions,
        };
    }

    pub fn aspect_ratios(&self) -> &[String] {
        return &self.aspect_ratios;
    }

    pub fn resolutions(&self) -> &[String] {
        return &self.resolutions;
    }

    /// Switches model, resetting the aspect ratio to the model's first ratio.
    /// The resolution is kept when it is still valid for the new model.
    pub fn select_model(&mut self, catalog: &Catalog, model_id: &str) -> bool {
        if catalog.find_by_id(model_id).is_none() {
            return false;
        }

        self.model_id = model_id.to_string();
        self.aspect_ratios = catalog.aspect_ratios_for(model_id);
        self.aspect_ratio = self.aspect_ratios[0].to_string();

        self.resolutions = catalog.resolutions_for(model_id);
        self.resolution_visible = catalog.has_resolution_control(model_id);
        if !self.resolutions.contains(&self.resolution) {
            self.resolution = self.resolutions[0].to_string();
        }

        return true;
    }

    pub fn select_aspect_ratio(&mut self, aspect_ratio: &str) -> bool {
        if !self.aspect_ratios.iter().any(|ratio| return ratio == aspect_ratio) {
            return false;
        }

        self.aspect_ratio = aspect_ratio.to_string();
        return true;
    }

    pub fn select_resolution(&mut self, resolution: &str) -> bool {
        if !self.resolution_visible || !self.resolutions.iter().any(|res| return res == resolution) {
            return false;
        }

        self.resolution = resolution.to_string();
        return true;
    }

    /// Resolution to send along with a request, only when the picker is shown.
    pub fn request_resolution(&self) -> Option<String> {
        if self.resolution_visible {
            return Some(self.resolution.to_string());
        }

        return None;
    }

    pub fn cycle_model(&self, catalog: &Catalog, forward: bool) -> String {
        let ids = catalog
            .list()
            .iter()
            .map(|model| return model.id.to_string())
            .collect::<Vec<String>>();

        return cycle(&ids, &self.model_id, forward).unwrap_or_else(|| return self.model_id.to_string());
    }

    pub fn cycle_aspect_ratio(&self, forward: bool) -> String {
        return cycle(&self.aspect_ratios, &self.aspect_ratio, forward)
            .unwrap_or_else(|| return self.aspect_ratio.to_string());
    }

    pub fn cycle_resolution(&self, forward: bool) -> String {
        return cycle(&self.resolutions, &self.resolution, forward)
            .unwrap_or_else(|| return self.resolution.to_string());
    }
}
