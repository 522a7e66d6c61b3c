#[cfg(test)]
#[path = "studio_test.rs"]
mod tests;

use std::time::Duration;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::mpsc;

use super::CredentialStore;
use super::HistoryStore;
use super::LocalStorage;
use super::NotificationService;
use super::Selection;
use super::StorageKey;
use super::DEFAULT_NOTIFICATION_DURATION;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::Catalog;
use crate::domain::models::GeneratedImage;
use crate::domain::models::GenerationRequest;
use crate::domain::models::GenerationResult;
use crate::domain::models::NotificationKind;
use crate::domain::models::RemixPayload;
use crate::domain::models::StudioEvent;

pub const DEFAULT_ERROR_RECOVERY_DELAY: Duration = Duration::from_millis(3000);

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum GenerationState {
    Idle,
    Validating,
    AwaitingCredential,
    Submitting,
    Succeeded,
    Failed,
}

/// What the generate control currently displays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerateControl {
    Ready,
    Busy,
    Error { message: String, until: Instant },
}

impl GenerateControl {
    pub fn label(&self) -> String {
        match self {
            GenerateControl::Ready => return "Generate".to_string(),
            GenerateControl::Busy => return "Generating...".to_string(),
            GenerateControl::Error { message, .. } => return format!("Error: {message}"),
        }
    }

    pub fn is_enabled(&self) -> bool {
        return *self != GenerateControl::Busy;
    }
}

pub struct StudioOptions {
    pub model_id: String,
    pub aspect_ratio: String,
    pub notification_duration: Duration,
    pub error_recovery_delay: Duration,
}

impl Default for StudioOptions {
    fn default() -> StudioOptions {
        return StudioOptions {
            model_id: "".to_string(),
            aspect_ratio: "".to_string(),
            notification_duration: DEFAULT_NOTIFICATION_DURATION,
            error_recovery_delay: DEFAULT_ERROR_RECOVERY_DELAY,
        };
    }
}

impl StudioOptions {
    pub fn from_config() -> Result<StudioOptions> {
        return Ok(StudioOptions {
            model_id: Config::get(ConfigKey::Model),
            aspect_ratio: Config::get(ConfigKey::AspectRatio),
            notification_duration: Duration::from_millis(
                Config::get(ConfigKey::NotificationDuration).parse::<u64>()?,
            ),
            error_recovery_delay: Duration::from_millis(
                Config::get(ConfigKey::ErrorRecoveryDelay).parse::<u64>()?,
            ),
        });
    }
}

/// Coordinates a generation from the moment the user asks for one until it is
/// recorded in history or reported as a failure. All state changes go through
/// `handle`, and all I/O is handed to the actions service over `tx`.
pub struct Studio {
    catalog: Catalog,
    credentials: CredentialStore,
    history: HistoryStore,
    notifications: NotificationService,
    selection: Selection,
    state: GenerationState,
    control: GenerateControl,
    error_recovery_delay: Duration,
    pending: Option<GenerationRequest>,
    last_request: Option<GenerationRequest>,
    current: Option<GenerationResult>,
    editing_credential: bool,
    confirming_clear: bool,
    prompt_fill: Option<String>,
    tx: mpsc::UnboundedSender<Action>,
}

impl Studio {
    pub fn new(
        catalog: Catalog,
        storage: LocalStorage,
        options: StudioOptions,
        tx: mpsc::UnboundedSender<Action>,
    ) -> Studio {
        let mut history = HistoryStore::new(storage.clone());
        history.load();

        let mut selection = Selection::new(&catalog, &options.model_id);
        if !options.aspect_ratio.is_empty() {
            selection.select_aspect_ratio(&options.aspect_ratio);
        }

        let mut studio = Studio {
            credentials: CredentialStore::new(storage.clone()),
            history,
            notifications: NotificationService::new(options.notification_duration),
            selection,
            catalog,
            state: GenerationState::Idle,
            control: GenerateControl::Ready,
            error_recovery_delay: options.error_recovery_delay,
            pending: None,
            last_request: None,
            current: None,
            editing_credential: false,
            confirming_clear: false,
            prompt_fill: None,
            tx,
        };

        studio.consume_remix(&storage);
        return studio;
    }

    fn consume_remix(&mut self, storage: &LocalStorage) {
        let payload = match storage.take(StorageKey::Remix) {
            Ok(Some(payload)) => payload,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(error = ?err, "failed to consume remix payload");
                return;
            }
        };

        let remix = match serde_json::from_str::<RemixPayload>(&payload) {
            Ok(remix) => remix,
            Err(err) => {
                tracing::warn!(error = ?err, "discarding unreadable remix payload");
                return;
            }
        };

        if let Some(model_id) = &remix.model_id {
            self.selection.select_model(&self.catalog, model_id);
        }
        if let Some(aspect_ratio) = &remix.aspect_ratio {
            self.selection.select_aspect_ratio(aspect_ratio);
        }
        self.prompt_fill = Some(remix.prompt);
    }

    pub fn catalog(&self) -> &Catalog {
        return &self.catalog;
    }

    pub fn credentials(&self) -> &CredentialStore {
        return &self.credentials;
    }

    pub fn history(&self) -> &HistoryStore {
        return &self.history;
    }

    pub fn notifications(&self) -> &NotificationService {
        return &self.notifications;
    }

    pub fn selection(&self) -> &Selection {
        return &self.selection;
    }

    pub fn state(&self) -> GenerationState {
        return self.state;
    }

    pub fn control(&self) -> &GenerateControl {
        return &self.control;
    }

    pub fn current(&self) -> Option<&GenerationResult> {
        return self.current.as_ref();
    }

    pub fn last_request(&self) -> Option<&GenerationRequest> {
        return self.last_request.as_ref();
    }

    pub fn is_credential_prompt_open(&self) -> bool {
        return self.state == GenerationState::AwaitingCredential || self.editing_credential;
    }

    pub fn is_confirming_clear(&self) -> bool {
        return self.confirming_clear;
    }

    /// Prompt the view should copy into its prompt field, handed out once.
    pub fn take_prompt_fill(&mut self) -> Option<String> {
        return self.prompt_fill.take();
    }

    pub fn handle(&mut self, event: StudioEvent) -> Result<()> {
        match event {
            StudioEvent::Generate(prompt) => {
                let request = GenerationRequest {
                    prompt,
                    model_id: self.selection.model_id.to_string(),
                    aspect_ratio: self.selection.aspect_ratio.to_string(),
                    resolution: self.selection.request_resolution(),
                };
                self.submit(request)?;
            }
            StudioEvent::Regenerate() => {
                if let Some(request) = self.last_request.clone() {
                    self.submit(request)?;
                }
            }
            StudioEvent::CredentialProvided(value) => {
                self.provide_credential(&value)?;
            }
            StudioEvent::CredentialDismissed() => {
                self.editing_credential = false;
                if self.state == GenerationState::AwaitingCredential {
                    self.pending = None;
                    self.state = GenerationState::Idle;
                }
            }
            StudioEvent::CredentialEditRequested() => {
                self.editing_credential = true;
            }
            StudioEvent::GenerationSucceeded(request, image) => {
                self.complete(request, image);
            }
            StudioEvent::GenerationFailed(request, message) => {
                self.fail(&request, &message);
            }
            StudioEvent::ModelSelected(model_id) => {
                if !self.selection.select_model(&self.catalog, &model_id) {
                    tracing::warn!(model = model_id, "ignoring unknown model");
                }
            }
            StudioEvent::AspectRatioSelected(aspect_ratio) => {
                self.selection.select_aspect_ratio(&aspect_ratio);
            }
            StudioEvent::ResolutionSelected(resolution) => {
                self.selection.select_resolution(&resolution);
            }
            StudioEvent::HistorySelected(idx) => {
                if let Some(entry) = self.history.entries().get(idx) {
                    self.current = Some(entry.clone());
                }
            }
            StudioEvent::HistoryRemix(idx) => {
                if let Some(entry) = self.history.entries().get(idx) {
                    self.prompt_fill = Some(entry.prompt.to_string());
                    self.notifications
                        .notify("Prompt copied to the editor.", NotificationKind::Info);
                }
            }
            StudioEvent::HistoryCopyPrompt(idx) => {
                if let Some(entry) = self.history.entries().get(idx) {
                    self.tx.send(Action::CopyToClipboard(entry.prompt.to_string()))?;
                }
            }
            StudioEvent::HistoryDownload(idx) => {
                if let Some(entry) = self.history.entries().get(idx) {
                    self.tx.send(Action::DownloadImage(entry.clone()))?;
                }
            }
            StudioEvent::HistoryClearRequested() => {
                if !self.history.is_empty() {
                    self.confirming_clear = true;
                }
            }
            StudioEvent::HistoryClearCancelled() => {
                self.confirming_clear = false;
            }
            StudioEvent::HistoryClearConfirmed() => {
                if self.confirming_clear {
                    self.confirming_clear = false;
                    self.history.clear()?;
                    self.notifications
                        .notify("History cleared.", NotificationKind::Success);
                }
            }
            StudioEvent::OpenCurrent() => {
                if let Some(current) = &self.current {
                    self.tx.send(Action::OpenUrl(current.url.to_string()))?;
                }
            }
            StudioEvent::NotificationDismissed() => {
                self.notifications.dismiss_latest();
            }
            StudioEvent::Notify(message, kind) => {
                self.notifications.notify(&message, kind);
            }
            StudioEvent::Tick(now) => {
                self.notifications.tick(now);
                if let GenerateControl::Error { until, .. } = &self.control {
                    if now >= *until {
                        self.control = GenerateControl::Ready;
                    }
                }
            }
        }

        return Ok(());
    }

    fn submit(&mut self, mut request: GenerationRequest) -> Result<()> {
        // At most one request is in flight. Anything submitted meanwhile is
        // dropped rather than queued.
        if self.state == GenerationState::Submitting {
            self.notifications.notify(
                "A generation is already in progress.",
                NotificationKind::Info,
            );
            return Ok(());
        }

        self.state = GenerationState::Validating;
        request.prompt = request.prompt.trim().to_string();
        if request.prompt.is_empty() {
            self.state = GenerationState::Idle;
            return Ok(());
        }

        match self.credentials.get() {
            Some(credential) => {
                self.dispatch(request, credential)?;
            }
            None => {
                tracing::debug!("no credential stored, asking for one");
                self.pending = Some(request);
                self.state = GenerationState::AwaitingCredential;
            }
        }

        return Ok(());
    }

    fn provide_credential(&mut self, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            self.notifications
                .notify("API key cannot be empty.", NotificationKind::Error);
            return Ok(());
        }

        self.credentials.set(value)?;
        self.editing_credential = false;
        self.notifications
            .notify("API key saved.", NotificationKind::Success);

        if self.state == GenerationState::AwaitingCredential {
            if let Some(request) = self.pending.take() {
                self.dispatch(request, value.trim().to_string())?;
            } else {
                self.state = GenerationState::Idle;
            }
        }

        return Ok(());
    }

    fn dispatch(&mut self, request: GenerationRequest, credential: String) -> Result<()> {
        tracing::debug!(
            model = request.model_id,
            aspect_ratio = request.aspect_ratio,
            resolution = ?request.resolution,
            "submitting generation"
        );

        self.state = GenerationState::Submitting;
        self.control = GenerateControl::Busy;
        self.last_request = Some(request.clone());
        self.notifications
            .notify("Generating image...", NotificationKind::Info);
        self.tx.send(Action::Generate(request, credential))?;

        return Ok(());
    }

    fn complete(&mut self, request: GenerationRequest, image: GeneratedImage) {
        if image.url.trim().is_empty() {
            self.fail(&request, "No image URL returned");
            return;
        }

        let result = GenerationResult::new(&request, image);
        if let Err(err) = self.history.add(result.clone()) {
            tracing::warn!(error = ?err, "failed to persist history");
        }

        self.current = Some(result);
        self.state = GenerationState::Succeeded;
        self.control = GenerateControl::Ready;
        self.notifications
            .notify("Image generated!", NotificationKind::Success);
    }

    fn fail(&mut self, request: &GenerationRequest, message: &str) {
        tracing::error!(model = request.model_id, error = message, "generation failed");

        self.state = GenerationState::Failed;
        self.control = GenerateControl::Error {
            message: message.to_string(),
            until: Instant::now() + self.error_recovery_delay,
        };
        self.notifications.notify(
            &format!("Generation failed: {message}"),
            NotificationKind::Error,
        );
    }
}
