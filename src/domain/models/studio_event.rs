use std::time::Instant;

use super::GeneratedImage;
use super::GenerationRequest;
use super::NotificationKind;

/// Everything the studio reacts to. The UI translates key presses into these,
/// and the actions service reports request outcomes with them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StudioEvent {
    AspectRatioSelected(String),
    CredentialDismissed(),
    CredentialEditRequested(),
    CredentialProvided(String),
    Generate(String),
    GenerationFailed(GenerationRequest, String),
    GenerationSucceeded(GenerationRequest, GeneratedImage),
    HistoryClearCancelled(),
    HistoryClearConfirmed(),
    HistoryClearRequested(),
    HistoryCopyPrompt(usize),
    HistoryDownload(usize),
    HistoryRemix(usize),
    HistorySelected(usize),
    ModelSelected(String),
    NotificationDismissed(),
    Notify(String, NotificationKind),
    OpenCurrent(),
    Regenerate(),
    ResolutionSelected(String),
    Tick(Instant),
}
