use super::GenerationRequest;
use super::GenerationResult;

/// Work the UI hands to the background actions service.
pub enum Action {
    CopyToClipboard(String),
    DownloadImage(GenerationResult),
    Generate(GenerationRequest, String),
    OpenUrl(String),
}
