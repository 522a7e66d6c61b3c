#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use super::clipboard::ClipboardService;
use super::Downloads;
use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::GenerationRequest;
use crate::domain::models::GenerationResult;
use crate::domain::models::Generator;
use crate::domain::models::GeneratorBox;
use crate::domain::models::NotificationKind;

pub fn help_text() -> String {
    let text = r#"
STUDIO:
- Enter - Generate an image from the prompt.
- CTRL+R - Regenerate the last submitted prompt.
- ALT+M / ALT+N - Next / previous model.
- ALT+A - Next aspect ratio.
- ALT+S - Next resolution, when the model supports it.
- Tab - Switch focus between the prompt and the history list.
- Esc - Dismiss the latest notification, or close the API key dialog.

HISTORY:
- Up / Down - Move through past generations, showing each one.
- c - Copy the prompt to your clipboard.
- d - Download the image to the download directory.
- r - Remix: copy the prompt back into the prompt field.
- o - Open the image in your browser.
- x - Clear all history. Press y to confirm.

PAGES:
- F1 - Image studio.
- F2 - Video studio.
- F3 - Settings. Press k there to change your API key.
- CTRL+C - Exit.
        "#;

    return text.trim().to_string();
}

type SharedGenerator = Arc<dyn Generator + Send + Sync>;

async fn generate(
    generator: SharedGenerator,
    request: GenerationRequest,
    credential: String,
    tx: mpsc::UnboundedSender<Event>,
) -> Result<()> {
    match generator.generate_image(&request, &credential).await {
        Ok(image) => {
            tx.send(Event::GenerationSucceeded(request, image))?;
        }
        Err(err) => {
            tx.send(Event::GenerationFailed(request, err.to_string()))?;
        }
    }

    return Ok(());
}

async fn copy_to_clipboard(text: String, tx: &mpsc::UnboundedSender<Event>) -> Result<()> {
    if let Err(err) = ClipboardService::set(text).await {
        tx.send(Event::Notify(
            format!("Failed to copy prompt: {err}"),
            NotificationKind::Error,
        ))?;
        return Ok(());
    }

    tx.send(Event::Notify(
        "Prompt copied to clipboard.".to_string(),
        NotificationKind::Success,
    ))?;

    return Ok(());
}

async fn download_image(
    downloads: Downloads,
    result: GenerationResult,
    tx: mpsc::UnboundedSender<Event>,
) -> Result<()> {
    match downloads.download(&result).await {
        Ok(file_path) => {
            tx.send(Event::Notify(
                format!("Saved image to {}", file_path.to_string_lossy()),
                NotificationKind::Success,
            ))?;
        }
        Err(err) => {
            tracing::warn!(error = ?err, url = result.url, "direct download failed");
            if let Err(open_err) = downloads.open(&result.url) {
                tx.send(Event::Notify(
                    format!("Download failed and the image could not be opened: {open_err}"),
                    NotificationKind::Error,
                ))?;
                return Ok(());
            }

            tx.send(Event::Notify(
                "Direct download failed, opened the image in your browser instead.".to_string(),
                NotificationKind::Info,
            ))?;
        }
    }

    return Ok(());
}

fn open(downloads: &Downloads, url: &str, tx: &mpsc::UnboundedSender<Event>) -> Result<()> {
    if let Err(err) = downloads.open(url) {
        tx.send(Event::Notify(
            format!("Failed to open {url}: {err}"),
            NotificationKind::Error,
        ))?;
    }

    return Ok(());
}

pub struct ActionsService {}

impl ActionsService {
    pub async fn start(
        generator: GeneratorBox,
        downloads: Downloads,
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        if let Err(err) = generator.health_check().await {
            tracing::error!(error = ?err, "generation service health check failed");
            tx.send(Event::Notify(
                format!("The generation service looks unreachable, requests may fail. Error: {err}"),
                NotificationKind::Error,
            ))?;
        }

        let generator: SharedGenerator = Arc::from(generator);

        while let Some(action) = rx.recv().await {
            match action {
                Action::Generate(request, credential) => {
                    // Requests run to completion, nothing cancels them.
                    let worker_tx = tx.clone();
                    let worker_generator = generator.clone();
                    tokio::spawn(async move {
                        return generate(worker_generator, request, credential, worker_tx).await;
                    });
                }
                Action::CopyToClipboard(text) => {
                    copy_to_clipboard(text, &tx).await?;
                }
                Action::DownloadImage(result) => {
                    let worker_tx = tx.clone();
                    let worker_downloads = downloads.clone();
                    tokio::spawn(async move {
                        return download_image(worker_downloads, result, worker_tx).await;
                    });
                }
                Action::OpenUrl(url) => {
                    open(&downloads, &url, &tx)?;
                }
            }
        }

        return Ok(());
    }
}
