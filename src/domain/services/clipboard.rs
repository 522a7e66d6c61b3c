#[cfg(test)]
#[path = "clipboard_test.rs"]
mod tests;

use anyhow::anyhow;
use anyhow::Result;
use once_cell::sync::OnceCell;
use tokio::sync::mpsc;
use tokio::sync::oneshot;

type ClipboardRequest = (String, oneshot::Sender<Result<()>>);

static SENDER: OnceCell<mpsc::UnboundedSender<ClipboardRequest>> = OnceCell::new();

/// Writes each requested text and replies with the outcome. A failed write
/// never stops the loop.
async fn serve<F>(rx: &mut mpsc::UnboundedReceiver<ClipboardRequest>, mut write: F)
where
    F: FnMut(String) -> Result<()>,
{
    while let Some((text, reply)) = rx.recv().await {
        tracing::debug!(len = text.len(), "copying to clipboard");
        let res = write(text);
        if let Err(err) = &res {
            tracing::error!(error = ?err, "failed to set clipboard text");
        }

        // The requester may have given up waiting.
        let _ = reply.send(res);
    }
}

/// Owns the system clipboard on a background task, as some platforms drop
/// clipboard contents once the owning handle goes away.
pub struct ClipboardService {}

impl ClipboardService {
    pub async fn start() -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<ClipboardRequest>();
        if SENDER.set(tx).is_err() {
            return Err(anyhow!("Clipboard service is already running."));
        }

        let mut clipboard = arboard::Clipboard::new();
        serve(&mut rx, |text| {
            return match clipboard.as_mut() {
                Ok(clipboard) => clipboard.set_text(text).map_err(anyhow::Error::from),
                Err(err) => Err(anyhow!("Clipboard is not available: {err}")),
            };
        })
        .await;

        return Ok(());
    }

    pub fn healthcheck() -> Result<()> {
        if SENDER.get().is_some() {
            return Ok(());
        }

        arboard::Clipboard::new()?;
        return Ok(());
    }

    /// Resolves once the text is on the clipboard.
    pub async fn set(text: String) -> Result<()> {
        let tx = match SENDER.get() {
            Some(tx) => tx,
            None => return Err(anyhow!("Clipboard is not available in this terminal.")),
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send((text, reply_tx))
            .map_err(|_| return anyhow!("Clipboard service has stopped."))?;

        return reply_rx.await?;
    }
}
