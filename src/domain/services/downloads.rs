#[cfg(test)]
#[path = "downloads_test.rs"]
mod tests;

use std::path;
use std::process::Stdio;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use tokio::fs;
use tokio::process;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::GenerationResult;

pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Opens a URL outside the terminal.
pub type UrlOpener = fn(&str) -> Result<()>;

#[derive(Clone)]
pub struct Downloads {
    pub download_dir: path::PathBuf,
    pub timeout: Duration,
    opener: UrlOpener,
}

impl Default for Downloads {
    fn default() -> Downloads {
        return Downloads::new(path::PathBuf::from(Config::get(ConfigKey::DownloadDir)));
    }
}

impl Downloads {
    pub fn new(download_dir: path::PathBuf) -> Downloads {
        return Downloads {
            download_dir,
            timeout: DOWNLOAD_TIMEOUT,
            opener: open_url,
        };
    }

    pub fn with_opener(mut self, opener: UrlOpener) -> Downloads {
        self.opener = opener;
        return self;
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Downloads {
        self.timeout = timeout;
        return self;
    }

    pub fn open(&self, url: &str) -> Result<()> {
        return (self.opener)(url);
    }

    /// File name derived from the result id and the extension of the URL
    /// path, defaulting to png.
    pub fn file_name(result: &GenerationResult) -> String {
        let path = result
            .url
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let last_segment = path.rsplit('/').next().unwrap_or_default();

        let mut extension = "png".to_string();
        if let Some((_, ext)) = last_segment.rsplit_once('.') {
            if !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| return c.is_ascii_alphanumeric()) {
                extension = ext.to_lowercase();
            }
        }

        let id = result
            .id
            .chars()
            .filter(|c| return c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect::<String>();

        return format!("genstudio-{id}.{extension}");
    }

    pub async fn download(&self, result: &GenerationResult) -> Result<path::PathBuf> {
        let res = reqwest::Client::new()
            .get(&result.url)
            .timeout(self.timeout)
            .send()
            .await?;
        if !res.status().is_success() {
            bail!(format!(
                "Image download failed with status {}",
                res.status().as_u16()
            ));
        }

        let bytes = res.bytes().await?;
        if !self.download_dir.exists() {
            fs::create_dir_all(&self.download_dir).await?;
        }

        let file_path = self.download_dir.join(Downloads::file_name(result));
        fs::write(&file_path, &bytes).await?;

        tracing::debug!(path = ?file_path, bytes = bytes.len(), "downloaded image");
        return Ok(file_path);
    }
}

/// Opens a URL with the platform's default handler, usually a browser. The
/// child is awaited on a background task so it gets reaped.
pub fn open_url(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    let mut cmd = process::Command::new("open");
    #[cfg(target_os = "windows")]
    let mut cmd = process::Command::new("cmd");
    #[cfg(target_os = "windows")]
    cmd.args(["/C", "start", ""]);
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut cmd = process::Command::new("xdg-open");

    let mut child = cmd
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    tokio::spawn(async move {
        let status = child.wait().await;
        tracing::debug!(status = ?status, "url opener exited");
    });

    return Ok(());
}
