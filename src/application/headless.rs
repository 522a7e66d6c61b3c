#[cfg(test)]
#[path = "headless_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Password;
use tokio::sync::mpsc;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::Catalog;
use crate::domain::models::Generator;
use crate::domain::models::GenerationResult;
use crate::domain::models::NotificationKind;
use crate::domain::models::StudioEvent;
use crate::domain::services::GenerationState;
use crate::domain::services::LocalStorage;
use crate::domain::services::Studio;
use crate::domain::services::StudioOptions;
use crate::infrastructure::generators::GeneratorManager;

fn ask_credential() -> Result<String> {
    let value = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("No API key saved yet, enter one to continue")
        .interact()?;

    return Ok(value);
}

fn last_error(studio: &Studio) -> String {
    return studio
        .notifications()
        .list()
        .iter()
        .rev()
        .find(|notice| return notice.kind == NotificationKind::Error)
        .map(|notice| return notice.message.to_string())
        .unwrap_or_else(|| return "Generation failed".to_string());
}

/// Drives a single generation through the studio without a terminal UI.
/// Requests take the same path as in the studio, so the result lands in
/// history.
pub async fn run<F>(
    studio: &mut Studio,
    generator: &(dyn Generator + Send + Sync),
    rx: &mut mpsc::UnboundedReceiver<Action>,
    prompt: &str,
    resolution: Option<&str>,
    credential_prompt: F,
) -> Result<GenerationResult>
where
    F: FnOnce() -> Result<String>,
{
    if prompt.trim().is_empty() {
        bail!("Prompt cannot be empty");
    }

    if let Some(resolution) = resolution {
        let selection = studio.selection();
        if !selection.resolution_visible {
            bail!(format!(
                "Model '{}' does not support choosing a resolution",
                selection.model_id
            ));
        }

        let choices = selection.resolutions().join(", ");
        let wanted = selection
            .resolutions()
            .iter()
            .find(|res| return res.eq_ignore_ascii_case(resolution))
            .map(|res| return res.to_string());

        match wanted {
            Some(res) => studio.handle(StudioEvent::ResolutionSelected(res))?,
            None => bail!(format!(
                "Unsupported resolution '{resolution}', expected one of: {choices}"
            )),
        }
    }

    studio.handle(StudioEvent::Generate(prompt.to_string()))?;

    if studio.state() == GenerationState::AwaitingCredential {
        let credential = credential_prompt()?;
        studio.handle(StudioEvent::CredentialProvided(credential))?;
        if studio.state() == GenerationState::AwaitingCredential {
            bail!("API key cannot be empty");
        }
    }

    let (request, credential) = match rx.try_recv() {
        Ok(Action::Generate(request, credential)) => (request, credential),
        _ => bail!("No generation was submitted"),
    };

    match generator.generate_image(&request, &credential).await {
        Ok(image) => {
            studio.handle(StudioEvent::GenerationSucceeded(request, image))?;
        }
        Err(err) => {
            studio.handle(StudioEvent::GenerationFailed(request, err.to_string()))?;
        }
    }

    if studio.state() != GenerationState::Succeeded {
        bail!(last_error(studio));
    }

    match studio.current() {
        Some(result) => return Ok(result.clone()),
        None => bail!("No image URL returned"),
    }
}

pub async fn generate(prompt: &str, resolution: Option<&str>) -> Result<()> {
    let catalog = Catalog::load(&Config::get(ConfigKey::CatalogFile))?;
    let generator = GeneratorManager::get(&catalog)?;

    let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
    let mut studio = Studio::new(
        catalog,
        LocalStorage::default(),
        StudioOptions::from_config()?,
        tx,
    );

    let result = run(
        &mut studio,
        &*generator,
        &mut rx,
        prompt,
        resolution,
        ask_credential,
    )
    .await?;

    println!("{}", Paint::green("Image generated!"));
    println!("ID: {}", result.id);
    println!("Model: {}, Aspect: {}", result.model_id, result.aspect_ratio);
    println!("{}", result.url);

    return Ok(());
}
