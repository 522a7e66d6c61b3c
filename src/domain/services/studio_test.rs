use std::time::Duration;
use std::time::Instant;

use anyhow::bail;
use anyhow::Result;
use tempfile::TempDir;
use test_utils::catalog_fixture;
use test_utils::temp_data_dir;
use tokio::sync::mpsc;

use super::GenerateControl;
use super::GenerationState;
use super::Studio;
use super::StudioOptions;
use crate::domain::models::Action;
use crate::domain::models::Catalog;
use crate::domain::models::GeneratedImage;
use crate::domain::models::GenerationRequest;
use crate::domain::models::NotificationKind;
use crate::domain::models::RemixPayload;
use crate::domain::models::StudioEvent;
use crate::domain::services::CredentialStore;
use crate::domain::services::LocalStorage;
use crate::domain::services::StorageKey;

fn studio(dir: &TempDir) -> (Studio, mpsc::UnboundedReceiver<Action>) {
    let (tx, rx) = mpsc::unbounded_channel::<Action>();
    let studio = Studio::new(
        Catalog::from_json(catalog_fixture()).unwrap(),
        LocalStorage::new(dir.path().to_path_buf()),
        StudioOptions::default(),
        tx,
    );

    return (studio, rx);
}

fn studio_with_credential(dir: &TempDir) -> (Studio, mpsc::UnboundedReceiver<Action>) {
    CredentialStore::new(LocalStorage::new(dir.path().to_path_buf()))
        .set("secret")
        .unwrap();
    return studio(dir);
}

fn generate_request(rx: &mut mpsc::UnboundedReceiver<Action>) -> Result<(GenerationRequest, String)> {
    match rx.try_recv()? {
        Action::Generate(request, credential) => return Ok((request, credential)),
        _ => bail!("Wrong enum"),
    }
}

fn error_count(studio: &Studio) -> usize {
    return studio
        .notifications()
        .list()
        .iter()
        .filter(|notice| return notice.kind == NotificationKind::Error)
        .count();
}

mod submitting {
    use super::*;

    #[test]
    fn it_ignores_empty_prompts() -> Result<()> {
        let dir = temp_data_dir();
        let (mut studio, mut rx) = studio_with_credential(&dir);
        studio.handle(StudioEvent::Generate("".to_string()))?;
        studio.handle(StudioEvent::Generate("  \n\t ".to_string()))?;

        assert!(rx.try_recv().is_err());
        assert_eq!(studio.state(), GenerationState::Idle);
        assert!(studio.notifications().list().is_empty());
        return Ok(());
    }

    #[test]
    fn it_submits_the_current_selection() -> Result<()> {
        let dir = temp_data_dir();
        let (mut studio, mut rx) = studio_with_credential(&dir);
        studio.handle(StudioEvent::AspectRatioSelected("16:9".to_string()))?;
        studio.handle(StudioEvent::Generate("  a cat ".to_string()))?;

        let (request, credential) = generate_request(&mut rx)?;
        assert_eq!(request.prompt, "a cat");
        assert_eq!(request.model_id, "nano-banana");
        assert_eq!(request.aspect_ratio, "16:9");
        assert_eq!(request.resolution, None);
        assert_eq!(credential, "secret");

        assert_eq!(studio.state(), GenerationState::Submitting);
        assert_eq!(*studio.control(), GenerateControl::Busy);
        assert!(!studio.control().is_enabled());
        assert_eq!(studio.notifications().list()[0].kind, NotificationKind::Info);
        return Ok(());
    }

    #[test]
    fn it_sends_resolution_when_the_picker_is_visible() -> Result<()> {
        let dir = temp_data_dir();
        let (mut studio, mut rx) = studio_with_credential(&dir);
        studio.handle(StudioEvent::ModelSelected("seedream-4".to_string()))?;
        studio.handle(StudioEvent::ResolutionSelected("4K".to_string()))?;
        studio.handle(StudioEvent::Generate("a cat".to_string()))?;

        let (request, _) = generate_request(&mut rx)?;
        assert_eq!(request.model_id, "seedream-4");
        assert_eq!(request.aspect_ratio, "16:9");
        assert_eq!(request.resolution, Some("4K".to_string()));
        return Ok(());
    }

    #[test]
    fn it_ignores_submissions_while_one_is_in_flight() -> Result<()> {
        let dir = temp_data_dir();
        let (mut studio, mut rx) = studio_with_credential(&dir);
        studio.handle(StudioEvent::Generate("a cat".to_string()))?;
        studio.handle(StudioEvent::Generate("a dog".to_string()))?;
        studio.handle(StudioEvent::Regenerate())?;

        let (request, _) = generate_request(&mut rx)?;
        assert_eq!(request.prompt, "a cat");
        assert!(rx.try_recv().is_err());
        return Ok(());
    }
}

mod credentials {
    use super::*;

    #[test]
    fn it_detours_to_credential_entry() -> Result<()> {
        let dir = temp_data_dir();
        let (mut studio, mut rx) = studio(&dir);
        studio.handle(StudioEvent::Generate("a cat".to_string()))?;

        assert_eq!(studio.state(), GenerationState::AwaitingCredential);
        assert!(studio.is_credential_prompt_open());
        assert!(rx.try_recv().is_err());

        studio.handle(StudioEvent::CredentialProvided(" key-123 ".to_string()))?;

        let (request, credential) = generate_request(&mut rx)?;
        assert_eq!(request.prompt, "a cat");
        assert_eq!(credential, "key-123");
        assert!(rx.try_recv().is_err());
        assert_eq!(studio.state(), GenerationState::Submitting);
        assert!(!studio.is_credential_prompt_open());
        assert_eq!(studio.credentials().get(), Some("key-123".to_string()));
        return Ok(());
    }

    #[test]
    fn it_returns_to_idle_when_dismissed() -> Result<()> {
        let dir = temp_data_dir();
        let (mut studio, mut rx) = studio(&dir);
        studio.handle(StudioEvent::Generate("a cat".to_string()))?;
        studio.handle(StudioEvent::CredentialDismissed())?;

        assert_eq!(studio.state(), GenerationState::Idle);
        assert!(!studio.is_credential_prompt_open());

        studio.handle(StudioEvent::CredentialProvided("key".to_string()))?;
        assert!(rx.try_recv().is_err());
        return Ok(());
    }

    #[test]
    fn it_keeps_asking_on_empty_credentials() -> Result<()> {
        let dir = temp_data_dir();
        let (mut studio, mut rx) = studio(&dir);
        studio.handle(StudioEvent::Generate("a cat".to_string()))?;
        studio.handle(StudioEvent::CredentialProvided("   ".to_string()))?;

        assert_eq!(studio.state(), GenerationState::AwaitingCredential);
        assert_eq!(error_count(&studio), 1);
        assert!(rx.try_recv().is_err());
        return Ok(());
    }

    #[test]
    fn it_edits_credentials_outside_of_a_generation() -> Result<()> {
        let dir = temp_data_dir();
        let (mut studio, mut rx) = studio(&dir);
        studio.handle(StudioEvent::CredentialEditRequested())?;
        assert!(studio.is_credential_prompt_open());

        studio.handle(StudioEvent::CredentialProvided("key".to_string()))?;
        assert!(!studio.is_credential_prompt_open());
        assert_eq!(studio.state(), GenerationState::Idle);
        assert!(rx.try_recv().is_err());
        return Ok(());
    }
}

mod outcomes {
    use super::*;

    #[test]
    fn it_records_successful_generations() -> Result<()> {
        let dir = temp_data_dir();
        let (mut studio, mut rx) = studio_with_credential(&dir);
        studio.handle(StudioEvent::Generate("a cat".to_string()))?;
        let (request, _) = generate_request(&mut rx)?;

        studio.handle(StudioEvent::GenerationSucceeded(
            request,
            GeneratedImage::new(Some("abc".to_string()), "https://x/y.jpg"),
        ))?;

        let entries = studio.history().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "abc");
        assert_eq!(entries[0].url, "https://x/y.jpg");
        assert_eq!(entries[0].prompt, "a cat");
        assert_eq!(entries[0].model_id, "nano-banana");
        assert_eq!(entries[0].aspect_ratio, "1:1");

        assert_eq!(studio.state(), GenerationState::Succeeded);
        assert_eq!(*studio.control(), GenerateControl::Ready);
        assert_eq!(studio.current().unwrap().id, "abc");
        assert_eq!(
            studio.notifications().list().last().unwrap().kind,
            NotificationKind::Success
        );
        return Ok(());
    }

    #[test]
    fn it_leaves_history_unchanged_on_failure() -> Result<()> {
        let dir = temp_data_dir();
        let (mut studio, mut rx) = studio_with_credential(&dir);
        studio.handle(StudioEvent::Generate("a cat".to_string()))?;
        let (request, _) = generate_request(&mut rx)?;

        studio.handle(StudioEvent::GenerationFailed(
            request,
            "Invalid API key".to_string(),
        ))?;

        assert!(studio.history().is_empty());
        assert_eq!(error_count(&studio), 1);
        assert_eq!(studio.state(), GenerationState::Failed);
        assert_eq!(studio.control().label(), "Error: Invalid API key");
        assert!(studio.current().is_none());
        return Ok(());
    }

    #[test]
    fn it_treats_missing_urls_as_failures() -> Result<()> {
        let dir = temp_data_dir();
        let (mut studio, mut rx) = studio_with_credential(&dir);
        studio.handle(StudioEvent::Generate("a cat".to_string()))?;
        let (request, _) = generate_request(&mut rx)?;

        studio.handle(StudioEvent::GenerationSucceeded(
            request,
            GeneratedImage::new(Some("abc".to_string()), " "),
        ))?;

        assert!(studio.history().is_empty());
        assert_eq!(error_count(&studio), 1);
        assert_eq!(studio.state(), GenerationState::Failed);
        return Ok(());
    }

    #[test]
    fn it_restores_the_control_after_the_recovery_delay() -> Result<()> {
        let dir = temp_data_dir();
        let (mut studio, mut rx) = studio_with_credential(&dir);
        studio.handle(StudioEvent::Generate("a cat".to_string()))?;
        let (request, _) = generate_request(&mut rx)?;
        studio.handle(StudioEvent::GenerationFailed(request, "boom".to_string()))?;

        studio.handle(StudioEvent::Tick(Instant::now()))?;
        assert_eq!(studio.control().label(), "Error: boom");

        studio.handle(StudioEvent::Tick(
            Instant::now() + Duration::from_millis(3001),
        ))?;
        assert_eq!(*studio.control(), GenerateControl::Ready);
        assert!(studio.notifications().list().is_empty());
        return Ok(());
    }

    #[test]
    fn it_regenerates_the_last_request() -> Result<()> {
        let dir = temp_data_dir();
        let (mut studio, mut rx) = studio_with_credential(&dir);
        studio.handle(StudioEvent::Regenerate())?;
        assert!(rx.try_recv().is_err());

        studio.handle(StudioEvent::Generate("a cat".to_string()))?;
        let (first, _) = generate_request(&mut rx)?;
        studio.handle(StudioEvent::GenerationFailed(first.clone(), "boom".to_string()))?;
        studio.handle(StudioEvent::ModelSelected("flux-dev".to_string()))?;
        studio.handle(StudioEvent::Regenerate())?;

        let (second, _) = generate_request(&mut rx)?;
        assert_eq!(first, second);
        return Ok(());
    }
    #[test]
    fn it_shows_notices_reported_by_workers() -> Result<()> {
        let dir = temp_data_dir();
        let (mut studio, _rx) = studio(&dir);

        studio.handle(StudioEvent::Notify(
            "Saved image to /tmp/genstudio-abc.jpg".to_string(),
            NotificationKind::Success,
        ))?;
        studio.handle(StudioEvent::NotificationDismissed())?;
        studio.handle(StudioEvent::Notify(
            "Prompt copied to clipboard.".to_string(),
            NotificationKind::Success,
        ))?;

        let notices = studio.notifications().list();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, "Prompt copied to clipboard.");
        return Ok(());
    }
}

mod selection {
    use super::*;

    #[test]
    fn it_switches_models() -> Result<()> {
        let dir = temp_data_dir();
        let (mut studio, _rx) = studio(&dir);
        assert_eq!(studio.selection().aspect_ratio, "1:1");

        studio.handle(StudioEvent::ModelSelected("flux-dev".to_string()))?;
        assert_eq!(studio.selection().model_id, "flux-dev");
        assert_eq!(studio.selection().aspect_ratio, "1:1");
        assert!(!studio.selection().resolution_visible);

        studio.handle(StudioEvent::ModelSelected("missing".to_string()))?;
        assert_eq!(studio.selection().model_id, "flux-dev");
        return Ok(());
    }
}

mod history {
    use super::*;

    fn with_entry(dir: &TempDir) -> Result<(Studio, mpsc::UnboundedReceiver<Action>)> {
        let (mut studio, mut rx) = studio_with_credential(dir);
        studio.handle(StudioEvent::Generate("a cat".to_string()))?;
        let (request, _) = generate_request(&mut rx)?;
        studio.handle(StudioEvent::GenerationSucceeded(
            request,
            GeneratedImage::new(Some("abc".to_string()), "https://x/y.jpg"),
        ))?;

        return Ok((studio, rx));
    }

    #[test]
    fn it_requires_confirmation_to_clear() -> Result<()> {
        let dir = temp_data_dir();
        let (mut studio, _rx) = with_entry(&dir)?;

        studio.handle(StudioEvent::HistoryClearConfirmed())?;
        assert_eq!(studio.history().len(), 1);

        studio.handle(StudioEvent::HistoryClearRequested())?;
        assert!(studio.is_confirming_clear());
        studio.handle(StudioEvent::HistoryClearCancelled())?;
        studio.handle(StudioEvent::HistoryClearConfirmed())?;
        assert_eq!(studio.history().len(), 1);

        studio.handle(StudioEvent::HistoryClearRequested())?;
        studio.handle(StudioEvent::HistoryClearConfirmed())?;
        assert!(studio.history().is_empty());
        assert!(!studio.is_confirming_clear());
        return Ok(());
    }

    #[test]
    fn it_remixes_without_submitting() -> Result<()> {
        let dir = temp_data_dir();
        let (mut studio, mut rx) = with_entry(&dir)?;
        studio.handle(StudioEvent::HistoryRemix(0))?;

        assert_eq!(studio.take_prompt_fill(), Some("a cat".to_string()));
        assert_eq!(studio.take_prompt_fill(), None);
        assert!(rx.try_recv().is_err());
        return Ok(());
    }

    #[test]
    fn it_dispatches_entry_actions() -> Result<()> {
        let dir = temp_data_dir();
        let (mut studio, mut rx) = with_entry(&dir)?;
        studio.handle(StudioEvent::HistoryCopyPrompt(0))?;
        studio.handle(StudioEvent::HistoryDownload(0))?;
        studio.handle(StudioEvent::HistoryDownload(5))?;

        match rx.try_recv()? {
            Action::CopyToClipboard(text) => assert_eq!(text, "a cat"),
            _ => bail!("Wrong enum"),
        }
        match rx.try_recv()? {
            Action::DownloadImage(result) => assert_eq!(result.id, "abc"),
            _ => bail!("Wrong enum"),
        }
        assert!(rx.try_recv().is_err());
        return Ok(());
    }

    #[test]
    fn it_reselects_entries() -> Result<()> {
        let dir = temp_data_dir();
        let (mut studio, mut rx) = with_entry(&dir)?;
        studio.handle(StudioEvent::Generate("a dog".to_string()))?;
        let (request, _) = generate_request(&mut rx)?;
        studio.handle(StudioEvent::GenerationSucceeded(
            request,
            GeneratedImage::new(Some("def".to_string()), "https://x/z.jpg"),
        ))?;
        assert_eq!(studio.current().unwrap().id, "def");

        studio.handle(StudioEvent::HistorySelected(1))?;
        assert_eq!(studio.current().unwrap().id, "abc");
        return Ok(());
    }
}

mod remix {
    use super::*;

    #[test]
    fn it_consumes_the_remix_payload_on_load() -> Result<()> {
        let dir = temp_data_dir();
        let storage = LocalStorage::new(dir.path().to_path_buf());
        let payload = RemixPayload {
            prompt: "a fox".to_string(),
            model_id: Some("seedream-4".to_string()),
            aspect_ratio: Some("1:1".to_string()),
        };
        storage.set(StorageKey::Remix, &serde_json::to_string(&payload)?)?;

        let (mut studio, _rx) = studio(&dir);
        assert_eq!(studio.take_prompt_fill(), Some("a fox".to_string()));
        assert_eq!(studio.selection().model_id, "seedream-4");
        assert_eq!(studio.selection().aspect_ratio, "1:1");
        assert_eq!(storage.get(StorageKey::Remix), None);
        return Ok(());
    }

    #[test]
    fn it_discards_corrupt_remix_payloads() -> Result<()> {
        let dir = temp_data_dir();
        let storage = LocalStorage::new(dir.path().to_path_buf());
        storage.set(StorageKey::Remix, "nope")?;

        let (mut studio, _rx) = studio(&dir);
        assert_eq!(studio.take_prompt_fill(), None);
        assert_eq!(storage.get(StorageKey::Remix), None);
        return Ok(());
    }
}
