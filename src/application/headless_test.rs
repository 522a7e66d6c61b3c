use std::sync::Mutex;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;
use test_utils::catalog_fixture;
use test_utils::temp_data_dir;
use tokio::sync::mpsc;

use super::run;
use crate::domain::models::Action;
use crate::domain::models::Catalog;
use crate::domain::models::GeneratedImage;
use crate::domain::models::GenerationRequest;
use crate::domain::models::Generator;
use crate::domain::models::StudioEvent;
use crate::domain::services::CredentialStore;
use crate::domain::services::LocalStorage;
use crate::domain::services::Studio;
use crate::domain::services::StudioOptions;

struct FakeGenerator {
    error: Option<String>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl FakeGenerator {
    fn new(error: Option<&str>) -> FakeGenerator {
        return FakeGenerator {
            error: error.map(|e| return e.to_string()),
            requests: Mutex::new(vec![]),
        };
    }

    fn requests(&self) -> Vec<GenerationRequest> {
        return self.requests.lock().unwrap().clone();
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    async fn generate_image(
        &self,
        request: &GenerationRequest,
        credential: &str,
    ) -> Result<GeneratedImage> {
        assert_eq!(credential, "secret");
        self.requests.lock().unwrap().push(request.clone());

        if let Some(error) = &self.error {
            bail!(error.to_string());
        }
        return Ok(GeneratedImage::new(
            Some("abc".to_string()),
            "https://x/y.jpg",
        ));
    }
}

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

fn save_credential(dir: &TempDir) {
    CredentialStore::new(LocalStorage::new(dir.path().to_path_buf()))
        .set("secret")
        .unwrap();
}

fn no_prompt() -> Result<String> {
    panic!("credential should not be asked for");
}

#[tokio::test]
async fn it_generates_and_records_history() -> Result<()> {
    let dir = temp_data_dir();
    save_credential(&dir);
    let (mut studio, mut rx) = studio(&dir);
    let generator = FakeGenerator::new(None);

    let result = run(&mut studio, &generator, &mut rx, " a cat ", None, no_prompt).await?;

    assert_eq!(result.id, "abc");
    assert_eq!(result.url, "https://x/y.jpg");
    assert_eq!(result.prompt, "a cat");
    assert_eq!(result.model_id, "nano-banana");
    assert_eq!(result.aspect_ratio, "1:1");
    assert_eq!(studio.history().len(), 1);
    assert_eq!(generator.requests().len(), 1);
    return Ok(());
}

#[tokio::test]
async fn it_asks_for_a_missing_credential() -> Result<()> {
    let dir = temp_data_dir();
    let (mut studio, mut rx) = studio(&dir);
    let generator = FakeGenerator::new(None);

    run(&mut studio, &generator, &mut rx, "a cat", None, || {
        return Ok("secret".to_string());
    })
    .await?;

    assert_eq!(studio.credentials().get(), Some("secret".to_string()));
    assert_eq!(generator.requests().len(), 1);
    return Ok(());
}

#[tokio::test]
async fn it_rejects_an_empty_credential() -> Result<()> {
    let dir = temp_data_dir();
    let (mut studio, mut rx) = studio(&dir);
    let generator = FakeGenerator::new(None);

    let err = run(&mut studio, &generator, &mut rx, "a cat", None, || {
        return Ok("   ".to_string());
    })
    .await
    .unwrap_err();

    insta::assert_snapshot!(err.to_string(), @"API key cannot be empty");
    assert!(generator.requests().is_empty());
    return Ok(());
}

#[tokio::test]
async fn it_reports_remote_failures() -> Result<()> {
    let dir = temp_data_dir();
    save_credential(&dir);
    let (mut studio, mut rx) = studio(&dir);
    let generator = FakeGenerator::new(Some("Insufficient credits"));

    let err = run(&mut studio, &generator, &mut rx, "a cat", None, no_prompt)
        .await
        .unwrap_err();

    insta::assert_snapshot!(err.to_string(), @"Generation failed: Insufficient credits");
    assert!(studio.history().is_empty());
    return Ok(());
}

#[tokio::test]
async fn it_rejects_empty_prompts() -> Result<()> {
    let dir = temp_data_dir();
    save_credential(&dir);
    let (mut studio, mut rx) = studio(&dir);
    let generator = FakeGenerator::new(None);

    let err = run(&mut studio, &generator, &mut rx, "  \n ", None, no_prompt)
        .await
        .unwrap_err();

    insta::assert_snapshot!(err.to_string(), @"Prompt cannot be empty");
    assert!(generator.requests().is_empty());
    return Ok(());
}

#[tokio::test]
async fn it_sends_a_chosen_resolution() -> Result<()> {
    let dir = temp_data_dir();
    save_credential(&dir);
    let (mut studio, mut rx) = studio(&dir);
    studio.handle(StudioEvent::ModelSelected("seedream-4".to_string()))?;
    let generator = FakeGenerator::new(None);

    run(&mut studio, &generator, &mut rx, "a cat", Some("4k"), no_prompt).await?;

    let requests = generator.requests();
    assert_eq!(requests[0].model_id, "seedream-4");
    assert_eq!(requests[0].aspect_ratio, "16:9");
    assert_eq!(requests[0].resolution, Some("4K".to_string()));
    return Ok(());
}

#[tokio::test]
async fn it_rejects_resolutions_the_model_does_not_offer() -> Result<()> {
    let dir = temp_data_dir();
    save_credential(&dir);
    let (mut studio, mut rx) = studio(&dir);
    let generator = FakeGenerator::new(None);

    let err = run(&mut studio, &generator, &mut rx, "a cat", Some("4k"), no_prompt)
        .await
        .unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"Model 'nano-banana' does not support choosing a resolution");

    studio.handle(StudioEvent::ModelSelected("seedream-4".to_string()))?;
    let err = run(&mut studio, &generator, &mut rx, "a cat", Some("8k"), no_prompt)
        .await
        .unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"Unsupported resolution '8k', expected one of: 2K, 4K");

    assert!(generator.requests().is_empty());
    return Ok(());
}
