use anyhow::Result;
use mockito::Matcher;
use test_utils::catalog_fixture;

use super::ErrorResponse;
use super::ImageRequest;
use super::ImageResponse;
use super::RemoteGenerator;
use crate::domain::models::Catalog;
use crate::domain::models::GenerationRequest;
use crate::domain::models::Generator;

impl RemoteGenerator {
    fn with_url(url: String) -> Result<RemoteGenerator> {
        return Ok(RemoteGenerator {
            url,
            timeout: "1000".to_string(),
            catalog: Catalog::from_json(catalog_fixture())?,
        });
    }
}

fn request(model_id: &str, resolution: Option<&str>) -> GenerationRequest {
    return GenerationRequest {
        prompt: "a cat".to_string(),
        model_id: model_id.to_string(),
        aspect_ratio: "1:1".to_string(),
        resolution: resolution.map(|e| return e.to_string()),
    };
}

#[tokio::test]
async fn it_successfully_health_checks() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server.mock("GET", "/").with_status(404).create();

    let generator = RemoteGenerator::with_url(server.url())?;
    let res = generator.health_check().await;

    assert!(res.is_ok());
    mock.assert();
    return Ok(());
}

#[tokio::test]
async fn it_fails_health_checks() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server.mock("GET", "/").with_status(502).create();

    let generator = RemoteGenerator::with_url(server.url())?;
    let res = generator.health_check().await;

    assert!(res.is_err());
    mock.assert();
    return Ok(());
}

#[tokio::test]
async fn it_generates_images() -> Result<()> {
    let body = serde_json::to_string(&ImageResponse {
        id: Some("abc".to_string()),
        url: Some("https://x/y.jpg".to_string()),
    })?;

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/nano-banana")
        .match_header("x-api-key", "secret")
        .match_body(Matcher::Json(serde_json::to_value(ImageRequest {
            prompt: "a cat".to_string(),
            model: "nano-banana".to_string(),
            aspect_ratio: "1:1".to_string(),
            resolution: None,
        })?))
        .with_status(200)
        .with_body(body)
        .create();

    let generator = RemoteGenerator::with_url(server.url())?;
    let image = generator
        .generate_image(&request("nano-banana", None), "secret")
        .await?;
    mock.assert();

    assert_eq!(image.id, "abc");
    assert_eq!(image.url, "https://x/y.jpg");
    return Ok(());
}

#[tokio::test]
async fn it_posts_to_the_model_endpoint_with_resolution() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/bytedance-seedream-v4")
        .match_body(Matcher::PartialJsonString(
            r#"{"model":"seedream-4","resolution":"4k"}"#.to_string(),
        ))
        .with_status(201)
        .with_body(r#"{"url":"https://x/seedream.png"}"#)
        .create();

    let generator = RemoteGenerator::with_url(server.url())?;
    let image = generator
        .generate_image(&request("seedream-4", Some("4k")), "secret")
        .await?;
    mock.assert();

    assert_eq!(image.url, "https://x/seedream.png");
    assert!(!image.id.is_empty());
    return Ok(());
}

#[tokio::test]
async fn it_fails_without_an_image_url() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/nano-banana")
        .with_status(200)
        .with_body(r#"{"id":"abc","url":"  "}"#)
        .create();

    let generator = RemoteGenerator::with_url(server.url())?;
    let err = generator
        .generate_image(&request("nano-banana", None), "secret")
        .await
        .unwrap_err();
    mock.assert();

    insta::assert_snapshot!(err.to_string(), @"No image URL returned");
    return Ok(());
}

#[tokio::test]
async fn it_surfaces_remote_error_messages() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/nano-banana")
        .with_status(402)
        .with_body(r#"{"error":"Insufficient credits"}"#)
        .create();

    let generator = RemoteGenerator::with_url(server.url())?;
    let err = generator
        .generate_image(&request("nano-banana", None), "secret")
        .await
        .unwrap_err();
    mock.assert();

    insta::assert_snapshot!(err.to_string(), @"Insufficient credits");
    return Ok(());
}

#[tokio::test]
async fn it_falls_back_to_the_status_code() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/nano-banana")
        .with_status(500)
        .with_body("<html>oops</html>")
        .create();

    let generator = RemoteGenerator::with_url(server.url())?;
    let err = generator
        .generate_image(&request("nano-banana", None), "secret")
        .await
        .unwrap_err();
    mock.assert();

    insta::assert_snapshot!(err.to_string(), @"Request failed with status 500");
    return Ok(());
}

#[test]
fn it_picks_the_first_usable_error_field() {
    let res = ErrorResponse {
        error: Some(serde_json::Value::String(" ".to_string())),
        message: None,
        detail: Some(serde_json::json!([{"msg": "prompt too long"}])),
    };

    insta::assert_snapshot!(res.message().unwrap_or_default(), @r###"[{"msg":"prompt too long"}]"###);
}
