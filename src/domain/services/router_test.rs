use anyhow::Result;

use super::Router;
use crate::domain::models::PageContext;
use crate::domain::models::PageName;

#[test]
fn it_mounts_only_the_landing_page_up_front() {
    let router = Router::new(PageName::Image);

    assert_eq!(router.active(), PageName::Image);
    assert!(router.is_mounted(PageName::Image));
    assert!(!router.is_mounted(PageName::Video));
    assert!(!router.is_mounted(PageName::Settings));
}

#[test]
fn it_mounts_pages_on_first_visit() -> Result<()> {
    let mut router = Router::new(PageName::Image);
    let name = router.navigate("video", None)?;

    assert_eq!(name, PageName::Video);
    assert_eq!(router.active(), PageName::Video);
    assert!(router.is_mounted(PageName::Video));
    assert_eq!(
        router.page().unwrap().body[0],
        "Video generation is coming soon."
    );
    return Ok(());
}

#[test]
fn it_rejects_unknown_pages() {
    let mut router = Router::new(PageName::Image);
    let err = router.navigate("gallery", None).unwrap_err();

    insta::assert_snapshot!(err.to_string(), @"No page named gallery");
    assert_eq!(router.active(), PageName::Image);
}

#[test]
fn it_hands_out_context_once() -> Result<()> {
    let mut router = Router::new(PageName::Settings);
    router.navigate("image", Some(PageContext::Prompt("a cat".to_string())))?;

    assert_eq!(
        router.take_context(),
        Some(PageContext::Prompt("a cat".to_string()))
    );
    assert_eq!(router.take_context(), None);
    return Ok(());
}
