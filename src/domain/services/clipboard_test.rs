use anyhow::bail;
use anyhow::Result;
use tokio::sync::mpsc;
use tokio::sync::oneshot;

use super::serve;
use super::ClipboardRequest;

#[tokio::test]
async fn it_keeps_serving_after_a_failed_write() -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<ClipboardRequest>();
    let (first_tx, first_rx) = oneshot::channel();
    let (second_tx, second_rx) = oneshot::channel();
    tx.send(("a cat".to_string(), first_tx))?;
    tx.send(("a dog".to_string(), second_tx))?;
    drop(tx);

    let mut written = vec![];
    serve(&mut rx, |text| {
        if text == "a cat" {
            bail!("clipboard is locked");
        }
        written.push(text);
        return Ok(());
    })
    .await;

    let first = first_rx.await?;
    insta::assert_snapshot!(first.unwrap_err().to_string(), @"clipboard is locked");
    assert!(second_rx.await?.is_ok());
    assert_eq!(written, vec!["a dog".to_string()]);

    return Ok(());
}

