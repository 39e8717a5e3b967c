use anyhow::Context;

use crate::api::DownloadedImage;
use crate::state::ClientState;

pub async fn fetch(state: &ClientState, url: &str) -> anyhow::Result<()> {
    let data = state
        .images
        .try_load(url)
        .await
        .with_context(|| format!("Could not load image from {url}"))?;

    let image = DownloadedImage::from_bytes(url, data)?;
    println!("{:?} image, {} bytes", image.format, image.cost());
    Ok(())
}
