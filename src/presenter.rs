use crate::{
    error::{GenerationError, Result},
    models::ImageArtifact,
};
use base64::{engine::general_purpose, Engine};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;

pub const DOWNLOAD_FILE_NAME: &str = "generated.png";
pub const PNG_MIME: &str = "image/png";

/// Wraps an already decoded image, encoding it to PNG for download.
pub fn present(image: DynamicImage) -> Result<ImageArtifact> {
    let png = encode_png(&image)?;
    Ok(ImageArtifact { image, png })
}

/// Decodes encoded image bytes. PNG input is kept verbatim as the download
/// payload; anything else is re-encoded to PNG.
pub fn from_encoded(bytes: Vec<u8>) -> Result<ImageArtifact> {
    let image = image::load_from_memory(&bytes)
        .map_err(|e| GenerationError::UndecodableResponse(format!("invalid image data: {}", e)))?;

    match image::guess_format(&bytes) {
        Ok(ImageFormat::Png) => Ok(ImageArtifact { image, png: bytes }),
        Ok(format) => {
            log::debug!("Re-encoding {:?} image as PNG", format);
            present(image)
        }
        Err(_) => present(image),
    }
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| GenerationError::GenerationFailure(format!("PNG encoding failed: {}", e)))?;
    Ok(png)
}

/// `data:` URI for inline display.
pub fn data_uri(artifact: &ImageArtifact) -> String {
    format!(
        "data:{};base64,{}",
        PNG_MIME,
        general_purpose::STANDARD.encode(&artifact.png)
    )
}

pub fn save(artifact: &ImageArtifact, path: impl AsRef<Path>) -> Result<()> {
    std::fs::write(path.as_ref(), &artifact.png)?;
    log::info!(
        "💾 Image saved to: {} ({}x{}, {} bytes)",
        path.as_ref().display(),
        artifact.width(),
        artifact.height(),
        artifact.png.len()
    );
    Ok(())
}
