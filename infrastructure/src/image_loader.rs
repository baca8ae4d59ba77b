use domain::models::ImageAttachment;
use image::ImageFormat;
use shared::error::AttachmentError;
use std::path::Path;
use tracing::debug;

/// Read and decode a PNG or JPEG screenshot from disk.
pub fn load_image(path: &Path) -> Result<ImageAttachment, AttachmentError> {
    let bytes = std::fs::read(path).map_err(|source| AttachmentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    decode_image(name, bytes)
}

/// Decode `bytes` to make sure they are a real raster image; the original
/// encoded bytes are what gets sent to the model.
pub fn decode_image(
    name: impl Into<String>,
    bytes: Vec<u8>,
) -> Result<ImageAttachment, AttachmentError> {
    let name = name.into();
    let mime_type = match image::guess_format(&bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        _ => return Err(AttachmentError::UnsupportedFormat { name }),
    };
    let format = if mime_type == "image/png" {
        ImageFormat::Png
    } else {
        ImageFormat::Jpeg
    };
    let decoded = image::load_from_memory_with_format(&bytes, format).map_err(|e| {
        AttachmentError::Decode {
            name: name.clone(),
            reason: e.to_string(),
        }
    })?;
    debug!(
        image = %name,
        width = decoded.width(),
        height = decoded.height(),
        "screenshot decoded"
    );
    Ok(ImageAttachment {
        name,
        mime_type: mime_type.to_string(),
        width: decoded.width(),
        height: decoded.height(),
        bytes,
    })
}
