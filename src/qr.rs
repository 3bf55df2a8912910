//! QR code rendering for share links.

use std::io::Cursor;

use image::{ImageFormat, Luma};
use qrcode::QrCode;

use crate::{Result, ShareError};

/// Smallest edge of the rendered image in pixels.
const MIN_DIMENSION: u32 = 240;

/// Render `data` as a black-on-white QR code PNG.
pub fn render_png(data: &str) -> Result<Vec<u8>> {
    let code = QrCode::new(data.as_bytes())
        .map_err(|e| ShareError::BadRequest(format!("cannot encode QR code: {e}")))?;
    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(MIN_DIMENSION, MIN_DIMENSION)
        .build();

    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| ShareError::Io(std::io::Error::other(e.to_string())))?;
    Ok(buf.into_inner())
}
