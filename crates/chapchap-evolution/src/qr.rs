//! QR code rendering for the terminal and on disk.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chapchap_core::{error::ChapchapError, types::QrCode};
use std::path::{Path, PathBuf};

/// Generate a compact QR code for terminal display using Unicode half-block characters.
///
/// The gateway's QR image is a PNG a terminal cannot show, so the raw `2@`
/// reference it encodes is re-rendered here. Two rows of modules go on each
/// line of text.
pub fn generate_qr_terminal(qr_data: &str) -> Result<String, ChapchapError> {
    use qrcode::{Color, EcLevel, QrCode};

    let code = QrCode::with_error_correction_level(qr_data.as_bytes(), EcLevel::L)
        .map_err(|e| ChapchapError::Render(format!("QR generation failed: {e}")))?;

    let width = code.width();
    let colors: Vec<Color> = code.into_colors();
    let is_dark = |row: usize, col: usize| -> bool {
        row < width && col < width && colors[row * width + col] == Color::Dark
    };

    let mut out = String::new();
    for row in (0..width).step_by(2) {
        for col in 0..width {
            out.push(match (is_dark(row, col), is_dark(row + 1, col)) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            });
        }
        out.push('\n');
    }

    Ok(out)
}

/// Generate a QR code as PNG image bytes, used for the on-disk copy when the
/// raw reference is known.
pub fn generate_qr_image(qr_data: &str) -> Result<Vec<u8>, ChapchapError> {
    use image::{ImageBuffer, Luma};
    use qrcode::{Color, EcLevel, QrCode};

    let code = QrCode::with_error_correction_level(qr_data.as_bytes(), EcLevel::L)
        .map_err(|e| ChapchapError::Render(format!("QR generation failed: {e}")))?;

    let module_size: u32 = 10;
    let quiet_zone: u32 = 2;
    let modules = code.width() as u32;
    let img_size = (modules + quiet_zone * 2) * module_size;

    let img = ImageBuffer::from_fn(img_size, img_size, |x, y| {
        let (cx, cy) = (x / module_size, y / module_size);
        if cx < quiet_zone || cy < quiet_zone {
            return Luma([255u8]);
        }
        let (mx, my) = (cx - quiet_zone, cy - quiet_zone);
        if mx >= modules || my >= modules {
            return Luma([255u8]);
        }
        match code[(mx as usize, my as usize)] {
            Color::Dark => Luma([0u8]),
            Color::Light => Luma([255u8]),
        }
    });

    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| ChapchapError::Render(format!("PNG encoding failed: {e}")))?;

    Ok(buf.into_inner())
}

/// Decode the image bytes of a `data:image/...;base64,` URI.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, ChapchapError> {
    let payload = match uri.split_once(";base64,") {
        Some((_, payload)) => payload,
        None if uri.starts_with("data:") => {
            return Err(ChapchapError::Render(
                "data URI is not base64 encoded".to_string(),
            ))
        }
        None => uri,
    };
    STANDARD
        .decode(payload.trim())
        .map_err(|e| ChapchapError::Render(format!("invalid base64 image: {e}")))
}

/// Write a QR code to `{dir}/{instance_name}.png`.
///
/// Prefers the raw payload (re-rendered crisply), falling back to the image
/// the gateway sent.
pub fn save_qr_png(dir: &Path, instance_name: &str, qr: &QrCode) -> Result<PathBuf, ChapchapError> {
    let bytes = match qr.raw.as_deref() {
        Some(raw) => generate_qr_image(raw)?,
        None => decode_data_uri(&qr.data_uri)?,
    };
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{instance_name}.png"));
    std::fs::write(&path, bytes)?;
    Ok(path)
}
