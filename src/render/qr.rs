//! Terminal QR codes for rendered configs, for scanning into mobile clients.

use qrcode::render::unicode::Dense1x2;
use qrcode::{EcLevel, QrCode};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QrError {
    #[error("config does not fit in a QR code: {0}")]
    Encode(String),
}

/// Render `text` as a QR code drawn with half-block characters.
///
/// Colours are inverted so the code scans on dark terminal backgrounds.
pub fn render_qr(text: &str) -> Result<String, QrError> {
    let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::L)
        .map_err(|e| QrError::Encode(e.to_string()))?;
    Ok(code
        .render::<Dense1x2>()
        .dark_color(Dense1x2::Light)
        .light_color(Dense1x2::Dark)
        .quiet_zone(true)
        .build())
}
