use anyhow::Result;
use image::{DynamicImage, Luma};
use qrcode::QrCode;
use std::io::Cursor;

/// Render arbitrary data (the otpauth provisioning URI) as a PNG QR code.
pub fn render_png(data: &str) -> Result<Vec<u8>> {
    let code = QrCode::new(data)?;
    let image = code.render::<Luma<u8>>().build();

    let dynamic_image = DynamicImage::ImageLuma8(image);
    let mut buffer = Cursor::new(Vec::new());
    dynamic_image.write_to(&mut buffer, image::ImageOutputFormat::Png)?;

    Ok(buffer.into_inner())
}
