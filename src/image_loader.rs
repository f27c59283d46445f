//! # Image Loading
//!
//! Signature uploads arrive as data URIs read by the browser's file picker.
//! The editor only needs their intrinsic size (to lay the overlay out and to
//! clamp its drag) and the data URI itself (to render it), so nothing is
//! decoded past the header unless the format has to be sniffed.

use std::io::Cursor;

use crate::error::PagewrightError;

/// An image whose dimensions are known, ready to place on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    /// `data:image/...;base64,...`, normalized so it can be rendered as-is.
    pub data_uri: String,
    pub format: ImageFormat,
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

impl LoadedImage {
    /// Display size when rendered `display_width` wide, aspect kept.
    pub fn scaled_to_width(&self, display_width: f64) -> (f64, f64) {
        if self.width_px == 0 {
            return (display_width, 0.0);
        }
        let ratio = self.height_px as f64 / self.width_px as f64;
        (display_width, display_width * ratio)
    }
}

/// Load an image from a data URI or a raw base64 string.
pub fn load_image(src: &str) -> Result<LoadedImage, PagewrightError> {
    let bytes = decode_base64_source(src).map_err(PagewrightError::ImageError)?;
    let format = sniff_format(&bytes).ok_or_else(|| {
        PagewrightError::ImageError("Unsupported image format (expected JPEG or PNG)".to_string())
    })?;

    let reader = image::io::Reader::new(Cursor::new(&bytes))
        .with_guessed_format()
        .map_err(|e| PagewrightError::ImageError(format!("format detection error: {}", e)))?;
    let (width_px, height_px) = reader
        .into_dimensions()
        .map_err(|e| PagewrightError::ImageError(format!("failed to read dimensions: {}", e)))?;

    let data_uri = if src.starts_with("data:") {
        src.to_string()
    } else {
        format!("data:{};base64,{}", format.mime(), src.trim())
    };

    Ok(LoadedImage {
        data_uri,
        format,
        width_px,
        height_px,
    })
}

/// Resolve a data URI or bare base64 string to raw bytes.
pub fn decode_base64_source(src: &str) -> Result<Vec<u8>, String> {
    let payload = if src.starts_with("data:") {
        let comma = src
            .find(',')
            .ok_or_else(|| "Invalid data URI: missing comma".to_string())?;
        if !src[..comma].ends_with(";base64") {
            return Err("Invalid data URI: only base64 payloads are supported".to_string());
        }
        &src[comma + 1..]
    } else {
        src
    };
    base64_decode(payload.trim())
}

fn base64_decode(input: &str) -> Result<Vec<u8>, String> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input)
        .map_err(|e| format!("Base64 decode error: {}", e))
}

fn sniff_format(data: &[u8]) -> Option<ImageFormat> {
    if data.len() >= 4 && data[..4] == [0x89, 0x50, 0x4E, 0x47] {
        Some(ImageFormat::Png)
    } else if data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8 {
        Some(ImageFormat::Jpeg)
    } else {
        None
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use base64::Engine;

    /// A `w × h` opaque PNG as base64.
    pub(crate) fn png_base64(w: u32, h: u32) -> String {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([20, 20, 20, 255]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, image::ImageOutputFormat::Png)
            .unwrap();
        base64::engine::general_purpose::STANDARD.encode(buf.into_inner())
    }

    #[test]
    fn data_uri_png_dimensions() {
        let uri = format!("data:image/png;base64,{}", png_base64(40, 10));
        let img = load_image(&uri).unwrap();
        assert_eq!((img.width_px, img.height_px), (40, 10));
        assert_eq!(img.format, ImageFormat::Png);
        assert_eq!(img.data_uri, uri);
    }

    #[test]
    fn raw_base64_gets_a_data_uri() {
        let img = load_image(&png_base64(2, 2)).unwrap();
        assert!(img.data_uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn scaling_keeps_aspect() {
        let img = load_image(&png_base64(300, 100)).unwrap();
        let (w, h) = img.scaled_to_width(150.0);
        assert_eq!(w, 150.0);
        assert!((h - 50.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_images() {
        let text = base64::engine::general_purpose::STANDARD.encode(b"hello world");
        assert!(matches!(load_image(&text), Err(PagewrightError::ImageError(_))));
        assert!(load_image("data:image/png;base64").is_err());
        assert!(load_image("!!!not base64!!!").is_err());
    }
}
