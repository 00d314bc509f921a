//! # Icon Loading
//!
//! Resolves icon references and reports the size an icon occupies in a
//! legend row. Pixels are never kept: the layout only needs dimensions.
//!
//! Supported references, tried in order:
//! - a name registered with [`IconLoader::register`]
//! - `data:` URIs, base64 (`;base64,`) or percent-encoded payloads
//! - `file://` URIs
//! - file paths (absolute or relative)
//!
//! PNG and JPEG are sized from their headers through `image`; SVG is sized
//! from the root element's `width`/`height` or `viewBox`.

use std::collections::HashMap;
use std::io::Cursor;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;

use crate::error::LegendError;
use crate::model::Color;

/// Fallback side length of a swatch when the icon box is unbounded.
const DEFAULT_SWATCH_SIZE: f64 = 10.0;

/// The box an icon is fitted into. Either side may be infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IconBox {
    pub max_width: f64,
    pub max_height: f64,
}

impl IconBox {
    pub fn unbounded() -> Self {
        Self {
            max_width: f64::INFINITY,
            max_height: f64::INFINITY,
        }
    }

    /// Factor that shrinks (or grows) `width`×`height` to touch the box.
    /// `None` when the box is unbounded on both sides.
    fn fit_factor(&self, width: f64, height: f64) -> Option<f64> {
        let kw = if self.max_width.is_finite() && width > 0.0 {
            Some(self.max_width / width)
        } else {
            None
        };
        let kh = if self.max_height.is_finite() && height > 0.0 {
            Some(self.max_height / height)
        } else {
            None
        };
        match (kw, kh) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IconKind {
    Raster,
    Vector,
    Swatch { color: Color },
}

/// A decoded icon, sized for the legend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IconImage {
    pub width: f64,
    pub height: f64,
    pub kind: IconKind,
}

/// A solid rectangle filling the icon box.
pub fn swatch(color: &str, target: IconBox) -> Result<IconImage, LegendError> {
    let color = Color::parse(color)?;
    let side = |v: f64| if v.is_finite() { v } else { DEFAULT_SWATCH_SIZE };
    Ok(IconImage {
        width: side(target.max_width),
        height: side(target.max_height),
        kind: IconKind::Swatch { color },
    })
}

/// Loads icon bytes and sizes them.
#[derive(Debug, Default)]
pub struct IconLoader {
    registry: HashMap<String, Vec<u8>>,
}

impl IconLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `bytes` available under `name`, ahead of any URI resolution.
    pub fn register(&mut self, name: &str, bytes: Vec<u8>) {
        self.registry.insert(name.to_string(), bytes);
    }

    /// Resolve `src` and size it for `target` at `scale`.
    ///
    /// Raster icons keep their pixel size times `scale`, shrunk to fit the
    /// box. Vector icons are fitted to the box first, then scaled.
    pub fn decode(&self, src: &str, target: IconBox, scale: f64) -> Result<IconImage, LegendError> {
        let bytes = self.read_source_bytes(src)?;
        if is_png(&bytes) || is_jpeg(&bytes) {
            let (w, h) = raster_dimensions(&bytes).map_err(|e| LegendError::broken_icon(src, e))?;
            let (w, h) = (w as f64 * scale, h as f64 * scale);
            let k = target.fit_factor(w, h).map_or(1.0, |k| k.min(1.0));
            return Ok(IconImage {
                width: w * k,
                height: h * k,
                kind: IconKind::Raster,
            });
        }
        if looks_like_svg(&bytes) {
            let (w, h) = svg_dimensions(&bytes).map_err(|e| LegendError::broken_icon(src, e))?;
            let k = target.fit_factor(w, h).unwrap_or(1.0) * scale;
            return Ok(IconImage {
                width: w * k,
                height: h * k,
                kind: IconKind::Vector,
            });
        }
        Err(LegendError::broken_icon(
            src,
            "unsupported image format (expected PNG, JPEG or SVG)",
        ))
    }

    /// Resolve the source string to raw image bytes.
    fn read_source_bytes(&self, src: &str) -> Result<Vec<u8>, LegendError> {
        if let Some(bytes) = self.registry.get(src) {
            return Ok(bytes.clone());
        }

        // data:image/png;base64,iVBOR...
        if let Some(rest) = src.strip_prefix("data:") {
            let comma_pos = rest
                .find(',')
                .ok_or_else(|| LegendError::broken_icon(src, "invalid data URI: missing comma"))?;
            let (meta, payload) = (&rest[..comma_pos], &rest[comma_pos + 1..]);
            if meta.ends_with(";base64") {
                use base64::Engine;
                return base64::engine::general_purpose::STANDARD
                    .decode(payload.trim())
                    .map_err(|e| LegendError::broken_icon(src, format!("base64 decode error: {}", e)));
            }
            return Ok(percent_decode(payload));
        }

        let path = if src.starts_with("file:") {
            url::Url::parse(src)
                .ok()
                .and_then(|u| u.to_file_path().ok())
                .ok_or_else(|| LegendError::broken_icon(src, "invalid file URI"))?
        } else {
            std::path::PathBuf::from(src)
        };
        std::fs::read(&path).map_err(|e| LegendError::broken_icon(src, e.to_string()))
    }
}

/// Undo `%XX` escapes in a plain data URI payload. Malformed escapes are
/// kept as written.
fn percent_decode(payload: &str) -> Vec<u8> {
    let bytes = payload.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let hex = bytes.get(i + 1..i + 3).filter(|h| h.iter().all(u8::is_ascii_hexdigit));
        if let (b'%', Some(hex)) = (bytes[i], hex) {
            let escaped = std::str::from_utf8(hex)
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(v) = escaped {
                out.push(v);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47
}

fn looks_like_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(1024)];
    String::from_utf8_lossy(head).contains("<svg")
}

/// Pixel dimensions from the image header, without decoding pixels.
fn raster_dimensions(data: &[u8]) -> Result<(u32, u32), String> {
    let reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("format detection error: {}", e))?;
    reader
        .into_dimensions()
        .map_err(|e| format!("failed to read dimensions: {}", e))
}

/// Parse a viewBox attribute value: "min-x min-y width height".
fn parse_view_box(s: &str) -> Option<(f64, f64)> {
    let parts: Vec<f64> = s
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|p| !p.is_empty())
        .filter_map(|p| p.parse::<f64>().ok())
        .collect();
    match parts.as_slice() {
        [_, _, w, h] if *w > 0.0 && *h > 0.0 => Some((*w, *h)),
        _ => None,
    }
}

/// Parse a length such as `24`, `24px` or `18pt`. Percentages are ignored.
fn parse_length(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.ends_with('%') {
        return None;
    }
    let number = s.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    number.parse::<f64>().ok().filter(|v| *v > 0.0)
}

fn get_attr(e: &quick_xml::events::BytesStart, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name.as_bytes() {
            return String::from_utf8(attr.value.to_vec()).ok();
        }
    }
    None
}

/// Intrinsic size of an SVG document from its root element.
fn svg_dimensions(data: &[u8]) -> Result<(f64, f64), String> {
    let content = std::str::from_utf8(data).map_err(|e| format!("SVG is not UTF-8: {}", e))?;
    let mut reader = Reader::from_str(content);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() != b"svg" {
                    return Err("root element is not <svg>".to_string());
                }
                let width = get_attr(&e, "width").and_then(|v| parse_length(&v));
                let height = get_attr(&e, "height").and_then(|v| parse_length(&v));
                let view_box = get_attr(&e, "viewBox").and_then(|v| parse_view_box(&v));
                return match (width, height, view_box) {
                    (Some(w), Some(h), _) => Ok((w, h)),
                    (Some(w), None, Some((vw, vh))) => Ok((w, w * vh / vw)),
                    (None, Some(h), Some((vw, vh))) => Ok((h * vw / vh, h)),
                    (None, None, Some(size)) => Ok(size),
                    _ => Err("SVG has neither width/height nor viewBox".to_string()),
                };
            }
            Ok(Event::Eof) => return Err("no <svg> element found".to_string()),
            Err(e) => return Err(format!("XML error: {}", e)),
            _ => {}
        }
        buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::new(w, h);
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), w, h, image::ColorType::Rgba8)
            .unwrap();
        buf
    }

    fn jpeg_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbImage::new(w, h);
        let mut buf = Vec::new();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new(&mut buf);
        encoder
            .encode(img.as_raw(), w, h, image::ColorType::Rgb8)
            .unwrap();
        buf
    }

    #[test]
    fn test_magic_bytes() {
        assert!(is_jpeg(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(!is_jpeg(&[0x89, 0x50, 0x4E, 0x47]));
        assert!(is_png(&[0x89, 0x50, 0x4E, 0x47]));
        assert!(!is_png(&[0x89, 0x50]));
    }

    #[test]
    fn test_registered_png_keeps_pixel_size() {
        let mut loader = IconLoader::new();
        loader.register("road.png", png_bytes(12, 6));
        let icon = loader
            .decode("road.png", IconBox::unbounded(), 1.0)
            .unwrap();
        assert_eq!((icon.width, icon.height), (12.0, 6.0));
        assert_eq!(icon.kind, IconKind::Raster);
    }

    #[test]
    fn test_raster_is_scaled_then_shrunk_to_box() {
        let mut loader = IconLoader::new();
        loader.register("a", png_bytes(20, 10));
        let target = IconBox {
            max_width: f64::INFINITY,
            max_height: 8.0,
        };
        let icon = loader.decode("a", target, 0.5).unwrap();
        assert_eq!((icon.width, icon.height), (10.0, 5.0));
        let icon = loader.decode("a", target, 1.0).unwrap();
        assert_eq!((icon.width, icon.height), (16.0, 8.0));
    }

    #[test]
    fn test_jpeg_data_uri() {
        use base64::Engine;
        let b64 = base64::engine::general_purpose::STANDARD.encode(jpeg_bytes(4, 3));
        let src = format!("data:image/jpeg;base64,{}", b64);
        let icon = IconLoader::new()
            .decode(&src, IconBox::unbounded(), 2.0)
            .unwrap();
        assert_eq!((icon.width, icon.height), (8.0, 6.0));
    }

    #[test]
    fn test_percent_encoded_svg_data_uri() {
        let src = "data:image/svg+xml,%3Csvg%20width=%2212%22%20height=%226%22%3E%3C/svg%3E";
        let icon = IconLoader::new()
            .decode(src, IconBox::unbounded(), 1.0)
            .unwrap();
        assert_eq!((icon.width, icon.height), (12.0, 6.0));
        assert_eq!(percent_decode("100%"), b"100%".to_vec());
        assert_eq!(percent_decode("%+1%4"), b"%+1%4".to_vec());
        assert_eq!(percent_decode("%4a%41"), b"JA".to_vec());
    }

    #[test]
    fn test_svg_is_fitted_to_box() {
        let src = r#"data:image/svg+xml;utf8,<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 40 20"></svg>"#;
        let target = IconBox {
            max_width: 10.0,
            max_height: 8.0,
        };
        let icon = IconLoader::new().decode(src, target, 1.0).unwrap();
        assert_eq!((icon.width, icon.height), (10.0, 5.0));
        assert_eq!(icon.kind, IconKind::Vector);
        let icon = IconLoader::new().decode(src, target, 0.5).unwrap();
        assert_eq!((icon.width, icon.height), (5.0, 2.5));
    }

    #[test]
    fn test_svg_dimensions() {
        assert_eq!(
            svg_dimensions(br#"<svg width="24px" height="12"/>"#).unwrap(),
            (24.0, 12.0)
        );
        assert_eq!(
            svg_dimensions(br#"<?xml version="1.0"?><svg width="10" viewBox="0 0 20 40"></svg>"#)
                .unwrap(),
            (10.0, 20.0)
        );
        assert!(svg_dimensions(br#"<svg></svg>"#).is_err());
        assert!(svg_dimensions(br#"<html/>"#).is_err());
    }

    #[test]
    fn test_missing_file_is_broken_icon() {
        let err = IconLoader::new()
            .decode("/nonexistent/legend/icon.png", IconBox::unbounded(), 1.0)
            .unwrap_err();
        assert!(err.is_icon_failure());
    }

    #[test]
    fn test_garbage_is_broken_icon() {
        let err = IconLoader::new()
            .decode("data:image/png;base64,AAAAAAAA", IconBox::unbounded(), 1.0)
            .unwrap_err();
        assert!(matches!(err, LegendError::BrokenIcon { .. }));
    }

    #[test]
    fn test_swatch_fills_box() {
        let target = IconBox {
            max_width: f64::INFINITY,
            max_height: 8.0,
        };
        let icon = swatch("#00ff00", target).unwrap();
        assert_eq!((icon.width, icon.height), (10.0, 8.0));
        assert!(swatch("not-a-color", target).is_err());
    }
}
