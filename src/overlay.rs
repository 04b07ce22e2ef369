use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageReader, Limits, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use thiserror::Error;
use tracing::debug;

use crate::detection::Detection;

/// Maximum encoded input size (20MB) - first line of defense
const MAX_INPUT_BYTES: usize = 20 * 1024 * 1024;

/// Maximum decoded pixel count (100 megapixels) - prevents decompression bombs
const MAX_PIXELS: u64 = 100_000_000;

/// Maximum single dimension accepted by the decoder
const MAX_DIMENSION: u32 = 15_000;

/// Bounding-box stroke width in pixels
const STROKE_WIDTH: u32 = 2;

/// Label chip height; glyphs are 14px tall with 3px breathing room
const LABEL_HEIGHT: u32 = 20;

/// Horizontal padding inside the label chip
const LABEL_PAD: u32 = 10;

/// Fallback color for classes outside the palette
const DEFAULT_COLOR: Rgba<u8> = Rgba([0xFF, 0x57, 0x33, 0xFF]);

const LABEL_TEXT_COLOR: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("input bytes empty")]
    EmptyInput,

    #[error("input too large: {size} bytes, max {max}")]
    InputTooLarge { size: usize, max: usize },

    #[error("unsupported image format")]
    UnsupportedFormat,

    #[error("image too large: {width}x{height} pixels, max {max_pixels}")]
    ImageTooLarge {
        width: u32,
        height: u32,
        max_pixels: u64,
    },
}

/// Hex form of [`class_color`], for shells that draw their own chrome.
#[must_use]
pub fn class_color_hex(class_name: &str) -> String {
    let Rgba([r, g, b, _]) = class_color(class_name);
    format!("#{r:02X}{g:02X}{b:02X}")
}

/// Deterministic class-to-color mapping; lookup is by lower-cased name.
fn class_color(class_name: &str) -> Rgba<u8> {
    let rgb: u32 = match class_name.to_lowercase().as_str() {
        "plastic" => 0xFF5733,
        "paper" => 0x33A1FD,
        "metal" => 0xB533FF,
        "glass" => 0x33FF57,
        "organic" => 0xFFD133,
        "other" => 0xFF33A8,
        "drone" => 0x38BDF8,
        "person" => 0xF472B6,
        "vehicle" => 0xFBBF24,
        "building" => 0xFB923C,
        "animal" => 0xA78BFA,
        _ => return DEFAULT_COLOR,
    };
    Rgba([(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, 0xFF])
}

/// Draws `detections` over `image` and returns the annotated surface.
///
/// The output has exactly the source dimensions; the source is drawn
/// unscaled at the origin, then each detection in sequence order gets a
/// 2px unfilled rectangle plus a filled label chip above its top edge.
/// Pure and idempotent: identical inputs produce identical surfaces.
#[must_use]
pub fn render(image: &DynamicImage, detections: &[Detection]) -> RgbaImage {
    let mut surface = image.to_rgba8();
    let (width, height) = surface.dimensions();

    for detection in detections {
        let Some((x, y, w, h)) = pixel_rect(detection.bbox, width, height) else {
            debug!(class = %detection.class_name, "skipping out-of-frame detection");
            continue;
        };

        let color = class_color(&detection.class_name);
        draw_stroked_rect(&mut surface, x, y, w, h, color);
        draw_label(&mut surface, x, y, &detection.label(), color);
    }

    surface
}

/// Decodes `bytes` (with bomb limits) and renders the overlay.
pub fn render_bytes(bytes: &[u8], detections: &[Detection]) -> Result<RgbaImage, OverlayError> {
    let image = decode_image(bytes)?;
    Ok(render(&image, detections))
}

/// Converts a source-pixel `[x, y, w, h]` box into an integer rect clamped
/// to the surface. Returns `None` for boxes with no visible area.
fn pixel_rect(bbox: [f32; 4], width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let [x, y, w, h] = bbox;
    if [x, y, w, h].iter().any(|v| !v.is_finite()) || w <= 0.0 || h <= 0.0 {
        return None;
    }

    let clamp = |v: f32, max: u32| -> u32 { (v.max(0.0) as u32).min(max.saturating_sub(1)) };
    let x0 = clamp(x, width);
    let y0 = clamp(y, height);
    let x1 = clamp(x + w, width);
    let y1 = clamp(y + h, height);

    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some((x0, y0, x1 - x0, y1 - y0))
}

fn draw_stroked_rect(surface: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    for inset in 0..STROKE_WIDTH {
        let iw = w.saturating_sub(inset * 2);
        let ih = h.saturating_sub(inset * 2);
        if iw == 0 || ih == 0 {
            break;
        }
        let rect = Rect::at((x + inset) as i32, (y + inset) as i32).of_size(iw, ih);
        draw_hollow_rect_mut(surface, rect, color);
    }
}

/// Filled chip sized to the text, sitting immediately above the box top
/// edge (or pinned to the top border when the box starts there), followed
/// by the label text in white.
fn draw_label(surface: &mut RgbaImage, box_x: u32, box_y: u32, label: &str, color: Rgba<u8>) {
    let (width, height) = surface.dimensions();
    let chip_w = (font::text_width(label) + LABEL_PAD).min(width.saturating_sub(box_x));
    let chip_y = box_y.saturating_sub(LABEL_HEIGHT);

    if chip_w == 0 || chip_y >= height {
        return;
    }

    let chip_h = LABEL_HEIGHT.min(height - chip_y);
    let rect = Rect::at(box_x as i32, chip_y as i32).of_size(chip_w, chip_h);
    draw_filled_rect_mut(surface, rect, color);

    font::draw_text(
        surface,
        label,
        box_x + LABEL_PAD / 2,
        chip_y + (LABEL_HEIGHT - font::GLYPH_HEIGHT) / 2,
        LABEL_TEXT_COLOR,
    );
}

fn decode_image(bytes: &[u8]) -> Result<DynamicImage, OverlayError> {
    if bytes.is_empty() {
        return Err(OverlayError::EmptyInput);
    }
    if bytes.len() > MAX_INPUT_BYTES {
        return Err(OverlayError::InputTooLarge {
            size: bytes.len(),
            max: MAX_INPUT_BYTES,
        });
    }

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| OverlayError::Decode(e.into()))?;
    if reader.format().is_none() {
        return Err(OverlayError::UnsupportedFormat);
    }

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DIMENSION);
    limits.max_image_height = Some(MAX_DIMENSION);
    reader.limits(limits);

    let image = reader.decode()?;
    let (w, h) = image.dimensions();
    if u64::from(w) * u64::from(h) > MAX_PIXELS {
        return Err(OverlayError::ImageTooLarge {
            width: w,
            height: h,
            max_pixels: MAX_PIXELS,
        });
    }

    Ok(image)
}

/// Minimal built-in 5x7 bitmap font, scaled 2x to the original's ~14px
/// label size. Letters share one glyph case; anything unmapped renders as
/// a solid block. Covers what detection labels contain: letters, digits,
/// percent, and common separators.
mod font {
    use image::{Rgba, RgbaImage};

    const SCALE: u32 = 2;
    const GLYPH_COLS: u32 = 5;
    const GLYPH_ROWS: u32 = 7;
    /// Advance per character including 1-column spacing, in surface pixels.
    const ADVANCE: u32 = (GLYPH_COLS + 1) * SCALE;

    pub const GLYPH_HEIGHT: u32 = GLYPH_ROWS * SCALE;

    pub fn text_width(text: &str) -> u32 {
        (text.chars().count() as u32) * ADVANCE
    }

    pub fn draw_text(surface: &mut RgbaImage, text: &str, x: u32, y: u32, color: Rgba<u8>) {
        let mut pen_x = x;
        for ch in text.chars() {
            draw_glyph(surface, ch, pen_x, y, color);
            pen_x = pen_x.saturating_add(ADVANCE);
        }
    }

    fn draw_glyph(surface: &mut RgbaImage, ch: char, x: u32, y: u32, color: Rgba<u8>) {
        let (width, height) = surface.dimensions();
        let rows = glyph(ch);

        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_COLS {
                if bits & (1 << (GLYPH_COLS - 1 - col)) == 0 {
                    continue;
                }
                for dy in 0..SCALE {
                    for dx in 0..SCALE {
                        let px = x + col * SCALE + dx;
                        let py = y + (row as u32) * SCALE + dy;
                        if px < width && py < height {
                            surface.put_pixel(px, py, color);
                        }
                    }
                }
            }
        }
    }

    #[rustfmt::skip]
    fn glyph(ch: char) -> [u8; 7] {
        match ch.to_ascii_uppercase() {
            ' ' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
            'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
            'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
            'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
            'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
            'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
            'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
            'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
            'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
            'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
            'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
            'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
            'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
            'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
            'N' => [0x11, 0x19, 0x15, 0x13, 0x11, 0x11, 0x11],
            'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
            'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
            'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
            'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
            'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
            'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
            'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
            'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
            'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
            'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
            'Y' => [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04],
            'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
            '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
            '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
            '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
            '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
            '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
            '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
            '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
            '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
            '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
            '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
            '%' => [0x19, 0x1A, 0x02, 0x04, 0x08, 0x0B, 0x13],
            '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
            '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
            '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
            _ => [0x1F, 0x1F, 0x1F, 0x1F, 0x1F, 0x1F, 0x1F],
        }
    }
}
