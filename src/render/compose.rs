use std::collections::HashMap;

use ab_glyph::{Font, PxScale};
use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage, imageops, imageops::FilterType};
use imageproc::{
    drawing::{
        Canvas, draw_filled_circle_mut, draw_filled_rect_mut, draw_text_mut, text_size,
    },
    filter::gaussian_blur_f32,
    rect::Rect,
};

/// Output width in pixels.
pub const CANVAS_WIDTH: u32 = 480;
/// Output height in pixels.
pub const CANVAS_HEIGHT: u32 = 320;

const BACKGROUND_BLUR: f32 = 15.0;
const SCRIM_MAX_ALPHA: f32 = 204.0;

const THUMB_SIZE: u32 = 160;
const THUMB_RADIUS: i32 = 10;
const THUMB_X: i64 = 160;
const THUMB_Y: i64 = 45;

const GLOW_SIZE: u32 = 400;
const GLOW_INSET: i32 = 100;
const GLOW_BLUR: f32 = 40.0;
const GLOW_X: i64 = 40;
const GLOW_Y: i64 = -75;

const CAPTION_TOP: i32 = 215;
const CAPTION_BOTTOM: i32 = 252;
const CAPTION_PADDING: i32 = 6;
const CAPTION_RADIUS: i32 = 4;
const CAPTION_ALPHA: u8 = 170;

const TITLE_Y: i32 = 216;
const ARTIST_Y: i32 = 231;
const TITLE_MAX_CHARS: usize = 40;
const ARTIST_MAX_CHARS: usize = 22;

const FALLBACK_GREY: Rgba<u8> = Rgba([128, 128, 128, 255]);
const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Square neutral placeholder used when there is no artwork.
pub fn placeholder_artwork() -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(GLOW_SIZE, GLOW_SIZE, FALLBACK_GREY))
}

/// Shortens `text` to `max_chars`, ending in "..." when cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Most common colour after coarse quantization (3 bits per channel).
///
/// Returns the mean of the pixels in the winning bucket.
pub fn dominant_color(image: &RgbaImage) -> Rgba<u8> {
    let mut buckets: HashMap<(u8, u8, u8), (u64, [u64; 3])> = HashMap::new();

    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        if a == 0 {
            continue;
        }
        let entry = buckets.entry((r >> 5, g >> 5, b >> 5)).or_default();
        entry.0 += 1;
        entry.1[0] += u64::from(r);
        entry.1[1] += u64::from(g);
        entry.1[2] += u64::from(b);
    }

    buckets
        .into_values()
        .max_by_key(|(count, _)| *count)
        .map(|(count, sums)| {
            let mean = |sum: u64| u8::try_from(sum / count).unwrap_or(u8::MAX);
            Rgba([mean(sums[0]), mean(sums[1]), mean(sums[2]), 255])
        })
        .unwrap_or(FALLBACK_GREY)
}

/// Fills a rounded rectangle as two crossing rectangles plus corner discs.
fn fill_rounded_rect<C>(
    canvas: &mut C,
    x: i32,
    y: i32,
    w: u32,
    h: u32,
    radius: i32,
    color: C::Pixel,
) where
    C: Canvas,
{
    let r = radius.max(0);
    let (wi, hi) = (w as i32, h as i32);
    let inner_w = (wi - 2 * r).max(0) as u32;
    let inner_h = (hi - 2 * r).max(0) as u32;

    if inner_w > 0 {
        draw_filled_rect_mut(canvas, Rect::at(x + r, y).of_size(inner_w, h), color);
    }
    if inner_h > 0 {
        draw_filled_rect_mut(canvas, Rect::at(x, y + r).of_size(w, inner_h), color);
    }
    if r > 0 {
        for (cx, cy) in [
            (x + r, y + r),
            (x + wi - r - 1, y + r),
            (x + r, y + hi - r - 1),
            (x + wi - r - 1, y + hi - r - 1),
        ] {
            draw_filled_circle_mut(canvas, (cx, cy), r, color);
        }
    }
}

fn cover_background(artwork: &DynamicImage) -> RgbaImage {
    let fitted = artwork
        .resize_to_fill(CANVAS_WIDTH, CANVAS_HEIGHT, FilterType::Lanczos3)
        .to_rgba8();
    gaussian_blur_f32(&fitted, BACKGROUND_BLUR)
}

fn apply_scrim(canvas: &mut RgbaImage) {
    let height = canvas.height() as f32;

    for (_, y, pixel) in canvas.enumerate_pixels_mut() {
        let alpha = (SCRIM_MAX_ALPHA * y as f32 / height).round() / 255.0;
        for channel in &mut pixel.0[..3] {
            *channel = (f32::from(*channel) * (1.0 - alpha)).round() as u8;
        }
    }
}

fn rounded_thumbnail(artwork: &DynamicImage) -> RgbaImage {
    let mut thumb = artwork
        .resize_exact(THUMB_SIZE, THUMB_SIZE, FilterType::Lanczos3)
        .to_rgba8();

    let mut mask = GrayImage::new(THUMB_SIZE, THUMB_SIZE);
    fill_rounded_rect(&mut mask, 0, 0, THUMB_SIZE, THUMB_SIZE, THUMB_RADIUS, Luma([255]));

    for (x, y, pixel) in thumb.enumerate_pixels_mut() {
        pixel.0[3] = pixel.0[3].min(mask.get_pixel(x, y).0[0]);
    }
    thumb
}

fn glow(color: Rgba<u8>) -> RgbaImage {
    let mut layer = RgbaImage::new(GLOW_SIZE, GLOW_SIZE);
    let side = GLOW_SIZE - 2 * GLOW_INSET as u32;
    draw_filled_rect_mut(
        &mut layer,
        Rect::at(GLOW_INSET, GLOW_INSET).of_size(side, side),
        color,
    );
    gaussian_blur_f32(&layer, GLOW_BLUR)
}

fn caption_box(text_width: u32) -> RgbaImage {
    let mut layer = RgbaImage::new(CANVAS_WIDTH, CANVAS_HEIGHT);
    let width = text_width + 2 * CAPTION_PADDING as u32;
    let x = (CANVAS_WIDTH as i32 - width as i32) / 2;

    fill_rounded_rect(
        &mut layer,
        x,
        CAPTION_TOP,
        width,
        (CAPTION_BOTTOM - CAPTION_TOP) as u32,
        CAPTION_RADIUS,
        Rgba([0, 0, 0, CAPTION_ALPHA]),
    );
    gaussian_blur_f32(&layer, 2.5)
}

fn centered_x(width: u32) -> i32 {
    (CANVAS_WIDTH as i32 - width as i32) / 2
}

/// Composes the 480×320 status image.
///
/// Text is drawn only when a font is available.
pub fn compose<F: Font>(
    artwork: &DynamicImage,
    title: &str,
    artist: &str,
    font: Option<(&F, f32)>,
) -> RgbaImage {
    let mut canvas = cover_background(artwork);
    apply_scrim(&mut canvas);

    let thumbnail = rounded_thumbnail(artwork);
    imageops::overlay(&mut canvas, &glow(dominant_color(&thumbnail)), GLOW_X, GLOW_Y);

    if let Some((font, size)) = font {
        let scale = PxScale::from(size);
        let title = truncate(title, TITLE_MAX_CHARS);
        let artist = truncate(artist, ARTIST_MAX_CHARS);
        let (title_w, _) = text_size(scale, font, &title);
        let (artist_w, _) = text_size(scale, font, &artist);

        imageops::overlay(&mut canvas, &caption_box(title_w.max(artist_w)), 0, 0);
        draw_text_mut(&mut canvas, TEXT_COLOR, centered_x(title_w), TITLE_Y, scale, font, &title);
        draw_text_mut(
            &mut canvas,
            TEXT_COLOR,
            centered_x(artist_w),
            ARTIST_Y,
            scale,
            font,
            &artist,
        );
    }

    imageops::overlay(&mut canvas, &thumbnail, THUMB_X, THUMB_Y);
    canvas
}

#[cfg(test)]
mod tests {
    use ab_glyph::FontVec;

    use super::*;

    fn solid(color: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 64, Rgba(color)))
    }

    #[test]
    fn truncates_with_ellipsis() {
        assert_eq!(truncate("short", 22), "short");
        assert_eq!(truncate("exactly ten", 11), "exactly ten");
        assert_eq!(truncate("Brother Louie Mix '98", 10), "Brother...");
        assert_eq!(truncate("äöüäöüäöü", 5), "äö...");
    }

    #[test]
    fn dominant_color_of_mostly_blue_image() {
        let mut image = RgbaImage::from_pixel(10, 10, Rgba([10, 20, 200, 255]));
        image.put_pixel(0, 0, Rgba([250, 250, 250, 255]));

        assert_eq!(dominant_color(&image), Rgba([10, 20, 200, 255]));
    }

    #[test]
    fn transparent_image_falls_back_to_grey() {
        assert_eq!(dominant_color(&RgbaImage::new(4, 4)), FALLBACK_GREY);
    }

    #[test]
    fn thumbnail_corners_are_cut() {
        let thumb = rounded_thumbnail(&solid([255, 0, 0, 255]));

        assert_eq!(thumb.dimensions(), (THUMB_SIZE, THUMB_SIZE));
        assert_eq!(thumb.get_pixel(0, 0).0[3], 0);
        assert_eq!(thumb.get_pixel(THUMB_SIZE - 1, THUMB_SIZE - 1).0[3], 0);
        assert!(thumb.get_pixel(80, 80).0[3] > 250);
    }

    #[test]
    fn composes_full_canvas_without_font() {
        let image = compose::<FontVec>(&solid([255, 0, 0, 255]), "Song", "Artist", None);

        assert_eq!(image.dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));
        let center = image.get_pixel(240, 125).0;
        assert!(center[0] > 250 && center[1] < 5);
        assert!(image.get_pixel(160, 45).0[0] < 255);
        // bottom rows carry the scrim
        assert!(image.get_pixel(5, CANVAS_HEIGHT - 1).0[0] < 80);
    }
}
