//! PNG snapshots of a rendered page with its overlay outlined

use std::path::Path;

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};

use super::backend::Surface;
use super::overlay::OverlayRegion;
use crate::content::ElementTag;
use crate::geometry::PixelRect;

const TEXT_OUTLINE: Rgb<u8> = Rgb([0x1E, 0x88, 0xE5]);
const TABLE_OUTLINE: Rgb<u8> = Rgb([0x43, 0xA0, 0x47]);
const CELL_OUTLINE: Rgb<u8> = Rgb([0xFB, 0x8C, 0x00]);
const SELECTED_OUTLINE: Rgb<u8> = Rgb([0xE5, 0x39, 0x35]);

fn outline_color(tag: ElementTag) -> Rgb<u8> {
    match tag {
        ElementTag::Text => TEXT_OUTLINE,
        ElementTag::Table => TABLE_OUTLINE,
        ElementTag::Cell => CELL_OUTLINE,
    }
}

/// Build an image of the surface with every region outlined.
///
/// The selected region is drawn last and twice as thick.
pub fn compose(
    surface: &Surface,
    overlay: &[OverlayRegion],
    selected: Option<&str>,
) -> Result<RgbImage> {
    let mut img = RgbImage::from_raw(surface.width_px, surface.height_px, surface.pixels.clone())
        .context("surface pixel buffer does not match its dimensions")?;

    for region in overlay {
        if selected == Some(region.element_id.as_str()) {
            continue;
        }
        draw_outline(&mut img, region.surface_box.snapped(), outline_color(region.tag), 1);
    }

    if let Some(region) = overlay
        .iter()
        .find(|r| selected == Some(r.element_id.as_str()))
    {
        draw_outline(&mut img, region.surface_box.snapped(), SELECTED_OUTLINE, 2);
    }

    Ok(img)
}

/// Write the composed snapshot to `path` as PNG
pub fn write_png(
    surface: &Surface,
    overlay: &[OverlayRegion],
    selected: Option<&str>,
    path: &Path,
) -> Result<()> {
    let img = compose(surface, overlay, selected)?;
    img.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
    log::info!("Wrote page snapshot to {}", path.display());
    Ok(())
}

fn draw_outline(img: &mut RgbImage, rect: PixelRect, color: Rgb<u8>, thickness: u32) {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return;
    }

    let clamp_x = |x: i64| x.clamp(0, i64::from(w) - 1) as u32;
    let clamp_y = |y: i64| y.clamp(0, i64::from(h) - 1) as u32;

    let x0 = i64::from(rect.x);
    let y0 = i64::from(rect.y);
    let x1 = x0 + i64::from(rect.width);
    let y1 = y0 + i64::from(rect.height);
    if x1 < 0 || y1 < 0 || x0 >= i64::from(w) || y0 >= i64::from(h) {
        return;
    }

    for t in 0..i64::from(thickness) {
        for x in clamp_x(x0)..=clamp_x(x1) {
            img.put_pixel(x, clamp_y(y0 + t), color);
            img.put_pixel(x, clamp_y(y1 - t), color);
        }
        for y in clamp_y(y0)..=clamp_y(y1) {
            img.put_pixel(clamp_x(x0 + t), y, color);
            img.put_pixel(clamp_x(x1 - t), y, color);
        }
    }
}
