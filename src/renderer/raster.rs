//! Raster builder: paints glyphs and barlines onto a white canvas and
//! produces the final RGB image.

use std::collections::HashMap;

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbImage, RgbaImage};

use super::constants::*;
use super::layout::{Barline, GlyphPlacement};
use crate::model::GlyphId;

// ═══════════════════════════════════════════════════════════════════════
// RasterBuilder
// ═══════════════════════════════════════════════════════════════════════

pub(super) struct RasterBuilder {
    canvas: RgbaImage,
    /// Resampled glyphs, keyed by id and target size
    resized: HashMap<(GlyphId, u32, u32), RgbaImage>,
}

impl RasterBuilder {
    pub(super) fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: RgbaImage::from_pixel(width, height, Rgba(BACKGROUND)),
            resized: HashMap::new(),
        }
    }

    pub(super) fn build(self) -> RgbImage {
        DynamicImage::ImageRgba8(self.canvas).into_rgb8()
    }

    /// Composite `source` over the canvas at the placement's rounded box.
    pub(super) fn glyph(&mut self, source: &RgbaImage, placement: &GlyphPlacement) {
        let w = placement.width.round() as u32;
        let h = placement.height.round() as u32;
        if w == 0 || h == 0 {
            return;
        }
        let scaled = self
            .resized
            .entry((placement.glyph, w, h))
            .or_insert_with(|| {
                if source.dimensions() == (w, h) {
                    source.clone()
                } else {
                    imageops::resize(source, w, h, FilterType::Lanczos3)
                }
            });
        imageops::overlay(
            &mut self.canvas,
            &*scaled,
            placement.x.round() as i64,
            placement.y.round() as i64,
        );
    }

    pub(super) fn barline(&mut self, barline: &Barline) {
        for x in barline.strokes() {
            self.stroke(x, barline.top, barline.bottom, barline.stroke_width);
        }
    }

    /// Solid vertical stroke centered on `cx`, at least one pixel wide.
    pub(super) fn stroke(&mut self, cx: f64, top: f64, bottom: f64, width: f64) {
        let (cw, ch) = self.canvas.dimensions();
        let half = width / 2.0;
        if cx + half < 0.0 || cx - half > cw as f64 {
            return;
        }
        let x0 = (cx - half).round().max(0.0) as u32;
        let mut x1 = ((cx + half).round().max(0.0) as u32).min(cw);
        if x1 <= x0 && x0 < cw {
            x1 = x0 + 1;
        }
        let y0 = top.round().max(0.0) as u32;
        let y1 = (bottom.round().max(0.0) as u32).min(ch);

        let color = Rgba(BARLINE_COLOR);
        for y in y0..y1 {
            for x in x0..x1 {
                self.canvas.put_pixel(x, y, color);
            }
        }
    }
}
