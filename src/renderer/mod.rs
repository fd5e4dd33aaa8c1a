//! Worksheet renderer: converts a sampled Score into a raster image.
//!
//! Rendering happens in two passes. `compute_layout` turns the score into
//! pure geometry (rows, glyph boxes, barlines) with one shared, envelope-
//! scaled `LayoutGeometry`. `render_layout` then paints that geometry onto a
//! white canvas. Only the sampler is random; everything here is
//! deterministic for a given score.

pub(crate) mod constants;
mod geometry;
mod layout;
mod raster;

use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::info;

use crate::error::{Result, RhythmError};
use crate::glyphs::GlyphProvider;
use crate::model::{DifficultyTier, Score};
use crate::settings::LayoutConfig;
use raster::RasterBuilder;

pub use geometry::{derive_geometry, GlyphMetrics, LayoutGeometry};
pub use layout::{
    compute_layout, compute_layout_with_metrics, layout_row, Barline, BarlineKind,
    GlyphPlacement, RowLayout, ScoreLayout,
};

// ═══════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════

/// Lay out and paint a score in one call.
pub fn render_score<G: GlyphProvider + ?Sized>(
    score: &Score,
    tier: &DifficultyTier,
    config: &LayoutConfig,
    glyphs: &G,
) -> Result<RgbImage> {
    let layout = compute_layout(score, tier, config, glyphs)?;
    let image = render_layout(&layout, glyphs)?;
    info!(
        tier = %tier.id,
        measures = score.measure_count(),
        rows = layout.rows.len(),
        width = layout.width,
        height = layout.height,
        scale = layout.geometry.scale,
        "rendered worksheet"
    );
    Ok(image)
}

/// Paint a computed layout. Glyphs are drawn first, barlines on top.
pub fn render_layout<G: GlyphProvider + ?Sized>(
    layout: &ScoreLayout,
    glyphs: &G,
) -> Result<RgbImage> {
    let mut raster = RasterBuilder::new(layout.width, layout.height);
    for row in &layout.rows {
        for placement in &row.placements {
            let glyph = glyphs.glyph(placement.glyph)?;
            raster.glyph(&glyph, placement);
        }
        for barline in &row.barlines {
            raster.barline(barline);
        }
    }
    Ok(raster.build())
}

/// Serialize a layout to JSON so a host can map preview clicks back to
/// glyphs and measures.
pub fn layout_to_json(layout: &ScoreLayout) -> String {
    serde_json::to_string(layout).unwrap_or_else(|_| "{}".to_string())
}

/// Aspect-preserving thumbnail `width` pixels wide.
pub fn preview(image: &RgbImage, width: u32) -> Result<RgbImage> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return Err(RhythmError::InvalidImage { width: w, height: h });
    }
    if width == 0 {
        return Err(RhythmError::InvalidPreviewWidth);
    }
    let height = ((h as f64 * width as f64 / w as f64).round() as u32).max(1);
    Ok(imageops::resize(image, width, height, FilterType::Lanczos3))
}

/// [`preview`] at the stock 800 px width.
pub fn default_preview(image: &RgbImage) -> Result<RgbImage> {
    preview(image, constants::PREVIEW_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyphs::GlyphSet;
    use crate::model::Measure;
    use image::{Rgba, RgbaImage};

    fn glyphs() -> GlyphSet {
        let mut set = GlyphSet::new();
        for id in 0..3u16 {
            set.insert(id, RgbaImage::from_pixel(100 + 20 * id as u32, 265, Rgba([0, 0, 0, 255])));
        }
        set
    }

    fn tier() -> DifficultyTier {
        DifficultyTier::new("beginner", vec![0, 1, 2], 3, 1, 27)
    }

    #[test]
    fn render_matches_layout_size() {
        let score = Score {
            difficulty: "beginner".into(),
            measures: vec![Measure { beats: [0, 1, 2, 1] }; 4],
        };
        let glyphs = glyphs();
        let config = LayoutConfig::default();
        let layout = compute_layout(&score, &tier(), &config, &glyphs).unwrap();
        let image = render_score(&score, &tier(), &config, &glyphs).unwrap();
        assert_eq!(image.dimensions(), (layout.width, layout.height));

        // First glyph is solid black at its box, margin stays white
        let p = layout.rows[0].placements[0];
        let inside = image.get_pixel((p.x + 5.0) as u32, (p.y + 5.0) as u32);
        assert_eq!(inside.0, [0, 0, 0]);
        assert_eq!(image.get_pixel(10, 10).0, [255, 255, 255]);
    }

    #[test]
    fn closing_double_barline_is_fully_painted() {
        let score = Score {
            difficulty: "beginner".into(),
            measures: vec![Measure { beats: [0, 1, 2, 1] }; 3],
        };
        let image = render_score(&score, &tier(), &LayoutConfig::default(), &glyphs()).unwrap();

        // Justified row ends at 2500; strokes are centered on 2520 and 2534
        let y = 100;
        let black: Vec<u32> = (2501..image.width())
            .filter(|&x| image.get_pixel(x, y).0 == [0, 0, 0])
            .collect();
        assert_eq!(black, vec![2519, 2520, 2521, 2533, 2534, 2535]);

        let clipped = LayoutConfig { margin_right: 20.0, ..Default::default() };
        let err = render_score(&score, &tier(), &clipped, &glyphs()).unwrap_err();
        assert!(matches!(err, RhythmError::InvalidLayout(_)));
    }

    #[test]
    fn missing_glyph_aborts_render() {
        let score = Score {
            difficulty: "beginner".into(),
            measures: vec![Measure { beats: [0, 0, 0, 0] }],
        };
        let mut sparse = GlyphSet::new();
        sparse.insert(0, RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255])));
        // Glyph 1 and 2 are in the repertoire but have no asset
        let err = render_score(&score, &tier(), &LayoutConfig::default(), &sparse).unwrap_err();
        assert!(matches!(err, RhythmError::GlyphNotFound(1)));
    }

    #[test]
    fn preview_keeps_aspect() {
        let image = RgbImage::from_pixel(2600, 990, image::Rgb([255, 255, 255]));
        let thumb = default_preview(&image).unwrap();
        assert_eq!(thumb.dimensions(), (800, 305));

        let err = preview(&image, 0).unwrap_err();
        assert!(matches!(err, RhythmError::InvalidPreviewWidth));
        assert_eq!(err.kind(), crate::error::ErrorKind::Input);

        let err = preview(&RgbImage::new(0, 40), 800).unwrap_err();
        assert!(matches!(err, RhythmError::InvalidImage { width: 0, height: 40 }));
    }

    #[test]
    fn layout_json_lists_rows() {
        let score = Score {
            difficulty: "beginner".into(),
            measures: vec![Measure { beats: [2, 1, 0, 1] }; 5],
        };
        let layout = compute_layout(&score, &tier(), &LayoutConfig::default(), &glyphs()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&layout_to_json(&layout)).unwrap();
        assert_eq!(json["rows"].as_array().unwrap().len(), 2);
        assert_eq!(json["rows"][1]["barlines"][1]["kind"], "double");
    }
}
