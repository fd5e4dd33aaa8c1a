//! Layout computation: determines how measures are grouped into rows and
//! where every glyph and barline of a row lands.

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::glyphs::GlyphProvider;
use crate::model::*;
use crate::settings::{LayoutConfig, PartialRowSpacing};
use super::geometry::{derive_geometry, GlyphMetrics, LayoutGeometry};

// ═══════════════════════════════════════════════════════════════════════
// Layout structures
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct ScoreLayout {
    pub geometry: LayoutGeometry,
    /// Canvas size in pixels
    pub width: u32,
    pub height: u32,
    pub rows: Vec<RowLayout>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowLayout {
    pub index: usize,
    /// Top of the row; every glyph in it shares this y
    pub y: f64,
    /// Holds the tier's full measures-per-row
    pub full: bool,
    /// Holds the score's final measure
    pub last: bool,
    /// Gap inserted after each glyph but the last
    pub spacing: f64,
    /// Uniform factor applied to glyphs that overflowed the row (≤ 1)
    pub shrink: f64,
    pub placements: Vec<GlyphPlacement>,
    pub barlines: Vec<Barline>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlyphPlacement {
    pub glyph: GlyphId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl GlyphPlacement {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BarlineKind {
    /// Boundary between two measures inside a row
    Single,
    /// Left or right end of a row
    Edge,
    /// End of the whole score
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Barline {
    /// Center of the (first) stroke
    pub x: f64,
    pub stroke_width: f64,
    pub kind: BarlineKind,
    pub top: f64,
    pub bottom: f64,
    /// Distance to the second stroke; zero unless `kind` is `Double`
    pub gap: f64,
}

impl Barline {
    /// Center x of each stroke this barline draws.
    pub fn strokes(&self) -> Vec<f64> {
        match self.kind {
            BarlineKind::Double => vec![self.x, self.x + self.gap],
            BarlineKind::Single | BarlineKind::Edge => vec![self.x],
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Row layout
// ═══════════════════════════════════════════════════════════════════════

/// Lay out one staff line.
///
/// Glyphs start at the left margin. A full row is justified so its last
/// glyph ends exactly on the usable right boundary; a partial row keeps
/// its natural widths and uses the configured partial spacing. Glyphs
/// that would overflow the usable width shrink uniformly.
pub fn layout_row(
    measures: &[Measure],
    index: usize,
    is_last_row_of_score: bool,
    is_full_row: bool,
    geometry: &LayoutGeometry,
    metrics: &GlyphMetrics,
) -> Result<RowLayout> {
    let y = geometry.row_y(index);
    let note_height = geometry.note_height;
    let beats: Vec<GlyphId> = measures.iter().flat_map(|m| m.beats).collect();

    let mut sizes: Vec<(f64, f64)> = Vec::with_capacity(beats.len());
    for &glyph in &beats {
        let width = match geometry.fixed_note_width {
            Some(w) => w,
            None => metrics.width_at(glyph, note_height)?,
        };
        sizes.push((width, note_height));
    }

    let usable = geometry.usable_width();
    let natural_total: f64 = sizes.iter().map(|&(w, _)| w).sum();
    let shrink = if natural_total > usable && natural_total > 0.0 {
        usable / natural_total
    } else {
        1.0
    };
    if shrink < 1.0 {
        for size in sizes.iter_mut() {
            size.0 *= shrink;
            size.1 *= shrink;
        }
    }
    let total = natural_total * shrink;

    let gaps = beats.len().saturating_sub(1) as f64;
    let spacing = if gaps == 0.0 {
        0.0
    } else if is_full_row {
        ((usable - total) / gaps).max(0.0)
    } else {
        match geometry.partial_row_spacing {
            PartialRowSpacing::Packed => 0.0,
            PartialRowSpacing::MatchFullRows => {
                geometry.nominal_spacing.min((usable - total) / gaps).max(0.0)
            }
        }
    };

    let mut placements = Vec::with_capacity(beats.len());
    let mut x = geometry.margin_left;
    for (i, (&glyph, &(width, height))) in beats.iter().zip(&sizes).enumerate() {
        placements.push(GlyphPlacement { glyph, x, y, width, height });
        x += width;
        if i + 1 < beats.len() {
            x += spacing;
        }
    }

    let barlines = place_barlines(&placements, measures.len(), is_last_row_of_score, y, geometry);

    debug!(
        row = index,
        full = is_full_row,
        last = is_last_row_of_score,
        measures = measures.len(),
        spacing,
        shrink,
        "laid out row"
    );

    Ok(RowLayout {
        index,
        y,
        full: is_full_row,
        last: is_last_row_of_score,
        spacing,
        shrink,
        placements,
        barlines,
    })
}

/// Barlines for one row: optional left edge, one stroke between each pair
/// of measures, and a right edge that doubles at the end of the score.
fn place_barlines(
    placements: &[GlyphPlacement],
    measure_count: usize,
    is_last_row_of_score: bool,
    y: f64,
    geometry: &LayoutGeometry,
) -> Vec<Barline> {
    let Some(last_glyph) = placements.last() else {
        return Vec::new();
    };
    let bar = |x: f64, kind: BarlineKind| Barline {
        x,
        stroke_width: geometry.barline_width,
        kind,
        top: y,
        bottom: y + geometry.note_height,
        gap: if kind == BarlineKind::Double { geometry.double_barline_gap } else { 0.0 },
    };

    let mut barlines = Vec::with_capacity(measure_count + 1);
    if geometry.left_edge_line {
        barlines.push(bar(geometry.margin_left - geometry.edge_padding, BarlineKind::Edge));
    }

    for m in 1..measure_count {
        let boundary = m * BEATS_PER_MEASURE;
        if boundary >= placements.len() {
            break;
        }
        let end = placements[boundary - 1].right();
        let next = placements[boundary].x;
        barlines.push(bar((end + next) / 2.0, BarlineKind::Single));
    }

    let trailing_kind = if is_last_row_of_score {
        BarlineKind::Double
    } else {
        BarlineKind::Edge
    };
    barlines.push(bar(last_glyph.right() + geometry.edge_padding, trailing_kind));
    barlines
}

// ═══════════════════════════════════════════════════════════════════════
// Score layout
// ═══════════════════════════════════════════════════════════════════════

/// Lay out a whole score.
///
/// Glyph metrics for the tier's entire repertoire are resolved first, so
/// a missing asset fails the render no matter which glyphs were drawn.
/// Geometry is derived (and scaled to the envelope) once and shared by
/// every row.
pub fn compute_layout<G: GlyphProvider + ?Sized>(
    score: &Score,
    tier: &DifficultyTier,
    config: &LayoutConfig,
    glyphs: &G,
) -> Result<ScoreLayout> {
    let metrics = GlyphMetrics::resolve(glyphs, tier.glyphs.iter().copied().chain(score.beats()))?;
    compute_layout_with_metrics(score, tier, config, &metrics)
}

/// [`compute_layout`] for callers that already hold glyph metrics.
pub fn compute_layout_with_metrics(
    score: &Score,
    tier: &DifficultyTier,
    config: &LayoutConfig,
    metrics: &GlyphMetrics,
) -> Result<ScoreLayout> {
    let per_row = tier.measures_per_row.max(1);
    let row_count = score.row_count(per_row);
    let geometry = derive_geometry(config, tier, metrics, row_count)?;

    let rows = score
        .rows(per_row)
        .enumerate()
        .map(|(i, measures)| {
            layout_row(
                measures,
                i,
                i + 1 == row_count,
                measures.len() == per_row,
                &geometry,
                metrics,
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let (width, height) = geometry.pixel_size();
    Ok(ScoreLayout { geometry, width, height, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Envelope, GlyphWidthPolicy};
    use assert_approx_eq::assert_approx_eq;

    const EPS: f64 = 1e-6;

    fn tier() -> DifficultyTier {
        DifficultyTier::new("beginner", vec![0, 1, 2], 3, 1, 27)
    }

    fn metrics() -> GlyphMetrics {
        GlyphMetrics::from_sizes([(0, (120, 265)), (1, (150, 265)), (2, (90, 265))])
    }

    fn score(n: usize) -> Score {
        Score {
            difficulty: "beginner".into(),
            measures: (0..n)
                .map(|i| Measure { beats: [(i % 3) as GlyphId, 1, 2, 0] })
                .collect(),
        }
    }

    fn config() -> LayoutConfig {
        LayoutConfig { envelope: None, ..Default::default() }
    }

    #[test]
    fn full_row_is_justified_edge_to_edge() {
        let layout = compute_layout_with_metrics(&score(3), &tier(), &config(), &metrics()).unwrap();
        let row = &layout.rows[0];
        assert!(row.full);
        assert_eq!(row.placements.len(), 12);
        assert_approx_eq!(row.placements[0].x, 100.0);
        for pair in row.placements.windows(2) {
            assert!(pair[1].x > pair[0].x);
            assert_approx_eq!(pair[1].x, pair[0].right() + row.spacing);
        }
        assert_approx_eq!(row.placements.last().unwrap().right(), layout.geometry.usable_right());
    }

    #[test]
    fn partial_row_is_packed() {
        let layout = compute_layout_with_metrics(&score(4), &tier(), &config(), &metrics()).unwrap();
        let row = &layout.rows[1];
        assert!(!row.full && row.last);
        assert_eq!(row.spacing, 0.0);
        assert_eq!(row.shrink, 1.0);
        for pair in row.placements.windows(2) {
            assert_approx_eq!(pair[1].x, pair[0].right());
        }
        assert!(row.placements.last().unwrap().right() < layout.geometry.usable_right());
    }

    #[test]
    fn barlines_mark_measures_and_final_double() {
        let layout = compute_layout_with_metrics(&score(5), &tier(), &config(), &metrics()).unwrap();
        let g = &layout.geometry;

        let first = &layout.rows[0];
        let kinds: Vec<BarlineKind> = first.barlines.iter().map(|b| b.kind).collect();
        assert_eq!(kinds, vec![BarlineKind::Single, BarlineKind::Single, BarlineKind::Edge]);
        // Inner strokes sit midway between the measures they separate
        let p = &first.placements;
        assert_approx_eq!(first.barlines[0].x, (p[3].right() + p[4].x) / 2.0);
        assert_approx_eq!(first.barlines[1].x, (p[7].right() + p[8].x) / 2.0);
        assert_approx_eq!(first.barlines[2].x, g.usable_right() + g.edge_padding);

        let last = &layout.rows[1];
        let kinds: Vec<BarlineKind> = last.barlines.iter().map(|b| b.kind).collect();
        assert_eq!(kinds, vec![BarlineKind::Single, BarlineKind::Double]);
        let double = last.barlines[1];
        let strokes = double.strokes();
        assert_eq!(strokes.len(), 2);
        assert_approx_eq!(strokes[1] - strokes[0], g.double_barline_gap);
        assert_approx_eq!(double.x, last.placements.last().unwrap().right() + g.edge_padding);
        assert_approx_eq!(double.bottom - double.top, g.note_height);
    }

    #[test]
    fn left_edge_line_is_optional() {
        let cfg = LayoutConfig { left_edge_line: true, ..config() };
        let layout = compute_layout_with_metrics(&score(3), &tier(), &cfg, &metrics()).unwrap();
        let first = layout.rows[0].barlines[0];
        assert_eq!(first.kind, BarlineKind::Edge);
        assert_approx_eq!(first.x, 100.0 - 20.0);
    }

    #[test]
    fn single_full_final_row_ends_double() {
        let layout = compute_layout_with_metrics(&score(3), &tier(), &config(), &metrics()).unwrap();
        assert_eq!(layout.rows.len(), 1);
        let row = &layout.rows[0];
        assert!(row.full && row.last);
        assert_eq!(row.barlines.last().unwrap().kind, BarlineKind::Double);
        let singles = row.barlines.iter().filter(|b| b.kind == BarlineKind::Single).count();
        assert_eq!(singles, 2);
    }

    #[test]
    fn overflowing_glyphs_shrink_to_fit() {
        let wide = GlyphMetrics::from_sizes([(0, (600, 265)), (1, (600, 265)), (2, (600, 265))]);
        let layout = compute_layout_with_metrics(&score(4), &tier(), &config(), &wide).unwrap();
        let row = &layout.rows[0];
        // 12 × 600 = 7200 natural on a 2400 px span
        assert_approx_eq!(row.shrink, 2400.0 / 7200.0);
        assert_approx_eq!(row.spacing, 0.0);
        assert_approx_eq!(row.placements[0].height, 265.0 / 3.0);
        assert_approx_eq!(row.placements.last().unwrap().right(), 2500.0);
        // The partial row fits and keeps natural size
        assert_eq!(layout.rows[1].shrink, 1.0);
    }

    #[test]
    fn fixed_widths_align_measures_across_rows() {
        let cfg = LayoutConfig {
            width_policy: GlyphWidthPolicy::Fixed,
            partial_row_spacing: PartialRowSpacing::MatchFullRows,
            ..config()
        };
        let layout = compute_layout_with_metrics(&score(5), &tier(), &cfg, &metrics()).unwrap();
        let (a, b) = (&layout.rows[0], &layout.rows[1]);
        assert_approx_eq!(a.spacing, b.spacing);
        for (pa, pb) in a.placements.iter().zip(&b.placements) {
            assert_approx_eq!(pa.x, pb.x);
            assert_approx_eq!(pa.width, pb.width);
        }
        assert_approx_eq!(a.barlines[0].x, b.barlines[0].x);
    }

    #[test]
    fn rows_stack_downwards() {
        let layout = compute_layout_with_metrics(&score(8), &tier(), &config(), &metrics()).unwrap();
        assert_eq!(layout.rows.len(), 3);
        for (i, row) in layout.rows.iter().enumerate() {
            assert_approx_eq!(row.y, 30.0 + i as f64 * 320.0);
            assert!(row.placements.iter().all(|p| (p.y - row.y).abs() < EPS));
        }
        assert_eq!(layout.height, 30 + 3 * 320);
    }

    #[test]
    fn scaling_geometry_scales_every_coordinate() {
        let base = compute_layout_with_metrics(&score(7), &tier(), &config(), &metrics()).unwrap();
        let s = 0.37;
        let scaled_geometry = base.geometry.scaled(s);
        let m = metrics();
        let p = &tier();
        let sc = score(7);
        let scaled_rows: Vec<RowLayout> = sc
            .rows(3)
            .enumerate()
            .map(|(i, ms)| layout_row(ms, i, i == 2, ms.len() == p.measures_per_row, &scaled_geometry, &m).unwrap())
            .collect();

        for (a, b) in base.rows.iter().zip(&scaled_rows) {
            for (pa, pb) in a.placements.iter().zip(&b.placements) {
                assert_approx_eq!(pa.x * s, pb.x, EPS);
                assert_approx_eq!(pa.y * s, pb.y, EPS);
                assert_approx_eq!(pa.width * s, pb.width, EPS);
                assert_approx_eq!(pa.height * s, pb.height, EPS);
            }
            for (ba, bb) in a.barlines.iter().zip(&b.barlines) {
                assert_eq!(ba.kind, bb.kind);
                assert_approx_eq!(ba.x * s, bb.x, EPS);
                assert_approx_eq!(ba.stroke_width * s, bb.stroke_width, EPS);
                assert_approx_eq!(ba.gap * s, bb.gap, EPS);
            }
        }
    }

    #[test]
    fn envelope_bounds_the_canvas() {
        let cfg = LayoutConfig {
            envelope: Some(Envelope { max_width: 800, max_height: 600 }),
            ..Default::default()
        };
        let layout = compute_layout_with_metrics(&score(27), &tier(), &cfg, &metrics()).unwrap();
        assert!(layout.width <= 800 && layout.height <= 600);
        assert!(layout.geometry.scale < 1.0);
        for row in &layout.rows {
            assert!(row.placements.last().unwrap().right() <= layout.width as f64 + EPS);
            assert!(row.y + layout.geometry.note_height <= layout.height as f64 + 1.0);
        }
    }

    #[test]
    fn unknown_glyph_fails_layout() {
        let mut sc = score(1);
        sc.measures[0].beats[2] = 9;
        let err = compute_layout_with_metrics(&sc, &tier(), &config(), &metrics()).unwrap_err();
        assert!(matches!(err, crate::error::RhythmError::GlyphNotFound(9)));
    }
}
