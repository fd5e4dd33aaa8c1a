//! Geometry derivation: turns a `LayoutConfig`, a tier and the glyph
//! metrics into the one shared `LayoutGeometry` every row is laid out with.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{Result, RhythmError};
use crate::glyphs::GlyphProvider;
use crate::model::{DifficultyTier, GlyphId};
use crate::settings::{Envelope, GlyphWidthPolicy, LayoutConfig, PartialRowSpacing};

// ═══════════════════════════════════════════════════════════════════════
// Glyph metrics
// ═══════════════════════════════════════════════════════════════════════

/// Natural pixel size of every glyph a render may place.
#[derive(Debug, Clone, Default)]
pub struct GlyphMetrics {
    natural: HashMap<GlyphId, (f64, f64)>,
}

impl GlyphMetrics {
    /// Look up each id once. Fails on the first id without an asset.
    pub fn resolve<G, I>(glyphs: &G, ids: I) -> Result<Self>
    where
        G: GlyphProvider + ?Sized,
        I: IntoIterator<Item = GlyphId>,
    {
        let mut natural = HashMap::new();
        for id in ids {
            if natural.contains_key(&id) {
                continue;
            }
            let (w, h) = glyphs.dimensions(id)?;
            natural.insert(id, (w as f64, h as f64));
        }
        Ok(Self { natural })
    }

    /// Build metrics from known sizes, without touching any bitmap.
    pub fn from_sizes<I: IntoIterator<Item = (GlyphId, (u32, u32))>>(sizes: I) -> Self {
        Self {
            natural: sizes
                .into_iter()
                .map(|(id, (w, h))| (id, (w as f64, h as f64)))
                .collect(),
        }
    }

    /// Width of `id` when drawn `note_height` tall with its aspect kept.
    pub fn width_at(&self, id: GlyphId, note_height: f64) -> Result<f64> {
        let &(w, h) = self.natural.get(&id).ok_or(RhythmError::GlyphNotFound(id))?;
        if h <= 0.0 {
            return Ok(0.0);
        }
        Ok(w * note_height / h)
    }

    /// Mean of [`width_at`](Self::width_at) over `ids`.
    pub fn average_width(&self, ids: &[GlyphId], note_height: f64) -> Result<f64> {
        if ids.is_empty() {
            return Ok(0.0);
        }
        let mut total = 0.0;
        for &id in ids {
            total += self.width_at(id, note_height)?;
        }
        Ok(total / ids.len() as f64)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Layout geometry
// ═══════════════════════════════════════════════════════════════════════

/// Lengths shared by every row of one render, already scaled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutGeometry {
    /// Global factor applied to the nominal config (≤ 1)
    pub scale: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub note_height: f64,
    pub row_gap: f64,
    pub barline_width: f64,
    pub double_barline_gap: f64,
    pub edge_padding: f64,
    pub left_edge_line: bool,
    /// Width every glyph takes under `GlyphWidthPolicy::Fixed`
    pub fixed_note_width: Option<f64>,
    /// Spacing a full row of average-width glyphs would get
    pub nominal_spacing: f64,
    pub partial_row_spacing: PartialRowSpacing,
    pub beats_per_row: usize,
    pub row_count: usize,
    #[serde(skip)]
    pub envelope: Option<Envelope>,
}

impl LayoutGeometry {
    /// Geometry before any envelope scaling.
    pub fn nominal(
        config: &LayoutConfig,
        tier: &DifficultyTier,
        metrics: &GlyphMetrics,
        row_count: usize,
    ) -> Result<Self> {
        config.validate()?;

        let beats_per_row = tier.beats_per_row();
        let usable = config.usable_width();
        let average = metrics.average_width(&tier.glyphs, config.note_height)?;
        let nominal_spacing = if beats_per_row > 1 {
            ((usable - beats_per_row as f64 * average) / (beats_per_row - 1) as f64).max(0.0)
        } else {
            0.0
        };
        let fixed_note_width = match config.width_policy {
            GlyphWidthPolicy::Fixed => Some(average),
            GlyphWidthPolicy::Proportional => None,
        };
        let row_height = config.note_height + config.row_gap;

        Ok(Self {
            scale: 1.0,
            canvas_width: config.sheet_width,
            canvas_height: config.margin_top + row_count as f64 * row_height + config.margin_bottom,
            margin_left: config.margin_left,
            margin_right: config.margin_right,
            margin_top: config.margin_top,
            margin_bottom: config.margin_bottom,
            note_height: config.note_height,
            row_gap: config.row_gap,
            barline_width: config.barline_width,
            double_barline_gap: config.double_barline_gap,
            edge_padding: config.edge_padding,
            left_edge_line: config.left_edge_line,
            fixed_note_width,
            nominal_spacing,
            partial_row_spacing: config.partial_row_spacing,
            beats_per_row,
            row_count,
            envelope: config.envelope,
        })
    }

    /// Factor that brings the canvas inside the envelope; 1 if it already fits.
    pub fn envelope_scale(&self) -> f64 {
        match self.envelope {
            Some(env) if self.canvas_width > 0.0 && self.canvas_height > 0.0 => {
                let sx = env.max_width as f64 / self.canvas_width;
                let sy = env.max_height as f64 / self.canvas_height;
                sx.min(sy).min(1.0)
            }
            _ => 1.0,
        }
    }

    /// Every length multiplied by `s`.
    pub fn scaled(&self, s: f64) -> Self {
        Self {
            scale: self.scale * s,
            canvas_width: self.canvas_width * s,
            canvas_height: self.canvas_height * s,
            margin_left: self.margin_left * s,
            margin_right: self.margin_right * s,
            margin_top: self.margin_top * s,
            margin_bottom: self.margin_bottom * s,
            note_height: self.note_height * s,
            row_gap: self.row_gap * s,
            barline_width: self.barline_width * s,
            double_barline_gap: self.double_barline_gap * s,
            edge_padding: self.edge_padding * s,
            fixed_note_width: self.fixed_note_width.map(|w| w * s),
            nominal_spacing: self.nominal_spacing * s,
            ..self.clone()
        }
    }

    pub fn usable_width(&self) -> f64 {
        self.canvas_width - self.margin_left - self.margin_right
    }

    /// X of the usable area's right boundary.
    pub fn usable_right(&self) -> f64 {
        self.canvas_width - self.margin_right
    }

    pub fn row_height(&self) -> f64 {
        self.note_height + self.row_gap
    }

    /// Top of row `index`.
    pub fn row_y(&self, index: usize) -> f64 {
        self.margin_top + index as f64 * self.row_height()
    }

    /// Canvas size in whole pixels, never larger than the envelope.
    pub fn pixel_size(&self) -> (u32, u32) {
        let mut w = (self.canvas_width.round() as u32).max(1);
        let mut h = (self.canvas_height.round() as u32).max(1);
        if let Some(env) = self.envelope {
            w = w.min(env.max_width);
            h = h.min(env.max_height);
        }
        (w, h)
    }
}

/// Nominal geometry, scaled once so the whole canvas fits the envelope.
pub fn derive_geometry(
    config: &LayoutConfig,
    tier: &DifficultyTier,
    metrics: &GlyphMetrics,
    row_count: usize,
) -> Result<LayoutGeometry> {
    let nominal = LayoutGeometry::nominal(config, tier, metrics, row_count)?;
    let s = nominal.envelope_scale();
    Ok(if s < 1.0 { nominal.scaled(s) } else { nominal })
}
