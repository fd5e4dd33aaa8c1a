//! Data model for a sampled rhythm worksheet.
//!
//! These structures capture what a render needs: which glyph sits on
//! which beat, how beats group into measures, and how measures wrap
//! into rows.

use serde::{Deserialize, Serialize};

/// Key into the glyph provider (e.g. `3` → `pics/3.png`).
pub type GlyphId = u16;

/// Beats per measure. Every worksheet is in 4/4.
pub const BEATS_PER_MEASURE: usize = 4;

/// A named difficulty level with its own glyph repertoire and row geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyTier {
    /// Tier key (e.g., "beginner")
    pub id: String,
    /// Glyphs a beat may be drawn from
    pub glyphs: Vec<GlyphId>,
    /// Measures laid out on one staff line
    pub measures_per_row: usize,
    /// Smallest measure count a worksheet may have
    pub min_measures: u32,
    /// Largest measure count a worksheet may have
    pub max_measures: u32,
}

impl DifficultyTier {
    pub fn new(
        id: impl Into<String>,
        glyphs: Vec<GlyphId>,
        measures_per_row: usize,
        min_measures: u32,
        max_measures: u32,
    ) -> Self {
        Self {
            id: id.into(),
            glyphs,
            measures_per_row,
            min_measures,
            max_measures,
        }
    }

    /// Beats on a full row of this tier.
    pub fn beats_per_row(&self) -> usize {
        self.measures_per_row.saturating_mul(BEATS_PER_MEASURE)
    }
}

/// One bar of four beats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    pub beats: [GlyphId; BEATS_PER_MEASURE],
}

/// A sampled worksheet: the tier it came from and its measures in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    /// Id of the tier the beats were drawn from
    pub difficulty: String,
    /// Measures in reading order
    pub measures: Vec<Measure>,
}

impl Score {
    pub fn measure_count(&self) -> usize {
        self.measures.len()
    }

    pub fn beat_count(&self) -> usize {
        self.measures.len() * BEATS_PER_MEASURE
    }

    /// All beats in reading order.
    pub fn beats(&self) -> impl Iterator<Item = GlyphId> + '_ {
        self.measures.iter().flat_map(|m| m.beats.iter().copied())
    }

    /// Split into rows of `measures_per_row`. Only the last row may be short.
    pub fn rows(&self, measures_per_row: usize) -> std::slice::Chunks<'_, Measure> {
        self.measures.chunks(measures_per_row.max(1))
    }

    pub fn row_count(&self, measures_per_row: usize) -> usize {
        self.measures.len().div_ceil(measures_per_row.max(1))
    }
}
