//! Difficulty tiers: which glyphs each level may use and how its rows wrap.

use std::collections::HashSet;

use serde::Deserialize;

use crate::error::{Result, RhythmError};
use crate::model::{DifficultyTier, GlyphId};

/// Longest worksheet for the two beginner tiers.
const BEGINNER_MAX_MEASURES: u32 = 27;
/// Longest worksheet for the remaining tiers.
const STANDARD_MAX_MEASURES: u32 = 18;
/// Widest row a tier may ask for.
const MAX_MEASURES_PER_ROW: usize = 64;

/// Immutable lookup from tier id to [`DifficultyTier`], in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepertoireTable {
    tiers: Vec<DifficultyTier>,
}

#[derive(Deserialize)]
struct TableFile {
    tiers: Vec<DifficultyTier>,
}

impl RepertoireTable {
    /// Build a table, rejecting malformed tiers.
    pub fn new(tiers: Vec<DifficultyTier>) -> Result<Self> {
        let mut seen = HashSet::new();
        for tier in &tiers {
            if !seen.insert(tier.id.as_str()) {
                return Err(RhythmError::InvalidTierTable(format!(
                    "duplicate tier '{}'",
                    tier.id
                )));
            }
            if tier.glyphs.is_empty() {
                return Err(RhythmError::EmptyRepertoire(tier.id.clone()));
            }
            if tier.measures_per_row == 0 {
                return Err(RhythmError::InvalidTierTable(format!(
                    "tier '{}' must place at least one measure per row",
                    tier.id
                )));
            }
            if tier.measures_per_row > MAX_MEASURES_PER_ROW {
                return Err(RhythmError::InvalidTierTable(format!(
                    "tier '{}' places {} measures per row, more than the limit of {}",
                    tier.id, tier.measures_per_row, MAX_MEASURES_PER_ROW
                )));
            }
            if tier.min_measures == 0 || tier.min_measures > tier.max_measures {
                return Err(RhythmError::InvalidTierTable(format!(
                    "tier '{}' has an invalid measure range [{}, {}]",
                    tier.id, tier.min_measures, tier.max_measures
                )));
            }
        }
        Ok(Self { tiers })
    }

    /// Parse a table from JSON of the form `{"tiers": [{...}, ...]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: TableFile = serde_json::from_str(json)?;
        Self::new(file.tiers)
    }

    pub fn get(&self, id: &str) -> Result<&DifficultyTier> {
        self.tiers
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| RhythmError::UnknownDifficulty(id.to_string()))
    }

    pub fn tiers(&self) -> &[DifficultyTier] {
        &self.tiers
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.tiers.iter().map(|t| t.id.as_str())
    }
}

impl Default for RepertoireTable {
    /// The six stock tiers. Glyph ids refer to `0.png` … `15.png`.
    fn default() -> Self {
        let tier = |id: &str, glyphs: Vec<GlyphId>, per_row: usize, max: u32| {
            DifficultyTier::new(id, glyphs, per_row, 1, max)
        };
        Self {
            tiers: vec![
                tier("beginner", vec![0, 1, 2], 3, BEGINNER_MAX_MEASURES),
                tier("beginner+", vec![0, 1, 2, 3], 3, BEGINNER_MAX_MEASURES),
                tier("intermediate", vec![0, 1, 4, 5, 6, 7, 15], 2, STANDARD_MAX_MEASURES),
                tier(
                    "intermediate+",
                    vec![0, 1, 2, 3, 4, 5, 6, 7, 15],
                    2,
                    STANDARD_MAX_MEASURES,
                ),
                tier(
                    "advanced",
                    vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 15],
                    2,
                    STANDARD_MAX_MEASURES,
                ),
                tier("professional", (0..16).collect(), 2, STANDARD_MAX_MEASURES),
            ],
        }
    }
}
