//! Render settings: layout parameters, page setup and count policy.
//!
//! Everything here is an immutable value handed to the renderer, so
//! concurrent renders can run with different presets. Defaults reproduce
//! the stock worksheet (2600 px wide sheet, 265 px notes, A4 export).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RhythmError};
use crate::export::PageSpec;
use crate::renderer::constants::*;

/// What to do with a measure count below the tier minimum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BelowMinimumPolicy {
    /// Raise to the tier minimum
    #[default]
    Raise,
    /// Fail with `MeasureCountBelowMinimum`
    Reject,
    /// Take the count as-is
    Permit,
}

/// How glyph widths are chosen before a row is justified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlyphWidthPolicy {
    /// Every glyph gets the tier's average width, so measures line up
    /// across rows.
    Fixed,
    /// Each glyph keeps its natural aspect ratio at note height.
    #[default]
    Proportional,
}

/// Spacing used on a row that holds fewer measures than a full row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialRowSpacing {
    /// Glyphs butt against each other
    #[default]
    Packed,
    /// Use the spacing a full row of average glyphs would get
    MatchFullRows,
}

/// Largest canvas the composed score may occupy, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub max_width: u32,
    pub max_height: u32,
}

/// Nominal (unscaled) layout parameters in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub sheet_width: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    /// Height of every glyph before any shrink
    pub note_height: f64,
    /// Blank space below each row
    pub row_gap: f64,
    pub barline_width: f64,
    /// Distance between the two strokes of the final double barline
    pub double_barline_gap: f64,
    /// Distance from the outermost glyph to a row's edge stroke
    pub edge_padding: f64,
    /// Draw a stroke at the left edge of every row
    pub left_edge_line: bool,
    pub width_policy: GlyphWidthPolicy,
    pub partial_row_spacing: PartialRowSpacing,
    /// `None` disables the global scale-down
    pub envelope: Option<Envelope>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            sheet_width: SHEET_WIDTH,
            margin_left: MARGIN_LEFT,
            margin_right: MARGIN_RIGHT,
            margin_top: MARGIN_TOP,
            margin_bottom: MARGIN_BOTTOM,
            note_height: NOTE_HEIGHT,
            row_gap: ROW_GAP,
            barline_width: BARLINE_WIDTH,
            double_barline_gap: DOUBLE_BARLINE_GAP,
            edge_padding: EDGE_PADDING,
            left_edge_line: false,
            width_policy: GlyphWidthPolicy::default(),
            partial_row_spacing: PartialRowSpacing::default(),
            envelope: Some(Envelope {
                max_width: SHEET_WIDTH as u32,
                max_height: (SHEET_WIDTH * A4_HEIGHT_PT / A4_WIDTH_PT).round() as u32,
            }),
        }
    }
}

impl LayoutConfig {
    /// Width between the left and right margins.
    pub fn usable_width(&self) -> f64 {
        self.sheet_width - self.margin_left - self.margin_right
    }

    pub fn validate(&self) -> Result<()> {
        let lengths = [
            ("sheet_width", self.sheet_width),
            ("margin_left", self.margin_left),
            ("margin_right", self.margin_right),
            ("margin_top", self.margin_top),
            ("margin_bottom", self.margin_bottom),
            ("note_height", self.note_height),
            ("row_gap", self.row_gap),
            ("barline_width", self.barline_width),
            ("double_barline_gap", self.double_barline_gap),
            ("edge_padding", self.edge_padding),
        ];
        if let Some((name, value)) = lengths.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(RhythmError::InvalidLayout(format!("{name} must be a non-negative length, got {value}")));
        }
        if self.note_height <= 0.0 {
            return Err(RhythmError::InvalidLayout("note_height must be positive".into()));
        }
        if self.usable_width() <= 0.0 {
            return Err(RhythmError::InvalidLayout(format!(
                "margins ({} + {}) leave no room on a {} px sheet",
                self.margin_left, self.margin_right, self.sheet_width
            )));
        }
        // The double barline's second stroke must land inside the right margin.
        let trailing_reach = self.edge_padding + self.double_barline_gap + self.barline_width / 2.0;
        if self.margin_right < trailing_reach {
            return Err(RhythmError::InvalidLayout(format!(
                "margin_right {} cannot hold the closing double barline ({trailing_reach} px needed)",
                self.margin_right
            )));
        }
        let leading_reach = self.edge_padding + self.barline_width / 2.0;
        if self.left_edge_line && self.margin_left < leading_reach {
            return Err(RhythmError::InvalidLayout(format!(
                "margin_left {} cannot hold the left edge line ({leading_reach} px needed)",
                self.margin_left
            )));
        }
        if let Some(env) = self.envelope {
            if env.max_width == 0 || env.max_height == 0 {
                return Err(RhythmError::InvalidLayout("envelope must be non-empty".into()));
            }
        }
        Ok(())
    }
}

/// Everything a [`crate::Renderer`] needs besides the tiers and glyphs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub layout: LayoutConfig,
    pub page: PageSpec,
    pub below_minimum: BelowMinimumPolicy,
}

impl Settings {
    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
