//! Shared constants for the worksheet renderer (pixels unless noted).

// ── Sheet & margins ─────────────────────────────────────────────────
pub(crate) const SHEET_WIDTH: f64 = 2600.0;
pub(crate) const MARGIN_LEFT: f64 = 100.0;
pub(crate) const MARGIN_RIGHT: f64 = 100.0;
pub(crate) const MARGIN_TOP: f64 = 30.0;
pub(crate) const MARGIN_BOTTOM: f64 = 0.0;

// ── Rows ────────────────────────────────────────────────────────────
pub(crate) const NOTE_HEIGHT: f64 = 265.0;
pub(crate) const ROW_GAP: f64 = 55.0; // blank space under each row

// ── Barlines ────────────────────────────────────────────────────────
pub(crate) const BARLINE_WIDTH: f64 = 3.0;
pub(crate) const DOUBLE_BARLINE_GAP: f64 = 14.0;
pub(crate) const EDGE_PADDING: f64 = 20.0;

// ── Page (points, 72 per inch) ──────────────────────────────────────
pub(crate) const POINTS_PER_INCH: f64 = 72.0;
pub(crate) const A4_WIDTH_PT: f64 = 595.0;
pub(crate) const A4_HEIGHT_PT: f64 = 842.0;
pub(crate) const PAGE_MARGIN_LEFT_IN: f64 = 0.74653;
pub(crate) const PAGE_MARGIN_IN: f64 = 0.5;

// ── Preview ─────────────────────────────────────────────────────────
pub(crate) const PREVIEW_WIDTH: u32 = 800;

// ── Colors ──────────────────────────────────────────────────────────
pub(crate) const BACKGROUND: [u8; 4] = [255, 255, 255, 255];
pub(crate) const BARLINE_COLOR: [u8; 4] = [0, 0, 0, 255];
