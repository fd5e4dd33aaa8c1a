//! rhythmlib: randomized rhythm worksheet generation for RhythmSheet.
//!
//! A worksheet is drawn from a difficulty tier's glyph repertoire, laid out
//! into justified rows with measure barlines and a final double barline,
//! and composed into one RGB raster that can be exported as an A4 PDF.
//!
//! # Example
//! ```no_run
//! use rhythmlib::{GlyphSet, Renderer};
//!
//! let glyphs = GlyphSet::from_dir("pics").unwrap();
//! let renderer = Renderer::new(glyphs);
//! let sheet = renderer.render("beginner", 8).unwrap();
//! let pdf = renderer.export_to_page(&sheet).unwrap();
//! std::fs::write("sheet_music.pdf", pdf).unwrap();
//! ```

pub mod error;
pub mod export;
pub mod glyphs;
pub mod model;
pub mod renderer;
pub mod repertoire;
pub mod sampler;
pub mod settings;

#[cfg(target_os = "android")]
pub mod android;

use std::path::Path;

use image::RgbImage;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub use error::{ErrorKind, Result, RhythmError};
pub use export::{
    decode_png, encode_png, export_to_file, export_to_page, fit_to_page, save_png, PageFit,
    PagePlacement, PageSpec,
};
pub use glyphs::{GlyphProvider, GlyphSet};
pub use model::*;
pub use renderer::{
    compute_layout, default_preview, layout_row, layout_to_json, preview, render_layout,
    render_score, Barline, BarlineKind, GlyphMetrics, GlyphPlacement, LayoutGeometry, RowLayout,
    ScoreLayout,
};
pub use repertoire::RepertoireTable;
pub use sampler::{resolve_measure_count, sample};
pub use settings::{
    BelowMinimumPolicy, Envelope, GlyphWidthPolicy, LayoutConfig, PartialRowSpacing, Settings,
};

/// Tier table, settings and glyph source bundled for repeated renders.
///
/// A `Renderer` holds no mutable state; each call samples with its own
/// generator and allocates its own canvas, so one instance can be shared
/// across threads when `G` is `Sync`.
#[derive(Debug, Clone)]
pub struct Renderer<G> {
    table: RepertoireTable,
    settings: Settings,
    glyphs: G,
}

impl<G: GlyphProvider> Renderer<G> {
    /// Stock tiers and default settings.
    pub fn new(glyphs: G) -> Self {
        Self::with_settings(glyphs, RepertoireTable::default(), Settings::default())
    }

    pub fn with_settings(glyphs: G, table: RepertoireTable, settings: Settings) -> Self {
        Self { table, settings, glyphs }
    }

    pub fn table(&self) -> &RepertoireTable {
        &self.table
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn glyphs(&self) -> &G {
        &self.glyphs
    }

    /// Draw a score for `difficulty` without rendering it.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        difficulty: &str,
        measure_count: i64,
        rng: &mut R,
    ) -> Result<Score> {
        let tier = self.table.get(difficulty)?;
        sampler::sample(tier, measure_count, self.settings.below_minimum, rng)
    }

    /// Geometry for an already-sampled score.
    pub fn layout(&self, score: &Score) -> Result<ScoreLayout> {
        let tier = self.table.get(&score.difficulty)?;
        compute_layout(score, tier, &self.settings.layout, &self.glyphs)
    }

    /// Raster for an already-sampled score.
    pub fn render_score(&self, score: &Score) -> Result<RgbImage> {
        let tier = self.table.get(&score.difficulty)?;
        renderer::render_score(score, tier, &self.settings.layout, &self.glyphs)
    }

    /// Render a fresh worksheet, seeded from OS entropy.
    pub fn render(&self, difficulty: &str, measure_count: i64) -> Result<RgbImage> {
        self.render_with_rng(difficulty, measure_count, &mut ChaCha8Rng::from_entropy())
    }

    /// Render a worksheet that is reproducible for a given `seed`.
    pub fn render_seeded(&self, difficulty: &str, measure_count: i64, seed: u64) -> Result<RgbImage> {
        self.render_with_rng(difficulty, measure_count, &mut ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn render_with_rng<R: Rng + ?Sized>(
        &self,
        difficulty: &str,
        measure_count: i64,
        rng: &mut R,
    ) -> Result<RgbImage> {
        let score = self.sample(difficulty, measure_count, rng)?;
        self.render_score(&score)
    }

    /// Render straight to PNG bytes.
    pub fn render_png(&self, difficulty: &str, measure_count: i64, seed: Option<u64>) -> Result<Vec<u8>> {
        let image = match seed {
            Some(seed) => self.render_seeded(difficulty, measure_count, seed)?,
            None => self.render(difficulty, measure_count)?,
        };
        encode_png(&image)
    }

    /// Fit `image` onto the configured page and return the PDF bytes.
    pub fn export_to_page(&self, image: &RgbImage) -> Result<Vec<u8>> {
        export::export_to_page(image, &self.settings.page)
    }
}

/// Load glyphs from `glyph_dir` and render one worksheet with stock
/// settings. Pass `seed` to make the result reproducible.
pub fn render_worksheet<P: AsRef<Path>>(
    glyph_dir: P,
    difficulty: &str,
    measure_count: i64,
    seed: Option<u64>,
) -> Result<RgbImage> {
    let renderer = Renderer::new(GlyphSet::from_dir(glyph_dir)?);
    match seed {
        Some(seed) => renderer.render_seeded(difficulty, measure_count, seed),
        None => renderer.render(difficulty, measure_count),
    }
}

/// [`render_worksheet`], encoded as PNG.
pub fn render_worksheet_png<P: AsRef<Path>>(
    glyph_dir: P,
    difficulty: &str,
    measure_count: i64,
    seed: Option<u64>,
) -> Result<Vec<u8>> {
    let image = render_worksheet(glyph_dir, difficulty, measure_count, seed)?;
    encode_png(&image)
}

/// Convert a worksheet PNG into a single-page A4 PDF.
pub fn export_png_to_pdf(png: &[u8]) -> Result<Vec<u8>> {
    let image = decode_png(png)?;
    export::export_to_page(&image, &PageSpec::default())
}

// ═══════════════════════════════════════════════════════════════════════
// C FFI: for iOS (static library) and Android (JNI)
// ═══════════════════════════════════════════════════════════════════════

use std::ffi::CStr;
use std::os::raw::c_char;

/// Hand a byte buffer to C. Pair with `rhythmlib_free_buffer`.
///
/// # Safety
/// `out_len` must be non-null and writable.
unsafe fn into_c_buffer(bytes: Vec<u8>, out_len: *mut usize) -> *mut u8 {
    let boxed = bytes.into_boxed_slice();
    unsafe { *out_len = boxed.len() };
    Box::into_raw(boxed) as *mut u8
}

/// Render a worksheet to PNG bytes.
/// The caller must free the returned buffer with `rhythmlib_free_buffer`.
///
/// `seed` of 0 draws a fresh worksheet; any other value is reproducible.
/// Returns null on any error.
///
/// # Safety
/// `glyph_dir` and `difficulty` must be valid null-terminated UTF-8 C
/// strings, and `out_len` must point to writable memory.
#[no_mangle]
pub unsafe extern "C" fn rhythmlib_render_png(
    glyph_dir: *const c_char,
    difficulty: *const c_char,
    measure_count: i32,
    seed: u64,
    out_len: *mut usize,
) -> *mut u8 {
    if glyph_dir.is_null() || difficulty.is_null() || out_len.is_null() {
        return std::ptr::null_mut();
    }
    let dir = match unsafe { CStr::from_ptr(glyph_dir) }.to_str() {
        Ok(s) => s,
        Err(_) => return std::ptr::null_mut(),
    };
    let difficulty = match unsafe { CStr::from_ptr(difficulty) }.to_str() {
        Ok(s) => s,
        Err(_) => return std::ptr::null_mut(),
    };
    let seed = if seed == 0 { None } else { Some(seed) };

    match render_worksheet_png(dir, difficulty, measure_count as i64, seed) {
        Ok(png) => unsafe { into_c_buffer(png, out_len) },
        Err(_) => std::ptr::null_mut(),
    }
}

/// Convert PNG bytes into a single-page A4 PDF.
/// The caller must free the returned buffer with `rhythmlib_free_buffer`.
///
/// # Safety
/// `png` must point to `len` valid bytes and `out_len` to writable memory.
#[no_mangle]
pub unsafe extern "C" fn rhythmlib_export_pdf(
    png: *const u8,
    len: usize,
    out_len: *mut usize,
) -> *mut u8 {
    if png.is_null() || len == 0 || out_len.is_null() {
        return std::ptr::null_mut();
    }
    let bytes = unsafe { std::slice::from_raw_parts(png, len) };
    match export_png_to_pdf(bytes) {
        Ok(pdf) => unsafe { into_c_buffer(pdf, out_len) },
        Err(_) => std::ptr::null_mut(),
    }
}

/// Free a buffer previously returned by rhythmlib functions.
///
/// # Safety
/// `ptr` and `len` must come from the same rhythmlib call, or `ptr` is null.
#[no_mangle]
pub unsafe extern "C" fn rhythmlib_free_buffer(ptr: *mut u8, len: usize) {
    if !ptr.is_null() {
        unsafe {
            let _ = Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len));
        }
    }
}
