//! Glyph lookup: maps a [`GlyphId`] to its bitmap.
//!
//! The renderer only reads glyphs. Bitmaps are shared through `Arc`, so a
//! single [`GlyphSet`] can serve concurrent renders.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use tracing::debug;

use crate::error::{Result, RhythmError};
use crate::model::GlyphId;

/// Source of glyph bitmaps.
pub trait GlyphProvider {
    /// Bitmap for `id`, if the asset exists.
    fn get(&self, id: GlyphId) -> Option<Arc<RgbaImage>>;

    /// Like [`get`](Self::get), but a missing asset is an error.
    fn glyph(&self, id: GlyphId) -> Result<Arc<RgbaImage>> {
        self.get(id).ok_or(RhythmError::GlyphNotFound(id))
    }

    /// Natural `(width, height)` of a glyph in pixels.
    fn dimensions(&self, id: GlyphId) -> Result<(u32, u32)> {
        let img = self.glyph(id)?;
        Ok(img.dimensions())
    }
}

impl<G: GlyphProvider + ?Sized> GlyphProvider for &G {
    fn get(&self, id: GlyphId) -> Option<Arc<RgbaImage>> {
        (**self).get(id)
    }
}

/// In-memory glyph table, optionally filled from a directory of PNGs.
#[derive(Debug, Clone, Default)]
pub struct GlyphSet {
    glyphs: HashMap<GlyphId, Arc<RgbaImage>>,
}

impl GlyphSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `<id>.png` in `dir`. Files whose stem is not a number
    /// are ignored.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut set = Self::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_png = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("png"));
            if !is_png {
                continue;
            }
            let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<GlyphId>().ok())
            else {
                continue;
            };
            let img = image::open(&path)
                .map_err(|source| RhythmError::GlyphLoad { path: path.clone(), source })?
                .into_rgba8();
            set.insert(id, img);
        }
        debug!(dir = %dir.display(), count = set.len(), "loaded glyph set");
        Ok(set)
    }

    /// Decode a glyph from PNG bytes and add it.
    pub fn insert_png(&mut self, id: GlyphId, png: &[u8]) -> Result<()> {
        let img = image::load_from_memory(png)?.into_rgba8();
        self.insert(id, img);
        Ok(())
    }

    pub fn insert(&mut self, id: GlyphId, image: RgbaImage) {
        self.glyphs.insert(id, Arc::new(image));
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn contains(&self, id: GlyphId) -> bool {
        self.glyphs.contains_key(&id)
    }
}

impl GlyphProvider for GlyphSet {
    fn get(&self, id: GlyphId) -> Option<Arc<RgbaImage>> {
        self.glyphs.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn write_png(path: &Path, w: u32, h: u32) {
        RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 255])).save(path).unwrap();
    }

    #[test]
    fn loads_numbered_pngs_only() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("0.png"), 10, 20);
        write_png(&dir.path().join("15.png"), 30, 20);
        write_png(&dir.path().join("logo.png"), 5, 5);
        std::fs::write(dir.path().join("3.txt"), "not an image").unwrap();

        let set = GlyphSet::from_dir(dir.path()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.dimensions(0).unwrap(), (10, 20));
        assert_eq!(set.dimensions(15).unwrap(), (30, 20));
        assert!(!set.contains(3));
    }

    #[test]
    fn corrupt_asset_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("4.png"), b"garbage").unwrap();
        match GlyphSet::from_dir(dir.path()) {
            Err(RhythmError::GlyphLoad { path, .. }) => assert!(path.ends_with("4.png")),
            other => panic!("expected GlyphLoad, got {other:?}"),
        }
    }

    #[test]
    fn glyphs_decode_from_png_bytes() {
        let mut png = Vec::new();
        image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(12, 30, Rgba([0, 0, 0, 255])))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let mut set = GlyphSet::new();
        set.insert_png(6, &png).unwrap();
        assert_eq!(set.dimensions(6).unwrap(), (12, 30));

        let err = set.insert_png(7, b"not a png").unwrap_err();
        assert!(matches!(err, RhythmError::Encode(_)));
        assert!(!set.contains(7));
    }

    #[test]
    fn missing_glyph_is_an_error() {
        let set = GlyphSet::new();
        assert!(set.get(9).is_none());
        assert!(matches!(set.glyph(9), Err(RhythmError::GlyphNotFound(9))));
    }
}
