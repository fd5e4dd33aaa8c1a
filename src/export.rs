//! Document export: fits a composed worksheet onto an A4 page and writes
//! it as a single-page PDF, plus PNG encoding and atomic file output.
//!
//! Page numbers are in PDF points (72 per inch) with the origin at the
//! top-left of the page; the conversion to PDF's bottom-left origin
//! happens only when the content stream is written.

use std::io::{Cursor, Write};
use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbImage};
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, RhythmError};
use crate::renderer::constants::*;

/// Where the fitted image sits inside the printable area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagePlacement {
    /// Flush to the left and top margins
    #[default]
    TopLeft,
    /// Centered in the printable area
    Centered,
}

/// Physical page setup, in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSpec {
    pub width: f64,
    pub height: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub placement: PagePlacement,
}

impl Default for PageSpec {
    /// A4 portrait with a 0.74653 in left margin and 0.5 in elsewhere.
    fn default() -> Self {
        Self {
            width: A4_WIDTH_PT,
            height: A4_HEIGHT_PT,
            margin_left: PAGE_MARGIN_LEFT_IN * POINTS_PER_INCH,
            margin_right: PAGE_MARGIN_IN * POINTS_PER_INCH,
            margin_top: PAGE_MARGIN_IN * POINTS_PER_INCH,
            margin_bottom: PAGE_MARGIN_IN * POINTS_PER_INCH,
            placement: PagePlacement::default(),
        }
    }
}

impl PageSpec {
    pub fn usable_width(&self) -> f64 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn usable_height(&self) -> f64 {
        self.height - self.margin_top - self.margin_bottom
    }
}

/// Where an image lands on the page, measured from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageFit {
    /// Points per image pixel
    pub scale: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Fit a `width × height` pixel image into the page's printable area.
pub fn fit_to_page(width: u32, height: u32, page: &PageSpec) -> Result<PageFit> {
    if width == 0 || height == 0 {
        return Err(RhythmError::InvalidImage { width, height });
    }
    let usable_w = page.usable_width();
    let usable_h = page.usable_height();
    if usable_w <= 0.0 || usable_h <= 0.0 {
        return Err(RhythmError::InvalidLayout(format!(
            "page margins leave no printable area on a {}x{} pt page",
            page.width, page.height
        )));
    }

    let scale = (usable_w / width as f64).min(usable_h / height as f64);
    let fitted_w = width as f64 * scale;
    let fitted_h = height as f64 * scale;
    let (x, y) = match page.placement {
        PagePlacement::TopLeft => (page.margin_left, page.margin_top),
        PagePlacement::Centered => (
            page.margin_left + (usable_w - fitted_w) / 2.0,
            page.margin_top + (usable_h - fitted_h) / 2.0,
        ),
    };

    Ok(PageFit { scale, x, y, width: fitted_w, height: fitted_h })
}

/// Render `image` onto a single PDF page. Output is byte-for-byte
/// reproducible for the same image and page.
pub fn export_to_page(image: &RgbImage, page: &PageSpec) -> Result<Vec<u8>> {
    let (w, h) = image.dimensions();
    let fit = fit_to_page(w, h, page)?;

    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let page_id = Ref::new(3);
    let image_id = Ref::new(4);
    let content_id = Ref::new(5);
    let image_name = Name(b"Im1");

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);

    let mut pdf_page = pdf.page(page_id);
    pdf_page.media_box(Rect::new(0.0, 0.0, page.width as f32, page.height as f32));
    pdf_page.parent(page_tree_id);
    pdf_page.contents(content_id);
    pdf_page.resources().x_objects().pair(image_name, image_id);
    pdf_page.finish();

    let compressed = miniz_oxide::deflate::compress_to_vec_zlib(image.as_raw(), 6);
    let mut xobject = pdf.image_xobject(image_id, &compressed);
    xobject.filter(Filter::FlateDecode);
    xobject.width(w as i32);
    xobject.height(h as i32);
    xobject.color_space().device_rgb();
    xobject.bits_per_component(8);
    xobject.finish();

    // PDF y grows upwards from the bottom edge.
    let bottom = page.height - fit.y - fit.height;
    let mut content = Content::new();
    content.save_state();
    content.transform([
        fit.width as f32,
        0.0,
        0.0,
        fit.height as f32,
        fit.x as f32,
        bottom as f32,
    ]);
    content.x_object(image_name);
    content.restore_state();
    pdf.stream(content_id, &content.finish());

    let bytes = pdf.finish();
    info!(
        image_width = w,
        image_height = h,
        scale = fit.scale,
        x = fit.x,
        y = fit.y,
        bytes = bytes.len(),
        "exported worksheet page"
    );
    Ok(bytes)
}

/// Encode an image as PNG.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return Err(RhythmError::InvalidImage { width: w, height: h });
    }
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(image.clone()).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

/// Decode PNG (or any enabled format) bytes into an RGB image.
pub fn decode_png(bytes: &[u8]) -> Result<RgbImage> {
    Ok(image::load_from_memory(bytes)?.into_rgb8())
}

/// Write the PDF page for `image` to `path`.
pub fn export_to_file<P: AsRef<Path>>(image: &RgbImage, page: &PageSpec, path: P) -> Result<()> {
    let pdf = export_to_page(image, page)?;
    write_atomic(path.as_ref(), &pdf)
}

/// Write `image` as a PNG file at `path`.
pub fn save_png<P: AsRef<Path>>(image: &RgbImage, path: P) -> Result<()> {
    let png = encode_png(image)?;
    write_atomic(path.as_ref(), &png)
}

/// Write through a temporary file next to `path`, then rename it into
/// place. The temporary is removed if any step fails.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| RhythmError::Io(e.error))?;
    Ok(())
}
