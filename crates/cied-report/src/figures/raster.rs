//! SVG to PNG rasterisation.

use std::path::Path;

use image::{ImageBuffer, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

use crate::error::{ReportError, Result};
use crate::table::ensure_parent;

/// 6 x 4 inches at 300 dpi.
pub const FIGURE_WIDTH: u32 = 1800;
pub const FIGURE_HEIGHT: u32 = 1200;

/// Holds the font database so it is scanned once per stage.
pub struct Rasterizer {
    options: Options<'static>,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer {
    pub fn new() -> Self {
        let mut options = Options::default();
        options.fontdb_mut().load_system_fonts();
        Self { options }
    }

    /// Renders `svg` scaled to `width` x `height` pixels.
    pub fn render(&self, svg: &str, width: u32, height: u32) -> std::result::Result<RgbaImage, String> {
        let tree = Tree::from_str(svg, &self.options).map_err(|e| e.to_string())?;
        let size = tree.size();
        let transform = Transform::from_scale(
            width as f32 / size.width(),
            height as f32 / size.height(),
        );
        let mut pixmap = Pixmap::new(width, height).ok_or("failed to allocate pixmap")?;
        resvg::render(&tree, transform, &mut pixmap.as_mut());
        ImageBuffer::from_raw(width, height, pixmap.take())
            .ok_or_else(|| "failed to create image buffer".to_string())
    }

    /// Renders `svg` at figure resolution and saves it as PNG.
    pub fn save_png(&self, svg: &str, path: &Path) -> Result<()> {
        let render_error = |message: String| ReportError::Render {
            path: path.to_path_buf(),
            message,
        };
        let image = self
            .render(svg, FIGURE_WIDTH, FIGURE_HEIGHT)
            .map_err(render_error)?;
        ensure_parent(path)?;
        image.save(path).map_err(|e| render_error(e.to_string()))
    }
}
