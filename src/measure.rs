//! # Measurement
//!
//! The seam between layout and the typesetting engine. Text widths and
//! icon sizes are asked for directly; group heights need a real render
//! because labels wrap, so they go through a scratch [`Surface`].
//!
//! [`MeasurementAdapter`] owns that surface for one layout pass. It is
//! opened on the first height request, so a pass with nothing to measure
//! never touches it, and it is released when the pass ends on every path.

use std::collections::HashMap;

use crate::error::LegendError;
use crate::font::{FontContext, FontSpec};
use crate::icon::{self, IconBox, IconImage, IconLoader};
use crate::layout::columns::HeightSource;
use crate::layout::item::{Item, ItemGroup};
use crate::layout::widths::CellWidths;
use crate::model::PageGeometry;
use crate::text;

/// A typesetting backend.
pub trait Typesetter {
    /// Advance width of `text` set on one line.
    fn measure_text(&self, text: &str, font: &FontSpec) -> f64;

    /// Resolve an icon reference and size it for `target` at `scale`.
    fn decode_image(&self, src: &str, target: IconBox, scale: f64) -> Result<IconImage, LegendError>;

    /// A solid color rectangle filling `target`.
    fn swatch(&self, color: &str, target: IconBox) -> Result<IconImage, LegendError> {
        icon::swatch(color, target)
    }

    /// Open a throwaway surface sized like `page`.
    fn open_surface<'a>(&'a self, page: &PageGeometry) -> Result<Box<dyn Surface + 'a>, LegendError>;
}

/// An off-page surface groups are rendered into to learn their height.
pub trait Surface {
    /// Render `group` with the given cell widths and return the height it
    /// occupied.
    fn render(&mut self, group: &ItemGroup, widths: CellWidths) -> Result<f64, LegendError>;

    /// Release the surface's backing storage.
    fn release(&mut self) -> Result<(), LegendError>;
}

/// The built-in typesetter: standard PDF font metrics plus any registered
/// fonts, and icons from the registry, data URIs or disk.
#[derive(Default)]
pub struct Engine {
    fonts: FontContext,
    icons: IconLoader,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a TrueType/OpenType font under `family`.
    pub fn register_font(&mut self, family: &str, weight: u32, italic: bool, data: Vec<u8>) {
        self.fonts.registry_mut().register(family, weight, italic, data);
    }

    /// Make icon bytes available under `name`.
    pub fn register_icon(&mut self, name: &str, bytes: Vec<u8>) {
        self.icons.register(name, bytes);
    }

    /// Height of one row at the given widths.
    pub fn row_height(&self, item: &Item, widths: CellWidths) -> f64 {
        let lines = text::break_into_lines(&self.fonts, &item.label, item.label_space(widths), &item.font);
        let text_height =
            lines.len() as f64 * item.font.size * item.line_height + item.text_padding.vertical();
        if item.is_merged() {
            text_height
        } else {
            text_height.max(item.icon.height() + item.icon_padding.vertical())
        }
    }
}

impl Typesetter for Engine {
    fn measure_text(&self, text: &str, font: &FontSpec) -> f64 {
        text::natural_width(&self.fonts, text, font)
    }

    fn decode_image(&self, src: &str, target: IconBox, scale: f64) -> Result<IconImage, LegendError> {
        self.icons.decode(src, target, scale)
    }

    fn open_surface<'a>(&'a self, page: &PageGeometry) -> Result<Box<dyn Surface + 'a>, LegendError> {
        let (width, height) = (page.content_width(), page.content_height());
        if width <= 0.0 || height <= 0.0 {
            return Err(LegendError::Surface(format!(
                "page has no room for a scratch surface ({:.2}×{:.2}pt)",
                width, height
            )));
        }
        Ok(Box::new(ScratchSurface {
            engine: self,
            rendered: 0,
            released: false,
        }))
    }
}

/// In-memory scratch surface. A group's height is the sum of its row
/// heights; nothing is kept between renders.
struct ScratchSurface<'a> {
    engine: &'a Engine,
    rendered: usize,
    released: bool,
}

impl Surface for ScratchSurface<'_> {
    fn render(&mut self, group: &ItemGroup, widths: CellWidths) -> Result<f64, LegendError> {
        if self.released {
            return Err(LegendError::Surface("scratch surface already released".into()));
        }
        self.rendered += 1;
        Ok(group
            .rows
            .iter()
            .map(|row| self.engine.row_height(row, widths))
            .sum())
    }

    fn release(&mut self) -> Result<(), LegendError> {
        if !self.released {
            log::debug!("Releasing scratch surface after {} render(s)", self.rendered);
            self.released = true;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct HeightKey {
    group: usize,
    trimmed: bool,
    icon: u64,
    text: u64,
}

impl HeightKey {
    fn new(group: &ItemGroup, widths: CellWidths) -> Self {
        Self {
            group: group.index,
            trimmed: group.trimmed,
            icon: widths.icon.to_bits(),
            text: widths.text.to_bits(),
        }
    }
}

/// Height measurement for one layout pass.
pub struct MeasurementAdapter<'a> {
    typesetter: &'a dyn Typesetter,
    page: PageGeometry,
    surface: Option<Box<dyn Surface + 'a>>,
    cache: HashMap<HeightKey, f64>,
}

impl<'a> MeasurementAdapter<'a> {
    pub fn new(typesetter: &'a dyn Typesetter, page: PageGeometry) -> Self {
        Self {
            typesetter,
            page,
            surface: None,
            cache: HashMap::new(),
        }
    }

    pub fn surface_opened(&self) -> bool {
        self.surface.is_some()
    }

    /// End the pass, releasing the surface if one was opened.
    pub fn finish(mut self) -> Result<(), LegendError> {
        match self.surface.take() {
            Some(mut surface) => surface.release(),
            None => Ok(()),
        }
    }

    fn surface(&mut self) -> Result<&mut (dyn Surface + 'a), LegendError> {
        if self.surface.is_none() {
            log::debug!("Opening measurement surface");
            self.surface = Some(self.typesetter.open_surface(&self.page)?);
        }
        match self.surface.as_deref_mut() {
            Some(surface) => Ok(surface),
            None => Err(LegendError::Surface("measurement surface unavailable".into())),
        }
    }
}

impl HeightSource for MeasurementAdapter<'_> {
    fn height(&mut self, group: &ItemGroup, widths: CellWidths) -> Result<f64, LegendError> {
        let key = HeightKey::new(group, widths);
        if let Some(&height) = self.cache.get(&key) {
            return Ok(height);
        }
        let height = self.surface()?.render(group, widths)?;
        self.cache.insert(key, height);
        Ok(height)
    }
}

impl Drop for MeasurementAdapter<'_> {
    fn drop(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            if let Err(e) = surface.release() {
                log::warn!("Failed to release measurement surface: {}", e);
            }
        }
    }
}
